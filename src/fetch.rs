use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },
}

impl TransportError {
    /// Worth another attempt: timeouts, connection failures, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Request { source, .. } => source.is_timeout() || source.is_connect(),
            TransportError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
        }
    }
}

/// Anything that can hand back the detail page for a department id.
pub trait PageSource {
    fn fetch(&self, fdid: u32) -> Result<String, TransportError>;
}

pub struct HttpSource {
    client: Client,
    base_url: String,
    retries: u32,
    backoff: Duration,
}

impl HttpSource {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpSource {
            client,
            base_url: settings.base_url.clone(),
            retries: settings.retries,
            backoff: settings.backoff(),
        })
    }

    fn get(&self, url: &str) -> Result<String, TransportError> {
        let resp = self.client.get(url).send().map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status,
            });
        }
        resp.text().map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })
    }
}

impl PageSource for HttpSource {
    fn fetch(&self, fdid: u32) -> Result<String, TransportError> {
        let url = page_url(&self.base_url, fdid);
        debug!(fdid, %url, "GET");
        with_retry(self.retries, self.backoff, TransportError::is_transient, || self.get(&url))
    }
}

pub fn page_url(base_url: &str, fdid: u32) -> String {
    let sep = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}fdid={}", base_url, sep, fdid)
}

/// Run `op` up to `retries + 1` times, sleeping `backoff * 2^attempt` between
/// transient failures. Permanent failures return immediately.
pub fn with_retry<T, E, P, F>(retries: u32, backoff: Duration, is_transient: P, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
    F: FnMut() -> Result<T, E>,
{
    let mut attempt = 0;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < retries && is_transient(&e) => {
                let wait = backoff.saturating_mul(2u32.saturating_pow(attempt));
                warn!(
                    attempt = attempt + 1,
                    max = retries,
                    error = %e,
                    "Transient failure, backing off {:.1}s",
                    wait.as_secs_f64()
                );
                thread::sleep(wait);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn status_err(code: u16) -> TransportError {
        TransportError::Status {
            url: "http://example.test/detail.aspx?fdid=1".into(),
            status: StatusCode::from_u16(code).unwrap(),
        }
    }

    #[test]
    fn url_gets_fdid_query() {
        assert_eq!(
            page_url("http://www.firereporting.ok.gov/directory/detail.aspx", 12),
            "http://www.firereporting.ok.gov/directory/detail.aspx?fdid=12"
        );
        assert_eq!(page_url("http://host/detail.aspx?lang=en", 3), "http://host/detail.aspx?lang=en&fdid=3");
    }

    #[test]
    fn transient_statuses() {
        assert!(status_err(503).is_transient());
        assert!(status_err(500).is_transient());
        assert!(status_err(429).is_transient());
        assert!(!status_err(404).is_transient());
        assert!(!status_err(403).is_transient());
    }

    #[test]
    fn retry_until_success() {
        let calls = Cell::new(0);
        let res: Result<&str, TransportError> = with_retry(3, Duration::ZERO, TransportError::is_transient, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(status_err(503))
            } else {
                Ok("page")
            }
        });
        assert_eq!(res.unwrap(), "page");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn retry_is_bounded() {
        let calls = Cell::new(0);
        let res: Result<(), TransportError> = with_retry(2, Duration::ZERO, TransportError::is_transient, || {
            calls.set(calls.get() + 1);
            Err(status_err(502))
        });
        assert!(res.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn permanent_failure_not_retried() {
        let calls = Cell::new(0);
        let res: Result<(), TransportError> = with_retry(5, Duration::ZERO, TransportError::is_transient, || {
            calls.set(calls.get() + 1);
            Err(status_err(404))
        });
        assert!(matches!(res, Err(TransportError::Status { .. })));
        assert_eq!(calls.get(), 1);
    }
}
