use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::ingest::ErrorPolicy;

pub const DEFAULT_CONFIG: &str = "fd_scraper";
pub const DEFAULT_BASE_URL: &str = "http://www.firereporting.ok.gov/directory/detail.aspx";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub backoff_ms: u64,
    pub strict: bool,
    pub first_id: u32,
    /// Inclusive; defaults to the number of departments read from the CSV.
    pub last_id: Option<u32>,
    pub user_agent: String,
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn policy(&self) -> ErrorPolicy {
        if self.strict {
            ErrorPolicy::Strict
        } else {
            ErrorPolicy::Loose
        }
    }
}

/// Defaults, then the config file, then `FD_*` environment variables.
/// Without an explicit `file`, `fd_scraper.toml` in the working directory is
/// read if present.
pub fn load(file: Option<&Path>) -> Result<Settings> {
    load_from(file, None)
}

/// [`load`] with `env` standing in for the process environment when given.
pub fn load_from(file: Option<&Path>, env: Option<::config::Map<String, String>>) -> Result<Settings> {
    let builder = ::config::Config::builder()
        .set_default("input", "fd.csv")?
        .set_default("base_url", DEFAULT_BASE_URL)?
        .set_default("timeout_secs", 15)?
        .set_default("retries", 2)?
        .set_default("backoff_ms", 500)?
        .set_default("strict", false)?
        .set_default("first_id", 1)?
        .set_default("user_agent", concat!("fd_scraper/", env!("CARGO_PKG_VERSION")))?;

    let builder = match file {
        Some(path) => builder.add_source(::config::File::from(path).required(true)),
        None => builder.add_source(::config::File::with_name(DEFAULT_CONFIG).required(false)),
    };

    builder
        .add_source(
            ::config::Environment::with_prefix("FD")
                .try_parsing(true)
                .source(env),
        )
        .build()
        .context("Failed to read settings")?
        .try_deserialize()
        .context("Invalid settings")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_defaults() {
        let s = load(Some(Path::new("tests/fixtures/fd_scraper.toml"))).unwrap();
        assert_eq!(s.input, PathBuf::from("departments.csv"));
        assert_eq!(s.base_url, "http://localhost:8080/detail.aspx");
        assert_eq!(s.timeout(), Duration::from_secs(5));
        assert!(s.strict);
        assert_eq!(s.policy(), ErrorPolicy::Strict);
        assert_eq!(s.last_id, Some(40));
        // untouched keys keep their defaults
        assert_eq!(s.first_id, 1);
        assert_eq!(s.retries, 2);
        assert_eq!(s.backoff(), Duration::from_millis(500));
        assert!(s.output.is_none());
        assert!(s.user_agent.starts_with("fd_scraper/"));
    }

    fn env(vars: &[(&str, &str)]) -> Option<::config::Map<String, String>> {
        Some(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn env_overrides_file() {
        let s = load_from(
            Some(Path::new("tests/fixtures/fd_scraper.toml")),
            env(&[("FD_TIMEOUT_SECS", "9"), ("FD_STRICT", "false"), ("OTHER_RETRIES", "7")]),
        )
        .unwrap();
        assert_eq!(s.timeout(), Duration::from_secs(9));
        assert!(!s.strict);
        assert_eq!(s.policy(), ErrorPolicy::Loose);
        // keys the environment leaves alone come from the file or defaults
        assert_eq!(s.input, PathBuf::from("departments.csv"));
        assert_eq!(s.last_id, Some(40));
        assert_eq!(s.retries, 2);
    }

    #[test]
    fn env_overrides_defaults_without_file() {
        let s = load_from(None, env(&[("FD_BASE_URL", "http://mirror.test/detail.aspx"), ("FD_LAST_ID", "3")])).unwrap();
        assert_eq!(s.base_url, "http://mirror.test/detail.aspx");
        assert_eq!(s.last_id, Some(3));
        assert_eq!(s.input, PathBuf::from("fd.csv"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(load(Some(Path::new("tests/fixtures/does_not_exist.toml"))).is_err());
    }
}
