use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::fetch::PageSource;
use crate::parser;
use crate::settings::Settings;
use crate::store::EntityStore;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub attempted: usize,
    pub enriched: usize,
    pub transport_errors: usize,
    /// Scrape failures by `ScrapeError::kind`.
    pub scrape_errors: BTreeMap<&'static str, usize>,
}

impl RunStats {
    pub fn scrape_error_total(&self) -> usize {
        self.scrape_errors.values().sum()
    }

    pub fn log(&self) {
        info!(
            attempted = self.attempted,
            enriched = self.enriched,
            transport_errors = self.transport_errors,
            scrape_errors = self.scrape_error_total(),
            "Contact list built"
        );
        for (kind, n) in &self.scrape_errors {
            info!(kind, count = n, "Scrape failures");
        }
    }
}

/// Detail page ids to visit: `first_id` through `last_id`, where `last_id`
/// defaults to the number of departments in the CSV.
pub fn id_range(settings: &Settings, known: usize) -> RangeInclusive<u32> {
    let last = settings
        .last_id
        .unwrap_or_else(|| u32::try_from(known).unwrap_or(u32::MAX));
    settings.first_id..=last
}

/// Fetch and scrape each id in turn. Failures are per department: they are
/// logged and counted, and the loop moves on.
pub fn build_contact_list(
    store: &mut EntityStore,
    source: &dyn PageSource,
    ids: RangeInclusive<u32>,
    pb: &ProgressBar,
) -> RunStats {
    let mut stats = RunStats::default();

    for fdid in ids {
        stats.attempted += 1;
        pb.set_message(format!("fdid {}", fdid));

        let page = match source.fetch(fdid) {
            Ok(page) => page,
            Err(e) => {
                warn!(fdid, error = %e, "Fetch failed");
                stats.transport_errors += 1;
                pb.inc(1);
                continue;
            }
        };

        match parser::scrape_into(store, &page, fdid) {
            Ok(name) => {
                debug!(fdid, %name, "Enriched");
                stats.enriched += 1;
            }
            Err(e) => {
                warn!(fdid, kind = e.kind(), error = %e, "Problem finding scrape markers");
                *stats.scrape_errors.entry(e.kind()).or_default() += 1;
            }
        }
        pb.inc(1);
    }

    stats
}

// ── Tests ──
