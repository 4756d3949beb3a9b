pub mod address;
pub mod page;

use thiserror::Error;

use crate::store::{EntityStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    #[error("could not find contact section start")]
    SectionStartNotFound,
    #[error("could not find contact section end")]
    SectionEndNotFound,
    #[error("could not bracket department name")]
    NameBracketNotFound,
    #[error("could not bracket department address")]
    AddressBracketNotFound,
    #[error("address has {fragments} line(s), need street and city/state/zip")]
    AddressTooShort { fragments: usize },
    #[error("could not split city/state/zip from {0:?}")]
    CityStateZipNoMatch(String),
    #[error("no CSV entry for {0:?}")]
    EntityNotFound(String),
    #[error("{name:?} was already scraped from fdid {fdid}")]
    AlreadyEnriched { name: String, fdid: u32 },
}

impl ScrapeError {
    /// Stable short label for logs and run counters.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::SectionStartNotFound => "section_start_not_found",
            ScrapeError::SectionEndNotFound => "section_end_not_found",
            ScrapeError::NameBracketNotFound => "name_bracket_not_found",
            ScrapeError::AddressBracketNotFound => "address_bracket_not_found",
            ScrapeError::AddressTooShort { .. } => "address_too_short",
            ScrapeError::CityStateZipNoMatch(_) => "city_state_zip_no_match",
            ScrapeError::EntityNotFound(_) => "entity_not_found",
            ScrapeError::AlreadyEnriched { .. } => "already_enriched",
        }
    }
}

impl From<StoreError> for ScrapeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(name) => ScrapeError::EntityNotFound(name),
            StoreError::AlreadyEnriched { name, fdid } => ScrapeError::AlreadyEnriched { name, fdid },
        }
    }
}

/// Scrape one detail page and merge its address into the matching CSV entry.
/// Returns the department name on success.
pub fn scrape_into(store: &mut EntityStore, src: &str, fdid: u32) -> Result<String, ScrapeError> {
    let scraped = page::scrape_page(src)?;
    store.enrich(&scraped.name, fdid, scraped.address)?;
    Ok(scraped.name)
}

// ── Tests ──
