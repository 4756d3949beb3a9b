use std::collections::HashMap;

use thiserror::Error;

/// Fields that come from the directory CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    pub county: String,
    pub chief: String,
    pub phone: String,
    pub fax: String,
}

/// Fields that come from a department's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedAddress {
    pub address: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdRecord {
    /// Detail page id; `None` until the page for this name was scraped.
    pub fdid: Option<u32>,
    pub name: String,
    pub baseline: Baseline,
    pub address: Option<ScrapedAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no fire department named {0:?}")]
    NotFound(String),
    #[error("{name:?} already has an address from fdid {fdid}")]
    AlreadyEnriched { name: String, fdid: u32 },
}

/// Fire departments keyed by exact name.
///
/// The name is the only link between the CSV and the detail pages, so lookups
/// are exact: no case folding, no fuzzy matching.
#[derive(Debug, Default)]
pub struct EntityStore {
    records: HashMap<String, FdRecord>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a baseline row. A repeated name replaces the earlier row, which
    /// is returned.
    pub fn seed(&mut self, name: &str, baseline: Baseline) -> Option<FdRecord> {
        let record = FdRecord {
            fdid: None,
            name: name.to_string(),
            baseline,
            address: None,
        };
        self.records.insert(name.to_string(), record)
    }

    /// Attach a scraped address to an existing record. Never inserts, and
    /// never replaces an address that is already set.
    pub fn enrich(&mut self, name: &str, fdid: u32, address: ScrapedAddress) -> Result<&FdRecord, StoreError> {
        let record = self
            .records
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        if let Some(prev) = record.fdid {
            return Err(StoreError::AlreadyEnriched {
                name: name.to_string(),
                fdid: prev,
            });
        }

        record.fdid = Some(fdid);
        record.address = Some(address);
        Ok(record)
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&FdRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, sorted by name.
    pub fn all(&self) -> Vec<&FdRecord> {
        let mut out: Vec<&FdRecord> = self.records.values().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

// ── Tests ──
