use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::schema::{self, RowKind, SchemaError, FD_COLUMNS};
use crate::store::{Baseline, EntityStore};

/// What to do with a bad data row. A bad header always stops ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log the row and keep going.
    Loose,
    /// Stop at the first bad row.
    Strict,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read CSV: {0}")]
    Io(#[source] std::io::Error),
    #[error("could not read CSV at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: csv::Error,
    },
    #[error("CSV file is empty")]
    Empty,
    #[error("bad header: {0}")]
    Header(#[source] SchemaError),
    #[error("bad row (strict mode): {0}")]
    Row(#[source] SchemaError),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub data_rows: usize,
    pub seeded: usize,
    pub skipped: usize,
    pub duplicates: usize,
}

pub fn ingest_path(path: &Path, store: &mut EntityStore, policy: ErrorPolicy) -> Result<IngestReport, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    ingest_reader(file, store, policy)
}

/// Validate and load directory rows into `store`.
pub fn ingest_reader<R: Read>(mut reader: R, store: &mut EntityStore, policy: ErrorPolicy) -> Result<IngestReport, IngestError> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input).map_err(IngestError::Io)?;

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_slice());

    let mut report = IngestReport::default();
    let mut saw_header = false;

    for (i, result) in rdr.byte_records().enumerate() {
        let index = i + 1;
        let record = result.map_err(|source| IngestError::Read { line: index, source })?;
        let line = record.position().map_or(index, |p| start_line(&input, p));

        let fields: Vec<Cow<str>> = record.iter().map(String::from_utf8_lossy).collect();
        if fields.iter().any(|f| matches!(f, Cow::Owned(_))) {
            warn!(line, "CSV row is not valid UTF-8, undecodable bytes replaced");
        }

        match schema::validate(FD_COLUMNS, &fields, index) {
            Ok(RowKind::Header) => {
                saw_header = true;
                continue;
            }
            Ok(RowKind::Data) => {}
            Err(e) if index == 1 => return Err(IngestError::Header(e.at_line(line))),
            Err(e) => {
                let e = e.at_line(line);
                report.data_rows += 1;
                match policy {
                    ErrorPolicy::Strict => return Err(IngestError::Row(e)),
                    ErrorPolicy::Loose => {
                        warn!(line, error = %e, "Skipping CSV row");
                        report.skipped += 1;
                        continue;
                    }
                }
            }
        }

        report.data_rows += 1;
        if fields.iter().all(|f| f.trim().is_empty()) {
            debug!(line, "Blank CSV row");
            report.skipped += 1;
            continue;
        }

        let name = fields[schema::NAME].trim();
        if name.is_empty() {
            warn!(line, "Skipping CSV row with no name");
            report.skipped += 1;
            continue;
        }

        let baseline = Baseline {
            county: fields[schema::COUNTY].trim().to_string(),
            chief: fields[schema::CHIEF].trim().to_string(),
            phone: fields[schema::PHONE].trim().to_string(),
            fax: fields[schema::FAX].trim().to_string(),
        };
        if store.seed(name, baseline).is_some() {
            warn!(line, name, "Duplicate name in CSV, later row wins");
            report.duplicates += 1;
        } else {
            report.seeded += 1;
        }
    }

    if !saw_header {
        return Err(IngestError::Empty);
    }
    Ok(report)
}

/// File line where the record at `pos` begins.
///
/// The csv reader records its position before skipping the blank lines
/// that precede a record, so those are counted here.
fn start_line(input: &[u8], pos: &csv::Position) -> usize {
    let from = usize::try_from(pos.byte()).unwrap_or(usize::MAX);
    let skipped = input
        .get(from..)
        .unwrap_or_default()
        .iter()
        .take_while(|&&b| b == b'\r' || b == b'\n')
        .filter(|&&b| b == b'\n')
        .count();
    pos.line() as usize + skipped
}

// ── Tests ──
