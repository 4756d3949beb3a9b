use thiserror::Error;

/// A required leading column of the input CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumn {
    pub name: &'static str,
    pub index: usize,
}

pub const NAME: usize = 0;
pub const COUNTY: usize = 1;
pub const CHIEF: usize = 2;
pub const PHONE: usize = 3;
pub const FAX: usize = 4;

/// Leading columns of the fire department directory export, in order.
pub const FD_COLUMNS: &[CsvColumn] = &[
    CsvColumn { name: "Name", index: NAME },
    CsvColumn { name: "County", index: COUNTY },
    CsvColumn { name: "Chief", index: CHIEF },
    CsvColumn { name: "Phone", index: PHONE },
    CsvColumn { name: "Fax", index: FAX },
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("line {line}: column heading {column} expected {expected:?}, found {found:?}")]
    HeaderMismatch {
        line: usize,
        column: usize,
        expected: String,
        found: String,
    },
    #[error("line {line}: found {found} values, there must be at least {required}")]
    InsufficientColumns {
        line: usize,
        found: usize,
        required: usize,
    },
}

impl SchemaError {
    pub fn line(&self) -> usize {
        match self {
            SchemaError::HeaderMismatch { line, .. } | SchemaError::InsufficientColumns { line, .. } => *line,
        }
    }

    /// Same error, reported against a different line.
    pub fn at_line(mut self, at: usize) -> Self {
        match &mut self {
            SchemaError::HeaderMismatch { line, .. } | SchemaError::InsufficientColumns { line, .. } => *line = at,
        }
        self
    }
}

/// What a row that passed validation holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Line 1 with the expected headings; nothing to extract.
    Header,
    Data,
}

/// Check `row` (1-based `line`) against `schema`.
///
/// Short rows are compared heading-by-heading as far as they go, so a
/// truncated header reports the first wrong heading rather than just the
/// count. Extra trailing fields are never inspected.
pub fn validate<S: AsRef<str>>(schema: &[CsvColumn], row: &[S], line: usize) -> Result<RowKind, SchemaError> {
    let required = schema.len();

    if row.len() < required {
        check_headings(schema, row, line)?;
        return Err(SchemaError::InsufficientColumns {
            line,
            found: row.len(),
            required,
        });
    }

    if line == 1 {
        check_headings(schema, row, line)?;
        return Ok(RowKind::Header);
    }

    Ok(RowKind::Data)
}

fn check_headings<S: AsRef<str>>(schema: &[CsvColumn], row: &[S], line: usize) -> Result<(), SchemaError> {
    for col in schema {
        let Some(found) = row.get(col.index) else {
            continue;
        };
        if normalize_heading(found.as_ref()) != normalize_heading(col.name) {
            return Err(SchemaError::HeaderMismatch {
                line,
                column: col.index,
                expected: col.name.to_string(),
                found: found.as_ref().to_string(),
            });
        }
    }
    Ok(())
}

/// Lowercase and drop all whitespace: `" Phone "` and `"PH ONE"` both become `"phone"`.
fn normalize_heading(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// ── Tests ──
