use std::io::{self, Write};

use crate::store::{EntityStore, FdRecord, ScrapedAddress};

pub const HEADER: &str = "FDID,Name,County,Chief,Phone,Fax,Address,Address2,City,State,PostalCode";

/// Strip double quotes, then wrap in quotes if a comma remains.
/// Embedded quotes are dropped, never escaped. Line breaks become a single
/// space so every department stays on one output line.
pub fn csv_quote(s: &str) -> String {
    let stripped: String = s
        .replace("\r\n", " ")
        .chars()
        .filter(|&c| c != '"')
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    if stripped.contains(',') {
        format!("\"{}\"", stripped)
    } else {
        stripped
    }
}

fn format_row(r: &FdRecord) -> String {
    let empty = ScrapedAddress::default();
    let addr = r.address.as_ref().unwrap_or(&empty);
    let fields: [&str; 10] = [
        r.name.as_str(),
        &r.baseline.county,
        &r.baseline.chief,
        &r.baseline.phone,
        &r.baseline.fax,
        &addr.address,
        &addr.address2,
        &addr.city,
        &addr.state,
        &addr.postal_code,
    ];

    let mut line = r.fdid.unwrap_or(0).to_string();
    for f in fields {
        line.push(',');
        line.push_str(&csv_quote(f));
    }
    line
}

/// Header plus one row per department, sorted by name.
pub fn write_csv<W: Write>(mut out: W, store: &EntityStore) -> io::Result<()> {
    writeln!(out, "{}", HEADER)?;
    for r in store.all() {
        writeln!(out, "{}", format_row(r))?;
    }
    out.flush()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Baseline;

    #[test]
    fn plain_field_unchanged() {
        assert_eq!(csv_quote("Alpha FD"), "Alpha FD");
        assert_eq!(csv_quote(""), "");
    }

    #[test]
    fn comma_field_wrapped_once() {
        assert_eq!(csv_quote("Smith, John"), "\"Smith, John\"");
        assert_eq!(csv_quote("\"Smith, John\""), "\"Smith, John\"");
        assert_eq!(csv_quote("Bob \"Red\", Jr"), "\"Bob Red, Jr\"");
    }

    #[test]
    fn quotes_stripped_without_comma() {
        assert_eq!(csv_quote("Chief \"Red\" Jones"), "Chief Red Jones");
    }

    #[test]
    fn line_breaks_flattened() {
        assert_eq!(csv_quote("County\nA"), "County A");
        assert_eq!(csv_quote("Smith,\r\nJohn"), "\"Smith, John\"");
        assert_eq!(csv_quote("a\rb"), "a b");
    }

    #[test]
    fn quoting_is_idempotent_without_comma() {
        let once = csv_quote("Chief \"Red\" Jones");
        assert_eq!(csv_quote(&once), once);
    }

    #[test]
    fn unscraped_record_has_zero_id_and_blank_address() {
        let mut store = EntityStore::new();
        store.seed(
            "Beta FD",
            Baseline {
                county: "County B".into(),
                chief: "Lee, Pat".into(),
                phone: "555-0003".into(),
                fax: String::new(),
            },
        );

        let mut buf = Vec::new();
        write_csv(&mut buf, &store).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "0,Beta FD,County B,\"Lee, Pat\",555-0003,,,,,,");
    }

    #[test]
    fn rows_follow_name_order() {
        let mut store = EntityStore::new();
        store.seed("Zeta FD", Baseline::default());
        store.seed("Alpha FD", Baseline::default());
        store
            .enrich(
                "Zeta FD",
                3,
                ScrapedAddress {
                    address: "1 Elm".into(),
                    address2: String::new(),
                    city: "Ada".into(),
                    state: "OK".into(),
                    postal_code: "74820".into(),
                },
            )
            .unwrap();

        let mut buf = Vec::new();
        write_csv(&mut buf, &store).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "0,Alpha FD,,,,,,,,,");
        assert_eq!(lines[2], "3,Zeta FD,,,,,1 Elm,,Ada,OK,74820");
    }
}
