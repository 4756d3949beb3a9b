use std::sync::LazyLock;

use regex::Regex;

static CSZ_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^,]+),\s*([A-Z]{2})\s*([0-9]+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityStateZip {
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// Split `"City, ST 12345"` into its parts. Only the first match counts;
/// anything after the digits (a ZIP+4 suffix, stray text) is ignored.
pub fn parse_city_state_zip(line: &str) -> Option<CityStateZip> {
    let caps = CSZ_RE.captures(line)?;
    Some(CityStateZip {
        city: caps[1].trim().to_string(),
        state: caps[2].trim().to_string(),
        postal_code: caps[3].trim().to_string(),
    })
}

// ── Tests ──
