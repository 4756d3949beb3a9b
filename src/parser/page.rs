use super::address::parse_city_state_zip;
use super::ScrapeError;
use crate::store::ScrapedAddress;

pub const SECTION_START: &str = "id=\"fdcontact\"";
pub const SECTION_END: &str = "id=\"fdresources\"";
pub const NAME_OPEN: &str = "<h3>";
pub const NAME_CLOSE: &str = "</h3>";
pub const ADDRESS_LABEL: &str = "<h4>Contact Information:</h4>";
pub const ADDRESS_END: &str = "Ph:";
pub const LINE_BREAK: &str = "<br />";

/// What a detail page yields before it is matched to a CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedPage {
    pub name: String,
    pub address: ScrapedAddress,
}

/// Pull the department name and mailing address out of a detail page.
///
/// Markers are searched in page order, each one only after the previous, so a
/// page with the pieces out of order fails rather than slicing backwards.
pub fn scrape_page(src: &str) -> Result<ScrapedPage, ScrapeError> {
    let start = src.find(SECTION_START).ok_or(ScrapeError::SectionStartNotFound)?;
    let end = find_after(src, SECTION_END, start + SECTION_START.len()).ok_or(ScrapeError::SectionEndNotFound)?;
    let section = &src[start..end];

    let name = between(section, NAME_OPEN, NAME_CLOSE).ok_or(ScrapeError::NameBracketNotFound)?;
    let name = decode_entities(name.trim());

    let raw = between(section, ADDRESS_LABEL, ADDRESS_END).ok_or(ScrapeError::AddressBracketNotFound)?;
    let fragments: Vec<String> = raw.split(LINE_BREAK).map(|f| decode_entities(f.trim())).collect();

    let (street, csz_line) = match fragments.as_slice() {
        [street, csz_line, ..] => (street, csz_line),
        _ => return Err(ScrapeError::AddressTooShort { fragments: fragments.len() }),
    };
    let csz = parse_city_state_zip(csz_line).ok_or_else(|| ScrapeError::CityStateZipNoMatch(csz_line.clone()))?;

    Ok(ScrapedPage {
        name,
        address: ScrapedAddress {
            address: street.clone(),
            address2: String::new(),
            city: csz.city,
            state: csz.state,
            postal_code: csz.postal_code,
        },
    })
}

fn find_after(s: &str, pat: &str, from: usize) -> Option<usize> {
    s.get(from..)?.find(pat).map(|i| i + from)
}

/// Text strictly between the first `open` and the first `close` after it.
fn between<'a>(s: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let inner_start = s.find(open)? + open.len();
    let inner_end = find_after(s, close, inner_start)?;
    Some(&s[inner_start..inner_end])
}

/// Decode the handful of entities the directory emits in names and addresses.
fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

// ── Tests ──
