//! ISBN extraction from ordinary text

use lazy_static::lazy_static;
use regex::Regex;

use crate::codec;
use crate::error::IdentifierError;
use crate::identifier::Identifier;

/// ISBN-shaped match with position information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedIsbn {
    /// Text as it appeared, separators included
    pub raw: String,
    /// Validation outcome for `raw`
    pub identifier: Result<Identifier, IdentifierError>,
    pub start_index: u32,
    pub end_index: u32,
}

lazy_static! {
    // ISBN-10 and ISBN-13, with optional hyphens or spaces between digits
    static ref ISBN_REGEX: Regex = Regex::new(
        r"(?i)(?:isbn(?:-1[03])?[:\s-]*)?\b(?P<isbn>(?:97[89][- ]?)?(?:\d[- ]?){9}[\dx])\b"
    ).unwrap();
}

/// ISBN-shaped strings in `text`, separators stripped, checksum not checked
pub fn extract_isbnlike(text: &str) -> Vec<String> {
    ISBN_REGEX
        .captures_iter(text)
        .filter_map(|cap| cap.name("isbn"))
        .map(|m| codec::clean(m.as_str()))
        .collect()
}

/// Valid identifiers in `text`, in order of appearance, without repeats
pub fn extract_isbns(text: &str) -> Vec<Identifier> {
    let mut seen = Vec::new();
    for m in ISBN_REGEX.captures_iter(text).filter_map(|cap| cap.name("isbn")) {
        if let Ok(id) = codec::validate(m.as_str()) {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
    }
    seen
}

/// Every ISBN-shaped match with its position and validation outcome.
///
/// Keeps checksum failures so callers can report "almost an ISBN".
pub fn extract_all(text: &str) -> Vec<ExtractedIsbn> {
    ISBN_REGEX
        .captures_iter(text)
        .filter_map(|cap| cap.name("isbn"))
        .map(|m| ExtractedIsbn {
            raw: m.as_str().to_string(),
            identifier: codec::validate(m.as_str()),
            start_index: m.start() as u32,
            end_index: m.end() as u32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_isbns() {
        let text = "ISBN: 978-0-321-12521-7 and also 0-306-40615-2";
        let isbns: Vec<String> = extract_isbns(text).iter().map(|i| i.to_string()).collect();
        assert_eq!(isbns, vec!["9780321125217", "0306406152"]);
    }

    #[test]
    fn test_extract_isbnlike_keeps_bad_checksums() {
        let text = "ISBN-13: 978-0-306-40615-8";
        assert_eq!(extract_isbnlike(text), vec!["9780306406158"]);
        assert!(extract_isbns(text).is_empty());
    }

    #[test]
    fn test_extract_isbns_dedupes() {
        let text = "9780306406157, again 978 0 306 40615 7";
        assert_eq!(extract_isbns(text).len(), 1);
    }

    #[test]
    fn test_extract_all_positions() {
        let text = "see 0306406151 or 0306406152";
        let all = extract_all(text);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].start_index, 4);
        assert!(matches!(
            all[0].identifier,
            Err(IdentifierError::InvalidChecksum(_))
        ));
        assert!(all[1].identifier.is_ok());
    }

    #[test]
    fn test_long_digit_runs_ignored() {
        assert!(extract_isbnlike("order 123456789012345678").is_empty());
    }
}
