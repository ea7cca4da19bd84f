//! ISBN validation, conversion and hyphenation

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::IdentifierError;
use crate::identifier::{Identifier, IdentifierKind, BOOKLAND_PREFIXES};
use crate::ranges::RangeTable;

lazy_static! {
    // Leading "ISBN", "ISBN-10:", "isbn13" labels. The \b keeps "ISBN 1386..."
    // from losing its first two digits.
    static ref ISBN_LABEL: Regex = Regex::new(r"(?i)^\s*isbn(?:[-\s]?1[03]\b)?\s*:?").unwrap();
}

/// Strip an `ISBN` label and every non-alphanumeric separator, uppercasing
/// the check symbol.
pub fn clean(raw: &str) -> String {
    let unlabeled = ISBN_LABEL.replace(raw, "");
    unlabeled
        .chars()
        .filter(|c| c.is_alphanumeric())
        .map(|c| if c == 'x' { 'X' } else { c })
        .collect()
}

/// Validate a raw string into an [`Identifier`].
///
/// Ten-character candidates use weights 10..1 (a final `X` counts as 10) and
/// must sum to a multiple of 11. Thirteen-digit candidates use alternating
/// weights 1,3 and must sum to a multiple of 10; they become ISBN-13 under a
/// Bookland prefix and plain EAN-13 otherwise.
pub fn validate(raw: &str) -> Result<Identifier, IdentifierError> {
    let candidate = clean(raw);

    if !candidate.chars().all(|c| c.is_ascii_digit() || c == 'X') {
        return Err(IdentifierError::InvalidFormat(raw.to_string()));
    }

    match candidate.len() {
        10 => {
            if candidate[..9].contains('X') {
                return Err(IdentifierError::InvalidFormat(raw.to_string()));
            }
            if weighted_sum_10(&candidate) % 11 != 0 {
                return Err(IdentifierError::InvalidChecksum(raw.to_string()));
            }
            Ok(Identifier::new_unchecked(IdentifierKind::Isbn10, candidate))
        }
        13 => {
            if candidate.contains('X') {
                return Err(IdentifierError::InvalidFormat(raw.to_string()));
            }
            if weighted_sum_13(&candidate) % 10 != 0 {
                return Err(IdentifierError::InvalidChecksum(raw.to_string()));
            }
            let kind = if BOOKLAND_PREFIXES.contains(&&candidate[..3]) {
                IdentifierKind::Isbn13
            } else {
                IdentifierKind::Ean13
            };
            Ok(Identifier::new_unchecked(kind, candidate))
        }
        _ => Err(IdentifierError::InvalidFormat(raw.to_string())),
    }
}

pub fn is_isbn10(raw: &str) -> bool {
    matches!(validate(raw), Ok(id) if id.kind() == IdentifierKind::Isbn10)
}

pub fn is_isbn13(raw: &str) -> bool {
    matches!(validate(raw), Ok(id) if id.kind() == IdentifierKind::Isbn13)
}

/// True unless `raw` is a valid ISBN-10 or ISBN-13
pub fn not_isbn(raw: &str) -> bool {
    !(is_isbn10(raw) || is_isbn13(raw))
}

/// Bare ISBN-13 digits, the form used for storage and cache keys.
pub fn canonical(raw: &str) -> Result<String, IdentifierError> {
    Ok(to_isbn13(&validate(raw)?)?.to_string())
}

/// Convert to ISBN-13 (identity for ISBN-13 input).
pub fn to_isbn13(id: &Identifier) -> Result<Identifier, IdentifierError> {
    match id.kind() {
        IdentifierKind::Isbn13 => Ok(id.clone()),
        IdentifierKind::Isbn10 => {
            let mut digits = format!("978{}", &id.as_str()[..9]);
            digits.push(isbn13_check_digit(&digits));
            Ok(Identifier::new_unchecked(IdentifierKind::Isbn13, digits))
        }
        IdentifierKind::Ean13 => Err(IdentifierError::Unconvertible {
            value: id.to_string(),
            target: IdentifierKind::Isbn13.as_str(),
        }),
    }
}

/// Thirteen-digit barcode form. ISBN-10s gain the `978` prefix; ISBN-13s and
/// other EAN-13s are already in it.
pub fn to_ean13(id: &Identifier) -> Identifier {
    match id.kind() {
        IdentifierKind::Isbn10 => to_isbn13(id).unwrap_or_else(|_| id.clone()),
        IdentifierKind::Isbn13 | IdentifierKind::Ean13 => id.clone(),
    }
}

/// Convert to ISBN-10. Only the `978` prefix has ISBN-10 forms.
pub fn to_isbn10(id: &Identifier) -> Result<Identifier, IdentifierError> {
    match id.kind() {
        IdentifierKind::Isbn10 => Ok(id.clone()),
        IdentifierKind::Isbn13 if id.prefix() == Some("978") => {
            let mut digits = id.as_str()[3..12].to_string();
            digits.push(isbn10_check_digit(&digits));
            Ok(Identifier::new_unchecked(IdentifierKind::Isbn10, digits))
        }
        _ => Err(IdentifierError::Unconvertible {
            value: id.to_string(),
            target: IdentifierKind::Isbn10.as_str(),
        }),
    }
}

fn digit_value(c: char) -> u32 {
    if c == 'X' {
        10
    } else {
        c.to_digit(10).unwrap_or(0)
    }
}

fn weighted_sum_10(digits: &str) -> u32 {
    digits
        .chars()
        .enumerate()
        .map(|(i, c)| digit_value(c) * (10 - i as u32))
        .sum()
}

fn weighted_sum_13(digits: &str) -> u32 {
    digits
        .chars()
        .enumerate()
        .map(|(i, c)| if i % 2 == 0 { digit_value(c) } else { digit_value(c) * 3 })
        .sum()
}

/// Check symbol completing nine ISBN-10 body digits
fn isbn10_check_digit(body: &str) -> char {
    match (11 - weighted_sum_10(body) % 11) % 11 {
        10 => 'X',
        n => char::from_digit(n, 10).unwrap_or('0'),
    }
}

/// Check digit completing twelve EAN-13 body digits
fn isbn13_check_digit(body: &str) -> char {
    let n = (10 - weighted_sum_13(body) % 10) % 10;
    char::from_digit(n, 10).unwrap_or('0')
}

/// Separator placed between the elements of a masked identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskStyle {
    #[default]
    Hyphen,
    Space,
}

impl MaskStyle {
    pub fn separator(&self) -> char {
        match self {
            MaskStyle::Hyphen => '-',
            MaskStyle::Space => ' ',
        }
    }
}

/// The elements of a hyphenated ISBN-13.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsbnParts<'a> {
    pub prefix: &'a str,
    pub group: &'a str,
    pub registrant: &'a str,
    pub item: &'a str,
    pub check: char,
}

/// Conversion and hyphenation against a [`RangeTable`].
///
/// Validation and conversion don't need range data and are also available
/// as free functions; masking, `info` and `doi` do.
#[derive(Debug, Clone, Copy)]
pub struct IdentifierCodec<'r> {
    ranges: &'r RangeTable,
}

impl Default for IdentifierCodec<'static> {
    fn default() -> Self {
        Self::new(RangeTable::builtin())
    }
}

impl<'r> IdentifierCodec<'r> {
    pub fn new(ranges: &'r RangeTable) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &'r RangeTable {
        self.ranges
    }

    pub fn validate(&self, raw: &str) -> Result<Identifier, IdentifierError> {
        validate(raw)
    }

    pub fn to_isbn13(&self, id: &Identifier) -> Result<Identifier, IdentifierError> {
        to_isbn13(id)
    }

    pub fn to_isbn10(&self, id: &Identifier) -> Result<Identifier, IdentifierError> {
        to_isbn10(id)
    }

    /// Split an ISBN-13 into prefix, group, registrant, item and check.
    ///
    /// The prefix rule picks the group length, then the rules of that group
    /// pick the registrant length. `None` when either lookup misses or the
    /// item element would be empty.
    pub fn split<'a>(&self, isbn13: &'a Identifier) -> Option<IsbnParts<'a>> {
        if isbn13.kind() != IdentifierKind::Isbn13 {
            return None;
        }
        let digits = isbn13.as_str();
        let prefix = &digits[..3];
        let body = &digits[3..12];

        let group_len = self.ranges.lookup(prefix, body)?;
        if group_len >= body.len() {
            return None;
        }
        let (group, rest) = body.split_at(group_len);

        let registrant_len = self.ranges.lookup(&format!("{}-{}", prefix, group), rest)?;
        if registrant_len >= rest.len() {
            return None;
        }
        let (registrant, item) = rest.split_at(registrant_len);

        Some(IsbnParts {
            prefix,
            group,
            registrant,
            item,
            check: isbn13.check_char(),
        })
    }

    /// Hyphenate (or space) an identifier.
    ///
    /// ISBN-10s are masked without the `978` prefix and keep their own check
    /// symbol. When the range data has no rule for the identifier the result
    /// only separates the prefix and the check digit, e.g. `978-030640615-7`.
    pub fn mask(&self, id: &Identifier, style: MaskStyle) -> String {
        let sep = style.separator();
        let isbn13 = match to_isbn13(id) {
            Ok(isbn13) => isbn13,
            Err(_) => return unmasked(id, sep),
        };

        match self.split(&isbn13) {
            Some(parts) if id.kind() == IdentifierKind::Isbn10 => format!(
                "{}{sep}{}{sep}{}{sep}{}",
                parts.group,
                parts.registrant,
                parts.item,
                id.check_char(),
            ),
            Some(parts) => format!(
                "{}{sep}{}{sep}{}{sep}{}{sep}{}",
                parts.prefix, parts.group, parts.registrant, parts.item, parts.check,
            ),
            None => unmasked(id, sep),
        }
    }

    /// Inverse of [`mask`](Self::mask): drop separators and re-validate.
    pub fn unmask(&self, masked: &str) -> Result<Identifier, IdentifierError> {
        validate(masked)
    }

    /// Name of the registration group agency (language area or country).
    ///
    /// Only the group has to be assigned; the registrant may fall in an
    /// unassigned range.
    pub fn info(&self, id: &Identifier) -> Option<&'r str> {
        let isbn13 = to_isbn13(id).ok()?;
        let digits = isbn13.as_str();
        let (prefix, body) = (&digits[..3], &digits[3..12]);
        let group = body.get(..self.ranges.lookup(prefix, body)?)?;
        self.ranges.agency(&format!("{}-{}", prefix, group))
    }

    /// ISBN-A form of the identifier, `10.978.<group><registrant>/<item><check>`.
    pub fn doi(&self, id: &Identifier) -> Result<String, IdentifierError> {
        let isbn13 = to_isbn13(id)?;
        let parts = self.split(&isbn13).ok_or_else(|| IdentifierError::Unconvertible {
            value: id.to_string(),
            target: "ISBN-A",
        })?;
        Ok(format!(
            "10.{}.{}{}/{}{}",
            parts.prefix, parts.group, parts.registrant, parts.item, parts.check
        ))
    }
}

fn unmasked(id: &Identifier, sep: char) -> String {
    let digits = id.as_str();
    match id.kind() {
        IdentifierKind::Isbn10 => format!("{}{sep}{}", &digits[..9], &digits[9..]),
        _ => format!("{}{sep}{}{sep}{}", &digits[..3], &digits[3..12], &digits[12..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_isbns() {
        assert!(validate("0-306-40615-2").is_ok());
        assert!(validate("978-0-321-12521-7").is_ok());
        assert!(validate("0306406152").is_ok());
        assert!(validate("9780321125217").is_ok());
        assert!(validate("080442957X").is_ok());
        assert!(validate("080442957x").is_ok());
    }

    #[test]
    fn test_invalid_checksums() {
        assert_eq!(
            validate("0-306-40615-1"),
            Err(IdentifierError::InvalidChecksum("0-306-40615-1".to_string()))
        );
        assert!(matches!(
            validate("978-0-321-12521-8"),
            Err(IdentifierError::InvalidChecksum(_))
        ));
    }

    #[test]
    fn test_invalid_formats() {
        assert!(matches!(validate("12345"), Err(IdentifierError::InvalidFormat(_))));
        assert!(matches!(validate(""), Err(IdentifierError::InvalidFormat(_))));
        assert!(matches!(validate("03064X6152"), Err(IdentifierError::InvalidFormat(_))));
        assert!(matches!(validate("978030640615X"), Err(IdentifierError::InvalidFormat(_))));
        assert!(matches!(validate("abcdefghij"), Err(IdentifierError::InvalidFormat(_))));
    }

    #[test]
    fn test_label_is_stripped() {
        assert_eq!(clean("ISBN-13: 978-0-306-40615-7"), "9780306406157");
        assert_eq!(clean("isbn 0 306 40615 2"), "0306406152");
        assert_eq!(clean("ISBN 1386..."), "1386");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(validate("9780306406157").unwrap().kind(), IdentifierKind::Isbn13);
        assert_eq!(validate("0306406152").unwrap().kind(), IdentifierKind::Isbn10);
        // Valid EAN-13 checksum, not Bookland
        assert_eq!(validate("4006381333931").unwrap().kind(), IdentifierKind::Ean13);
    }

    #[test]
    fn test_check_digits() {
        assert_eq!(isbn10_check_digit("080442957"), 'X');
        assert_eq!(isbn10_check_digit("030640615"), '2');
        assert_eq!(isbn13_check_digit("978030640615"), '7');
    }

    #[test]
    fn test_to_isbn13() {
        let ten = validate("0-306-40615-2").unwrap();
        assert_eq!(to_isbn13(&ten).unwrap().as_str(), "9780306406157");

        let ean = validate("4006381333931").unwrap();
        assert!(matches!(
            to_isbn13(&ean),
            Err(IdentifierError::Unconvertible { .. })
        ));
    }

    #[test]
    fn test_to_isbn10() {
        let thirteen = validate("9780804429573").unwrap();
        assert_eq!(to_isbn10(&thirteen).unwrap().as_str(), "080442957X");

        let nine_seven_nine = validate("979-10-90636-07-1").unwrap();
        assert!(matches!(
            to_isbn10(&nine_seven_nine),
            Err(IdentifierError::Unconvertible { target: "ISBN-10", .. })
        ));
    }

    #[test]
    fn test_to_ean13() {
        let ten = validate("0-306-40615-2").unwrap();
        assert_eq!(to_ean13(&ten).as_str(), "9780306406157");

        let thirteen = validate("979-10-90636-07-1").unwrap();
        assert_eq!(to_ean13(&thirteen), thirteen);

        let ean = validate("4006381333931").unwrap();
        assert_eq!(to_ean13(&ean).as_str(), "4006381333931");
        assert_eq!(to_ean13(&ean).kind(), IdentifierKind::Ean13);
    }

    #[test]
    fn test_canonical() {
        assert_eq!(canonical("0-306-40615-2").unwrap(), "9780306406157");
        assert!(canonical("0-306-40615-1").is_err());
    }

    #[test]
    fn test_predicates() {
        assert!(is_isbn10("0-306-40615-2"));
        assert!(!is_isbn10("9780306406157"));
        assert!(is_isbn13("9780306406157"));
        assert!(not_isbn("4006381333931"));
        assert!(not_isbn("hello"));
    }

    #[test]
    fn test_mask() {
        let codec = IdentifierCodec::default();
        let id = validate("9780306406157").unwrap();
        assert_eq!(codec.mask(&id, MaskStyle::Hyphen), "978-0-306-40615-7");
        assert_eq!(codec.mask(&id, MaskStyle::Space), "978 0 306 40615 7");

        let ten = validate("080442957X").unwrap();
        assert_eq!(codec.mask(&ten, MaskStyle::Hyphen), "0-8044-2957-X");
    }

    #[test]
    fn test_mask_fallback() {
        let empty = RangeTable::from_entries([("978", vec![(0, 9_999_999, 0)])]).unwrap();
        let codec = IdentifierCodec::new(&empty);

        let id = validate("9780306406157").unwrap();
        assert_eq!(codec.mask(&id, MaskStyle::Hyphen), "978-030640615-7");

        let ten = validate("0306406152").unwrap();
        assert_eq!(codec.mask(&ten, MaskStyle::Hyphen), "030640615-2");

        let ean = validate("4006381333931").unwrap();
        assert_eq!(codec.mask(&ean, MaskStyle::Hyphen), "400-638133393-1");
    }

    #[test]
    fn test_info_and_doi() {
        let codec = IdentifierCodec::default();
        let id = validate("978-0-19-513286-1").unwrap();
        assert_eq!(codec.info(&id), Some("English language"));
        assert_eq!(codec.doi(&id).unwrap(), "10.978.019/5132861");
    }
}
