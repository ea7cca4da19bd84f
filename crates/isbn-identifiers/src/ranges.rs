//! Registration-range tables used for hyphenation
//!
//! The International ISBN Agency publishes the ranges as `RangeMessage.xml`.
//! Two kinds of rule lists live in it, both keyed by a prefix string:
//!
//! - `978`, `979` (EAN.UCC prefixes): rules giving the length of the
//!   registration group that follows the prefix
//! - `978-0`, `979-10`, ... (registration groups): rules giving the length
//!   of the registrant element that follows the group
//!
//! Every rule matches a 7-digit window taken right after its prefix. A rule
//! length of 0 marks a range that is not in use.

use std::collections::HashMap;

use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::RangeError;

const WINDOW_DIGITS: usize = 7;

lazy_static! {
    static ref BUILTIN: RangeTable = RangeTable::from_xml(include_str!("../data/RangeMessage.xml"))
        .expect("embedded RangeMessage.xml is valid");
}

/// One `low-high → length` rule over a 7-digit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEntry {
    pub low: u32,
    pub high: u32,
    pub length: u8,
}

impl RangeEntry {
    pub fn new(low: u32, high: u32, length: u8) -> Self {
        Self { low, high, length }
    }

    pub fn contains(&self, window: u32) -> bool {
        self.low <= window && window <= self.high
    }

    /// Parse `"0000000-1999999"` plus a length
    fn parse(range: &str, length: &str) -> Result<Self, RangeError> {
        let (low, high) = range
            .trim()
            .split_once('-')
            .ok_or_else(|| RangeError::Malformed(format!("range without '-': {}", range)))?;
        let low = parse_bound(low)?;
        let high = parse_bound(high)?;
        let length = length
            .trim()
            .parse::<u8>()
            .map_err(|_| RangeError::Malformed(format!("bad rule length: {}", length)))?;
        Ok(Self { low, high, length })
    }
}

fn parse_bound(bound: &str) -> Result<u32, RangeError> {
    let bound = bound.trim();
    if bound.len() != WINDOW_DIGITS || !bound.chars().all(|c| c.is_ascii_digit()) {
        return Err(RangeError::Malformed(format!(
            "range bound must be {} digits: {}",
            WINDOW_DIGITS, bound
        )));
    }
    bound
        .parse()
        .map_err(|_| RangeError::Malformed(format!("bad range bound: {}", bound)))
}

/// Sorted, disjoint rules under one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeGroup {
    prefix: String,
    agency: String,
    entries: Vec<RangeEntry>,
}

impl RangeGroup {
    /// Sorts the rules and rejects inverted or overlapping intervals.
    pub fn new(
        prefix: impl Into<String>,
        agency: impl Into<String>,
        mut entries: Vec<RangeEntry>,
    ) -> Result<Self, RangeError> {
        let prefix = prefix.into();

        if let Some(bad) = entries.iter().find(|e| e.low > e.high) {
            return Err(RangeError::Malformed(format!(
                "inverted range {:07}-{:07} under {}",
                bad.low, bad.high, prefix
            )));
        }

        entries.sort_by_key(|e| e.low);
        for pair in entries.windows(2) {
            if pair[1].low <= pair[0].high {
                return Err(RangeError::Overlap {
                    prefix,
                    first: format!("{:07}-{:07}", pair[0].low, pair[0].high),
                    second: format!("{:07}-{:07}", pair[1].low, pair[1].high),
                });
            }
        }

        Ok(Self {
            prefix,
            agency: agency.into(),
            entries,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn agency(&self) -> &str {
        &self.agency
    }

    pub fn entries(&self) -> &[RangeEntry] {
        &self.entries
    }

    /// Length assigned to `window`, or `None` when no rule covers it or the
    /// covering rule is unassigned (length 0).
    pub fn lookup(&self, window: u32) -> Option<usize> {
        let idx = self.entries.partition_point(|e| e.high < window);
        self.entries
            .get(idx)
            .filter(|e| e.contains(window) && e.length > 0)
            .map(|e| e.length as usize)
    }
}

/// Immutable registration-range data, loaded once.
#[derive(Debug, Clone, Default)]
pub struct RangeTable {
    source: Option<String>,
    date: Option<String>,
    groups: HashMap<String, RangeGroup>,
}

impl RangeTable {
    /// The snapshot compiled into the crate.
    pub fn builtin() -> &'static RangeTable {
        &BUILTIN
    }

    /// Build from `(prefix, [(low, high, length), ...])` tuples.
    ///
    /// Prefixes without a dash (`978`) are EAN.UCC prefixes, prefixes with one
    /// (`978-0`) are registration groups.
    pub fn from_entries<I, P>(tables: I) -> Result<Self, RangeError>
    where
        I: IntoIterator<Item = (P, Vec<(u32, u32, u8)>)>,
        P: Into<String>,
    {
        let mut table = RangeTable::default();
        for (prefix, rules) in tables {
            let entries = rules
                .into_iter()
                .map(|(low, high, length)| RangeEntry::new(low, high, length))
                .collect();
            table.insert(RangeGroup::new(prefix, String::new(), entries)?)?;
        }
        Ok(table)
    }

    /// Parse the International ISBN Agency `RangeMessage.xml` format.
    pub fn from_xml(xml: &str) -> Result<Self, RangeError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut table = RangeTable::default();
        let mut buf = Vec::new();

        let mut current_element = String::new();
        let mut in_section = false;
        let mut prefix = String::new();
        let mut agency = String::new();
        let mut entries: Vec<RangeEntry> = Vec::new();
        let mut range = String::new();
        let mut length = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    if name == "EAN.UCC" || name == "Group" {
                        in_section = true;
                        prefix.clear();
                        agency.clear();
                        entries.clear();
                    } else if name == "Rule" {
                        range.clear();
                        length.clear();
                    }
                    current_element = name;
                }
                Ok(Event::End(ref e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    if (name == "EAN.UCC" || name == "Group") && in_section {
                        if prefix.is_empty() {
                            return Err(RangeError::Malformed(format!("<{}> without <Prefix>", name)));
                        }
                        let group = RangeGroup::new(
                            prefix.clone(),
                            agency.clone(),
                            std::mem::take(&mut entries),
                        )?;
                        table.insert(group)?;
                        in_section = false;
                    } else if name == "Rule" && in_section {
                        entries.push(RangeEntry::parse(&range, &length)?);
                    }
                    current_element.clear();
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| RangeError::Xml(e.to_string()))?
                        .to_string();
                    match current_element.as_str() {
                        "MessageSource" => table.source = Some(text),
                        "MessageDate" => table.date = Some(text),
                        "Prefix" if in_section => prefix = text,
                        "Agency" if in_section => agency = text,
                        "Range" if in_section => range = text,
                        "Length" if in_section => length = text,
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(RangeError::Xml(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        if table.groups.is_empty() {
            return Err(RangeError::Malformed("no range rules found".to_string()));
        }
        Ok(table)
    }

    fn insert(&mut self, group: RangeGroup) -> Result<(), RangeError> {
        if self.groups.contains_key(group.prefix()) {
            return Err(RangeError::Malformed(format!(
                "duplicate prefix {}",
                group.prefix()
            )));
        }
        self.groups.insert(group.prefix().to_string(), group);
        Ok(())
    }

    /// `MessageSource` of the loaded data, if any
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// `MessageDate` of the loaded data, if any
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn group(&self, prefix: &str) -> Option<&RangeGroup> {
        self.groups.get(prefix)
    }

    /// Agency name for an EAN.UCC prefix or registration group
    pub fn agency(&self, prefix: &str) -> Option<&str> {
        self.groups
            .get(prefix)
            .map(|g| g.agency())
            .filter(|a| !a.is_empty())
    }

    /// Rule length for the digits that follow `prefix`.
    ///
    /// `following` may be shorter than seven digits; it is right-padded with
    /// zeros to form the window.
    pub fn lookup(&self, prefix: &str, following: &str) -> Option<usize> {
        let window = window_value(following)?;
        self.groups.get(prefix)?.lookup(window)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// First seven digits of `digits`, zero-padded on the right.
fn window_value(digits: &str) -> Option<u32> {
    let mut value = 0u32;
    let mut taken = 0;
    for c in digits.chars().take(WINDOW_DIGITS) {
        value = value * 10 + c.to_digit(10)?;
        taken += 1;
    }
    for _ in taken..WINDOW_DIGITS {
        value *= 10;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ISBNRangeMessage>
  <MessageSource>International ISBN Agency</MessageSource>
  <MessageDate>Sun, 5 Jan 2014 17:50:50 GMT</MessageDate>
  <EAN.UCCPrefixes>
    <EAN.UCC>
      <Prefix>978</Prefix>
      <Agency>International ISBN Agency</Agency>
      <Rules>
        <Rule><Range>0000000-5999999</Range><Length>1</Length></Rule>
        <Rule><Range>6000000-9999999</Range><Length>0</Length></Rule>
      </Rules>
    </EAN.UCC>
  </EAN.UCCPrefixes>
  <RegistrationGroups>
    <Group>
      <Prefix>978-0</Prefix>
      <Agency>English language</Agency>
      <Rules>
        <Rule><Range>2000000-2279999</Range><Length>3</Length></Rule>
        <Rule><Range>0000000-1999999</Range><Length>2</Length></Rule>
      </Rules>
    </Group>
  </RegistrationGroups>
</ISBNRangeMessage>"#;

    #[test]
    fn test_parse_xml() {
        let table = RangeTable::from_xml(SAMPLE).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.source(), Some("International ISBN Agency"));
        assert_eq!(table.agency("978-0"), Some("English language"));

        // Rules come back sorted
        let group = table.group("978-0").unwrap();
        assert_eq!(group.entries()[0].low, 0);
        assert_eq!(group.entries()[1].low, 2_000_000);
    }

    #[test]
    fn test_lookup() {
        let table = RangeTable::from_xml(SAMPLE).unwrap();
        assert_eq!(table.lookup("978", "0306406"), Some(1));
        assert_eq!(table.lookup("978-0", "1234567"), Some(2));
        assert_eq!(table.lookup("978-0", "2100000"), Some(3));
        // Gap between the rules
        assert_eq!(table.lookup("978-0", "3000000"), None);
        // Unassigned range
        assert_eq!(table.lookup("978", "7000000"), None);
        assert_eq!(table.lookup("999", "0000000"), None);
    }

    #[test]
    fn test_short_window_is_padded() {
        let table = RangeTable::from_xml(SAMPLE).unwrap();
        assert_eq!(table.lookup("978-0", "21"), Some(3));
    }

    #[test]
    fn test_overlap_rejected() {
        let result = RangeTable::from_entries([(
            "978-0",
            vec![(0, 2_000_000, 2), (1_999_999, 2_279_999, 3)],
        )]);
        assert!(matches!(result, Err(RangeError::Overlap { .. })));
    }

    #[test]
    fn test_inverted_rejected() {
        let result = RangeTable::from_entries([("978", vec![(5, 1, 1)])]);
        assert!(matches!(result, Err(RangeError::Malformed(_))));
    }

    #[test]
    fn test_malformed_bound() {
        let xml = SAMPLE.replace("0000000-5999999", "000-5999999");
        assert!(matches!(
            RangeTable::from_xml(&xml),
            Err(RangeError::Malformed(_))
        ));
    }

    #[test]
    fn test_builtin_loads() {
        let table = RangeTable::builtin();
        assert!(table.group("978").is_some());
        assert!(table.group("979").is_some());
        assert!(table.group("978-0").is_some());
        assert!(table.group("979-10").is_some());
        assert!(table.group("978-84").is_some());
        assert!(table.group("978-607").is_some());
        assert!(table.group("978-99953").is_some());
        assert!(table.group("979-8").is_some());
        assert!(table.len() > 200);
        assert_eq!(table.agency("978-88"), Some("Italy"));
    }
}
