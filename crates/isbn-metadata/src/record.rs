//! Bibliographic metadata records

use std::collections::BTreeMap;
use std::fmt;

use isbn_identifiers::Identifier;
use serde::{Deserialize, Serialize};

/// Canonical field names shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Subtitle,
    Authors,
    Publisher,
    Year,
    Language,
    Pages,
    Edition,
    Description,
    Cover,
    InfoUrl,
}

impl Field {
    pub fn all() -> &'static [Field] {
        &[
            Field::Title,
            Field::Subtitle,
            Field::Authors,
            Field::Publisher,
            Field::Year,
            Field::Language,
            Field::Pages,
            Field::Edition,
            Field::Description,
            Field::Cover,
            Field::InfoUrl,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Subtitle => "subtitle",
            Field::Authors => "authors",
            Field::Publisher => "publisher",
            Field::Year => "year",
            Field::Language => "language",
            Field::Pages => "pages",
            Field::Edition => "edition",
            Field::Description => "description",
            Field::Cover => "cover",
            Field::InfoUrl => "info_url",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(i64),
    Text(String),
    List(Vec<String>),
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(list: Vec<String>) -> Self {
        FieldValue::List(list)
    }
}

/// Metadata for one work, keyed by its canonical ISBN-13.
///
/// A field that was never supplied is absent from the map; a provider that
/// answered with an empty title leaves `Some(FieldValue::Text(""))`. The two
/// are never conflated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub isbn13: Identifier,
    fields: BTreeMap<Field, FieldValue>,
    /// Provider that supplied each field
    provenance: BTreeMap<Field, String>,
}

impl MetadataRecord {
    pub fn new(isbn13: Identifier) -> Self {
        Self {
            isbn13,
            fields: BTreeMap::new(),
            provenance: BTreeMap::new(),
        }
    }

    /// Builder-style `set`
    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, field: Field, value: impl Into<FieldValue>) {
        self.fields.insert(field, value.into());
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.fields.iter().map(|(f, v)| (*f, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Record `provider` as the source of every field that has no source yet.
    pub fn attribute_to(&mut self, provider: &str) {
        for field in self.fields.keys() {
            self.provenance
                .entry(*field)
                .or_insert_with(|| provider.to_string());
        }
    }

    /// Provider that supplied `field`
    pub fn source_of(&self, field: Field) -> Option<&str> {
        self.provenance.get(&field).map(String::as_str)
    }

    /// Distinct providers that contributed, in field order
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = Vec::new();
        for name in self.provenance.values() {
            if !sources.contains(&name.as_str()) {
                sources.push(name);
            }
        }
        sources
    }

    /// Copy over the fields `other` has and `self` lacks. Existing fields are
    /// never overwritten. Returns how many fields were filled.
    pub fn fill_missing(&mut self, other: &MetadataRecord) -> usize {
        let mut filled = 0;
        for (field, value) in &other.fields {
            if self.fields.contains_key(field) {
                continue;
            }
            self.fields.insert(*field, value.clone());
            if let Some(source) = other.provenance.get(field) {
                self.provenance.insert(*field, source.clone());
            }
            filled += 1;
        }
        filled
    }

    /// True when every field in `wanted` is present
    pub fn has_all(&self, wanted: &[Field]) -> bool {
        wanted.iter().all(|f| self.fields.contains_key(f))
    }

    pub fn title(&self) -> Option<&str> {
        match self.get(Field::Title)? {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn authors(&self) -> Vec<&str> {
        match self.get(Field::Authors) {
            Some(FieldValue::List(list)) => list.iter().map(String::as_str).collect(),
            Some(FieldValue::Text(s)) => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn year(&self) -> Option<i64> {
        match self.get(Field::Year)? {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::List(_) => None,
        }
    }
}

/// First run of four digits in a date string ("2001-05-12", "May 2001")
pub(crate) fn year_from_date(date: &str) -> Option<i64> {
    let bytes = date.as_bytes();
    bytes
        .windows(4)
        .enumerate()
        .find(|(i, w)| {
            w.iter().all(u8::is_ascii_digit)
                && !bytes.get(i + 4).is_some_and(u8::is_ascii_digit)
                && (*i == 0 || !bytes[i - 1].is_ascii_digit())
        })
        .and_then(|(i, _)| date[i..i + 4].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isbn() -> Identifier {
        "9780306406157".parse().unwrap()
    }

    #[test]
    fn test_absent_vs_empty() {
        let record = MetadataRecord::new(isbn()).with(Field::Title, "");
        assert_eq!(record.get(Field::Title), Some(&FieldValue::Text(String::new())));
        assert_eq!(record.get(Field::Publisher), None);
    }

    #[test]
    fn test_fill_missing_never_overwrites() {
        let mut first = MetadataRecord::new(isbn()).with(Field::Title, "X");
        first.attribute_to("a");
        let mut second = MetadataRecord::new(isbn())
            .with(Field::Title, "Y")
            .with(Field::Year, 2000i64);
        second.attribute_to("b");

        assert_eq!(first.fill_missing(&second), 1);
        assert_eq!(first.title(), Some("X"));
        assert_eq!(first.year(), Some(2000));
        assert_eq!(first.source_of(Field::Title), Some("a"));
        assert_eq!(first.source_of(Field::Year), Some("b"));
        assert_eq!(first.sources(), vec!["a", "b"]);
    }

    #[test]
    fn test_year_from_date() {
        assert_eq!(year_from_date("2001-05-12"), Some(2001));
        assert_eq!(year_from_date("May 1999"), Some(1999));
        assert_eq!(year_from_date("c. 12345"), None);
        assert_eq!(year_from_date("unknown"), None);
    }

    #[test]
    fn test_serialize() {
        let record = MetadataRecord::new(isbn())
            .with(Field::Title, "Title")
            .with(Field::Authors, vec!["A".to_string(), "B".to_string()]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["isbn13"], "9780306406157");
        assert_eq!(json["fields"]["title"], "Title");
        assert_eq!(json["fields"]["authors"][1], "B");
    }
}
