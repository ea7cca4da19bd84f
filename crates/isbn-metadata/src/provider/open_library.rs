//! Open Library provider ("openl")
//!
//! API docs: https://openlibrary.org/dev/docs/api/books
//! An unknown ISBN yields `{}` with status 200.
//!
//! Editions come from the works API: `/isbn/<isbn>.json` names the work,
//! `<work>/editions.json` lists its editions.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use isbn_identifiers::{codec, Identifier};
use serde::Deserialize;

use super::traits::{check_status, Provider, DEFAULT_CACHE_TTL, DEFAULT_TIMEOUT};
use crate::error::ProviderError;
use crate::http::Fetch;
use crate::record::{year_from_date, Field, MetadataRecord};

pub const NAME: &str = "openl";

#[derive(Debug, Deserialize)]
struct Book {
    title: Option<String>,
    subtitle: Option<String>,
    authors: Option<Vec<Named>>,
    publishers: Option<Vec<Named>>,
    publish_date: Option<String>,
    number_of_pages: Option<i64>,
    notes: Option<String>,
    cover: Option<Cover>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Cover {
    large: Option<String>,
    medium: Option<String>,
    small: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Edition {
    #[serde(default)]
    works: Vec<Keyed>,
}

#[derive(Debug, Deserialize)]
struct Keyed {
    key: String,
}

#[derive(Debug, Deserialize)]
struct EditionList {
    #[serde(default)]
    entries: Vec<EditionEntry>,
}

#[derive(Debug, Deserialize)]
struct EditionEntry {
    #[serde(default)]
    isbn_13: Vec<String>,
    #[serde(default)]
    isbn_10: Vec<String>,
}

pub struct OpenLibraryProvider {
    base_url: String,
    site_url: String,
    timeout: Duration,
    cache_ttl: Duration,
}

impl OpenLibraryProvider {
    pub fn new() -> Self {
        Self {
            base_url: "https://openlibrary.org/api/books".to_string(),
            site_url: "https://openlibrary.org".to_string(),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Root for the works and editions endpoints
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn lookup_url(&self, isbn13: &Identifier) -> String {
        format!(
            "{}?bibkeys=ISBN:{}&jscmd=data&format=json",
            self.base_url, isbn13
        )
    }

    pub fn edition_url(&self, isbn13: &Identifier) -> String {
        format!("{}/isbn/{}.json", self.site_url, isbn13)
    }

    pub fn editions_url(&self, work_key: &str) -> String {
        format!("{}{}/editions.json", self.site_url, work_key)
    }

    /// Key of the work an edition record belongs to, e.g. `/works/OL45883W`.
    pub fn parse_work_key(json: &str) -> Result<String, ProviderError> {
        let edition: Edition = serde_json::from_str(json)
            .map_err(|e| ProviderError::Transient(format!("Invalid Open Library JSON: {}", e)))?;
        edition
            .works
            .into_iter()
            .next()
            .map(|work| work.key)
            .ok_or(ProviderError::NotFound)
    }

    /// Distinct ISBN-13s listed in an `editions.json` page, in listing order.
    /// Editions only carrying an ISBN-10 are converted; invalid numbers are
    /// skipped.
    pub fn parse_editions_response(json: &str) -> Result<Vec<Identifier>, ProviderError> {
        let list: EditionList = serde_json::from_str(json)
            .map_err(|e| ProviderError::Transient(format!("Invalid Open Library JSON: {}", e)))?;

        let mut found: Vec<Identifier> = Vec::new();
        for entry in list.entries {
            let ids = entry
                .isbn_13
                .iter()
                .chain(entry.isbn_10.iter())
                .filter_map(|raw| codec::validate(raw).ok())
                .filter_map(|id| id.to_isbn13().ok());
            for id in ids {
                if !found.contains(&id) {
                    found.push(id);
                }
            }
        }
        if found.is_empty() {
            return Err(ProviderError::NotFound);
        }
        Ok(found)
    }

    /// Parse a `jscmd=data` response. The body maps `ISBN:<isbn13>` to a book.
    pub fn parse_books_response(
        json: &str,
        isbn13: &Identifier,
    ) -> Result<MetadataRecord, ProviderError> {
        let mut books: HashMap<String, Book> = serde_json::from_str(json)
            .map_err(|e| ProviderError::Transient(format!("Invalid Open Library JSON: {}", e)))?;

        let book = books
            .remove(&format!("ISBN:{}", isbn13))
            .ok_or(ProviderError::NotFound)?;

        let mut record = Self::build_record(book, isbn13);
        record.attribute_to(NAME);
        Ok(record)
    }

    fn build_record(book: Book, isbn13: &Identifier) -> MetadataRecord {
        let mut record = MetadataRecord::new(isbn13.clone());

        if let Some(title) = book.title {
            record.set(Field::Title, title);
        }
        if let Some(subtitle) = book.subtitle {
            record.set(Field::Subtitle, subtitle);
        }
        if let Some(authors) = book.authors {
            let names: Vec<String> = authors.into_iter().map(|a| a.name).collect();
            record.set(Field::Authors, names);
        }
        // Open Library lists every imprint; the first is the publisher of record
        if let Some(publisher) = book
            .publishers
            .and_then(|p| p.into_iter().next())
            .map(|p| p.name)
        {
            record.set(Field::Publisher, publisher);
        }
        if let Some(year) = book.publish_date.as_deref().and_then(year_from_date) {
            record.set(Field::Year, year);
        }
        if let Some(pages) = book.number_of_pages {
            record.set(Field::Pages, pages);
        }
        if let Some(notes) = book.notes {
            record.set(Field::Description, notes);
        }
        if let Some(cover) = book
            .cover
            .and_then(|c| c.medium.or(c.large).or(c.small))
        {
            record.set(Field::Cover, cover);
        }
        if let Some(url) = book.url {
            record.set(Field::InfoUrl, url);
        }

        record
    }
}

impl Default for OpenLibraryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for OpenLibraryProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    async fn fetch_by_identifier(
        &self,
        isbn13: &Identifier,
        http: &dyn Fetch,
    ) -> Result<MetadataRecord, ProviderError> {
        let response = http.fetch(&self.lookup_url(isbn13), self.timeout).await?;
        check_status(&response)?;
        Self::parse_books_response(&response.text(), isbn13)
    }

    async fn fetch_editions(
        &self,
        isbn13: &Identifier,
        http: &dyn Fetch,
    ) -> Result<Vec<Identifier>, ProviderError> {
        let response = http.fetch(&self.edition_url(isbn13), self.timeout).await?;
        check_status(&response)?;
        let work = Self::parse_work_key(&response.text())?;

        let response = http.fetch(&self.editions_url(&work), self.timeout).await?;
        check_status(&response)?;
        let editions = Self::parse_editions_response(&response.text())?;
        tracing::debug!(isbn = %isbn13, %work, count = editions.len(), "editions listed");
        Ok(editions)
    }

    fn supports_editions(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;

    const SAMPLE_BOOK: &str = r#"{
        "ISBN:9780306406157": {
            "url": "https://openlibrary.org/books/OL2058361M/Seeing_and_believing",
            "title": "Seeing and believing",
            "authors": [{"url": "https://openlibrary.org/authors/OL1A", "name": "Example Author"}],
            "publishers": [{"name": "Plenum Press"}, {"name": "Second Imprint"}],
            "publish_date": "1983",
            "number_of_pages": 213,
            "cover": {"small": "s.jpg", "medium": "m.jpg", "large": "l.jpg"}
        }
    }"#;

    fn isbn() -> Identifier {
        "9780306406157".parse().unwrap()
    }

    #[test]
    fn test_parse_books_response() {
        let record = OpenLibraryProvider::parse_books_response(SAMPLE_BOOK, &isbn()).unwrap();
        assert_eq!(record.title(), Some("Seeing and believing"));
        assert_eq!(record.authors(), vec!["Example Author"]);
        assert_eq!(record.year(), Some(1983));
        assert_eq!(
            record.get(Field::Publisher),
            Some(&FieldValue::from("Plenum Press"))
        );
        assert_eq!(record.get(Field::Cover), Some(&FieldValue::from("m.jpg")));
        assert_eq!(record.sources(), vec![NAME]);
    }

    #[test]
    fn test_empty_object_is_not_found() {
        assert_eq!(
            OpenLibraryProvider::parse_books_response("{}", &isbn()),
            Err(ProviderError::NotFound)
        );
    }

    #[test]
    fn test_parse_work_key() {
        let json = r#"{"key": "/books/OL2058361M", "works": [{"key": "/works/OL15832W"}]}"#;
        assert_eq!(
            OpenLibraryProvider::parse_work_key(json).unwrap(),
            "/works/OL15832W"
        );
        assert_eq!(
            OpenLibraryProvider::parse_work_key(r#"{"key": "/books/OL1M"}"#),
            Err(ProviderError::NotFound)
        );
    }

    #[test]
    fn test_parse_editions_response() {
        let json = r#"{
            "links": {"self": "/works/OL15832W/editions.json"},
            "size": 4,
            "entries": [
                {"key": "/books/OL1M", "isbn_13": ["9780306406157"], "isbn_10": ["0306406152"]},
                {"key": "/books/OL2M", "isbn_10": ["080442957X"]},
                {"key": "/books/OL3M", "title": "No numbers"},
                {"key": "/books/OL4M", "isbn_13": ["9780306406158", "978-3-16-148410-0"]}
            ]
        }"#;
        let found = OpenLibraryProvider::parse_editions_response(json).unwrap();
        let found: Vec<&str> = found.iter().map(Identifier::as_str).collect();
        assert_eq!(found, vec!["9780306406157", "9780804429573", "9783161484100"]);
    }

    #[test]
    fn test_no_editions_is_not_found() {
        assert_eq!(
            OpenLibraryProvider::parse_editions_response(r#"{"entries": []}"#),
            Err(ProviderError::NotFound)
        );
    }

    #[test]
    fn test_editions_urls() {
        let provider = OpenLibraryProvider::new();
        assert_eq!(
            provider.edition_url(&isbn()),
            "https://openlibrary.org/isbn/9780306406157.json"
        );
        assert_eq!(
            provider.editions_url("/works/OL15832W"),
            "https://openlibrary.org/works/OL15832W/editions.json"
        );
    }

    #[test]
    fn test_lookup_url() {
        assert_eq!(
            OpenLibraryProvider::new().lookup_url(&isbn()),
            "https://openlibrary.org/api/books?bibkeys=ISBN:9780306406157&jscmd=data&format=json"
        );
    }
}
