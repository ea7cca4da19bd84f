//! Google Books provider ("goob")
//!
//! API docs: https://developers.google.com/books/docs/v1/using
//! Anonymous access is rate limited per IP; 429s surface as transient errors.

use std::time::Duration;

use async_trait::async_trait;
use isbn_identifiers::{codec, Identifier};
use serde::Deserialize;

use super::traits::{check_status, Provider, DEFAULT_CACHE_TTL, DEFAULT_TIMEOUT};
use crate::error::ProviderError;
use crate::http::Fetch;
use crate::record::{year_from_date, Field, MetadataRecord};

pub const NAME: &str = "goob";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[serde(default)]
    total_items: u32,
    items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    subtitle: Option<String>,
    authors: Option<Vec<String>>,
    publisher: Option<String>,
    published_date: Option<String>,
    language: Option<String>,
    page_count: Option<i64>,
    description: Option<String>,
    image_links: Option<ImageLinks>,
    info_link: Option<String>,
    industry_identifiers: Option<Vec<IndustryIdentifier>>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
    #[serde(rename = "smallThumbnail")]
    small_thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

pub struct GoogleBooksProvider {
    base_url: String,
    timeout: Duration,
    cache_ttl: Duration,
}

impl GoogleBooksProvider {
    pub fn new() -> Self {
        Self {
            base_url: "https://www.googleapis.com/books/v1/volumes".to_string(),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
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
        format!("{}?q=isbn:{}", self.base_url, isbn13)
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}?q={}&maxResults=20",
            self.base_url,
            urlencoding::encode(query)
        )
    }

    /// Parse a volumes response for an ISBN lookup. The first volume is taken.
    pub fn parse_volume_response(
        json: &str,
        isbn13: &Identifier,
    ) -> Result<MetadataRecord, ProviderError> {
        let response: VolumesResponse = serde_json::from_str(json)
            .map_err(|e| ProviderError::Transient(format!("Invalid Google Books JSON: {}", e)))?;

        let volume = response
            .items
            .and_then(|items| items.into_iter().next())
            .ok_or(ProviderError::NotFound)?;

        let mut record = Self::build_record(volume.volume_info, isbn13);
        record.attribute_to(NAME);
        Ok(record)
    }

    /// Parse a free-text search response into the ISBN-13s of the matches.
    pub fn parse_search_response(json: &str) -> Result<Vec<Identifier>, ProviderError> {
        let response: VolumesResponse = serde_json::from_str(json)
            .map_err(|e| ProviderError::Transient(format!("Invalid Google Books JSON: {}", e)))?;

        if response.total_items == 0 {
            return Ok(Vec::new());
        }

        let mut found: Vec<Identifier> = Vec::new();
        for volume in response.items.unwrap_or_default() {
            let ids = volume.volume_info.industry_identifiers.unwrap_or_default();
            // Prefer the ISBN-13 entry; fall back to converting the ISBN-10
            let isbn = ids
                .iter()
                .find(|id| id.kind == "ISBN_13")
                .or_else(|| ids.iter().find(|id| id.kind == "ISBN_10"))
                .and_then(|id| codec::validate(&id.identifier).ok())
                .and_then(|id| id.to_isbn13().ok());
            if let Some(isbn) = isbn {
                if !found.contains(&isbn) {
                    found.push(isbn);
                }
            }
        }
        Ok(found)
    }

    fn build_record(info: VolumeInfo, isbn13: &Identifier) -> MetadataRecord {
        let mut record = MetadataRecord::new(isbn13.clone());

        if let Some(title) = info.title {
            record.set(Field::Title, title);
        }
        if let Some(subtitle) = info.subtitle {
            record.set(Field::Subtitle, subtitle);
        }
        if let Some(authors) = info.authors {
            record.set(Field::Authors, authors);
        }
        if let Some(publisher) = info.publisher {
            record.set(Field::Publisher, publisher);
        }
        if let Some(year) = info.published_date.as_deref().and_then(year_from_date) {
            record.set(Field::Year, year);
        }
        if let Some(language) = info.language {
            record.set(Field::Language, language);
        }
        if let Some(pages) = info.page_count {
            record.set(Field::Pages, pages);
        }
        if let Some(description) = info.description {
            record.set(Field::Description, description);
        }
        if let Some(cover) = info
            .image_links
            .and_then(|links| links.thumbnail.or(links.small_thumbnail))
        {
            record.set(Field::Cover, cover);
        }
        if let Some(link) = info.info_link {
            record.set(Field::InfoUrl, link);
        }

        record
    }
}

impl Default for GoogleBooksProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for GoogleBooksProvider {
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
        Self::parse_volume_response(&response.text(), isbn13)
    }

    async fn fetch_by_query(
        &self,
        query: &str,
        http: &dyn Fetch,
    ) -> Result<Vec<Identifier>, ProviderError> {
        let response = http.fetch(&self.search_url(query), self.timeout).await?;
        check_status(&response)?;
        Self::parse_search_response(&response.text())
    }

    fn supports_query(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;

    const SAMPLE_VOLUME: &str = r#"{
        "kind": "books#volumes",
        "totalItems": 1,
        "items": [{
            "volumeInfo": {
                "title": "Wireless Communications",
                "authors": ["Andrea Goldsmith"],
                "publisher": "Cambridge University Press",
                "publishedDate": "2005-08-08",
                "pageCount": 644,
                "language": "en",
                "imageLinks": {"thumbnail": "http://books.google.com/cover.jpg"},
                "industryIdentifiers": [
                    {"type": "ISBN_10", "identifier": "0521837162"},
                    {"type": "ISBN_13", "identifier": "9780521837163"}
                ]
            }
        }]
    }"#;

    fn isbn() -> Identifier {
        "9780521837163".parse().unwrap()
    }

    #[test]
    fn test_parse_volume_response() {
        let record = GoogleBooksProvider::parse_volume_response(SAMPLE_VOLUME, &isbn()).unwrap();
        assert_eq!(record.title(), Some("Wireless Communications"));
        assert_eq!(record.authors(), vec!["Andrea Goldsmith"]);
        assert_eq!(record.year(), Some(2005));
        assert_eq!(record.get(Field::Pages), Some(&FieldValue::Number(644)));
        assert_eq!(record.source_of(Field::Title), Some(NAME));
        assert!(!record.contains(Field::Subtitle));
    }

    #[test]
    fn test_parse_empty_response_is_not_found() {
        let json = r#"{"kind": "books#volumes", "totalItems": 0}"#;
        assert_eq!(
            GoogleBooksProvider::parse_volume_response(json, &isbn()),
            Err(ProviderError::NotFound)
        );
    }

    #[test]
    fn test_parse_garbage_is_transient() {
        assert!(matches!(
            GoogleBooksProvider::parse_volume_response("<html>", &isbn()),
            Err(ProviderError::Transient(_))
        ));
    }

    #[test]
    fn test_parse_search_response() {
        let ids = GoogleBooksProvider::parse_search_response(SAMPLE_VOLUME).unwrap();
        assert_eq!(ids, vec![isbn()]);
    }

    #[test]
    fn test_urls() {
        let provider = GoogleBooksProvider::new();
        assert_eq!(
            provider.lookup_url(&isbn()),
            "https://www.googleapis.com/books/v1/volumes?q=isbn:9780521837163"
        );
        assert_eq!(
            provider.search_url("wireless goldsmith"),
            "https://www.googleapis.com/books/v1/volumes?q=wireless%20goldsmith&maxResults=20"
        );
    }
}
