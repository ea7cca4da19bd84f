//! Common trait for metadata providers

use std::time::Duration;

use async_trait::async_trait;
use isbn_identifiers::Identifier;

use crate::error::ProviderError;
use crate::http::{Fetch, FetchResponse};
use crate::record::MetadataRecord;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A named source of bibliographic metadata.
///
/// Providers are stateless apart from their settings; all I/O goes through the
/// `Fetch` handed to each call.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short service name ("goob", "openl")
    fn name(&self) -> &str;

    /// Upper bound the resolver allows for one call to this provider
    fn timeout(&self) -> Duration {
        DEFAULT_TIMEOUT
    }

    /// How long a record from this provider may be served from cache
    fn cache_ttl(&self) -> Duration {
        DEFAULT_CACHE_TTL
    }

    async fn fetch_by_identifier(
        &self,
        isbn13: &Identifier,
        http: &dyn Fetch,
    ) -> Result<MetadataRecord, ProviderError>;

    /// Free-text search returning the ISBN-13s of matching works
    async fn fetch_by_query(
        &self,
        _query: &str,
        _http: &dyn Fetch,
    ) -> Result<Vec<Identifier>, ProviderError> {
        Err(ProviderError::Unsupported)
    }

    fn supports_query(&self) -> bool {
        false
    }

    /// ISBN-13s of every known edition of the work `isbn13` belongs to
    async fn fetch_editions(
        &self,
        _isbn13: &Identifier,
        _http: &dyn Fetch,
    ) -> Result<Vec<Identifier>, ProviderError> {
        Err(ProviderError::Unsupported)
    }

    fn supports_editions(&self) -> bool {
        false
    }
}

/// Map a response status onto the provider taxonomy. 404 means the provider
/// has no such record; anything else outside 2xx is an outage.
pub(crate) fn check_status(response: &FetchResponse) -> Result<(), ProviderError> {
    match response.status {
        404 => Err(ProviderError::NotFound),
        _ if response.is_success() => Ok(()),
        status => Err(ProviderError::Transient(format!("HTTP {}", status))),
    }
}
