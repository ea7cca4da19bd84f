//! # isbn-metadata
//!
//! Bibliographic metadata for ISBNs from online providers.
//!
//! A [`MetadataResolver`] asks the providers in its [`ProviderRegistry`] in
//! priority order, falls back on misses and outages, optionally merges fields
//! from several providers, and caches the result under the canonical ISBN-13.
//! Concurrent requests for the same work share a single resolution.
//!
//! ```no_run
//! use isbn_metadata::{ResolveOptions, ResolverConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = ResolverConfig::load_standard()?.build()?;
//! let record = resolver
//!     .resolve_str("0-306-40615-2", ResolveOptions::merged())
//!     .await?;
//! println!("{:?}", record.title());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod provider;
pub mod record;
pub mod registry;
pub mod resolver;

pub use cache::MetadataCache;
pub use config::{CacheConfig, HttpConfig, ProviderConfig, ResolverConfig};
pub use error::{ConfigError, ProviderError, RegistryError, ResolveError};
pub use http::{Fetch, FetchError, FetchResponse, HttpClient};
pub use provider::{GoogleBooksProvider, OpenLibraryProvider, Provider};
pub use record::{Field, FieldValue, MetadataRecord};
pub use registry::ProviderRegistry;
pub use resolver::{MetadataResolver, ResolveOptions};
