//! Error types for isbn-metadata

use isbn_identifiers::IdentifierError;
use thiserror::Error;

use crate::http::FetchError;

/// Outcome of a single provider call that did not produce a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// This provider has no record for the identifier
    #[error("Not found")]
    NotFound,

    /// Outage, timeout, rate limit or unparseable response
    #[error("Transient error: {0}")]
    Transient(String),

    /// The provider does not implement the requested lookup
    #[error("Operation not supported")]
    Unsupported,
}

impl From<FetchError> for ProviderError {
    fn from(e: FetchError) -> Self {
        ProviderError::Transient(e.to_string())
    }
}

/// Failure of a whole resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// Every registered provider was tried without success
    #[error("No provider has metadata for {isbn}")]
    NotFoundAnywhere { isbn: String },

    /// This caller stopped waiting; the resolution itself carries on
    #[error("Timed out waiting for {isbn}")]
    WaitTimedOut { isbn: String },

    /// The resolution task ended without reporting a result
    #[error("Resolution of {isbn} was aborted")]
    Aborted { isbn: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Provider already registered: {0}")]
    AlreadyRegistered(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] FetchError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
