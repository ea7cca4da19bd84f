//! Error types for identifier handling

use thiserror::Error;

/// Why a string could not become (or be converted to) an [`Identifier`].
///
/// `InvalidFormat` and `InvalidChecksum` are kept apart on purpose: the first
/// means "not ISBN-shaped at all", the second "ISBN-shaped, probably a typo".
///
/// [`Identifier`]: crate::Identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// Wrong length or characters after separators are stripped
    #[error("Invalid ISBN format: {0}")]
    InvalidFormat(String),

    /// Right shape, failed checksum
    #[error("Invalid ISBN checksum: {0}")]
    InvalidChecksum(String),

    /// Valid identifier without a representation in the requested kind
    #[error("Cannot convert {value} to {target}")]
    Unconvertible { value: String, target: &'static str },
}

/// Errors raised while loading registration-range data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Range XML error: {0}")]
    Xml(String),

    #[error("Malformed range data: {0}")]
    Malformed(String),

    #[error("Overlapping ranges under prefix {prefix}: {first} and {second}")]
    Overlap {
        prefix: String,
        first: String,
        second: String,
    },
}
