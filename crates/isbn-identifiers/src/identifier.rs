//! The validated identifier value type

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::IdentifierError;

/// Bookland prefixes: the EAN-13 space reserved for the book trade.
pub const BOOKLAND_PREFIXES: [&str; 2] = ["978", "979"];

/// Which numbering space an [`Identifier`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdentifierKind {
    Isbn10,
    Isbn13,
    /// 13-digit EAN outside the Bookland prefixes
    Ean13,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Isbn10 => "ISBN-10",
            IdentifierKind::Isbn13 => "ISBN-13",
            IdentifierKind::Ean13 => "EAN-13",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A checksum-validated ISBN-10, ISBN-13 or EAN-13.
///
/// There is no public constructor other than [`codec::validate`] (and the
/// `FromStr`/serde impls that call it), so holding an `Identifier` means the
/// checksum has been verified. The digit string never contains separators;
/// the last character of an ISBN-10 may be `X`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    kind: IdentifierKind,
    digits: String,
}

impl Identifier {
    /// Only for callers that have already verified the checksum.
    pub(crate) fn new_unchecked(kind: IdentifierKind, digits: String) -> Self {
        Self { kind, digits }
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// Bare digit string (plus a trailing `X` for some ISBN-10s)
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Final check character
    pub fn check_char(&self) -> char {
        // digits is never empty
        self.digits.chars().last().unwrap_or('0')
    }

    /// Three-digit EAN prefix, `None` for ISBN-10
    pub fn prefix(&self) -> Option<&str> {
        match self.kind {
            IdentifierKind::Isbn10 => None,
            _ => Some(&self.digits[..3]),
        }
    }

    pub fn is_bookland(&self) -> bool {
        match self.kind {
            IdentifierKind::Isbn10 | IdentifierKind::Isbn13 => true,
            IdentifierKind::Ean13 => false,
        }
    }

    /// Canonical ISBN-13 form of this identifier.
    pub fn to_isbn13(&self) -> Result<Identifier, IdentifierError> {
        codec::to_isbn13(self)
    }

    /// ISBN-10 form; only `978`-prefixed identifiers have one.
    pub fn to_isbn10(&self) -> Result<Identifier, IdentifierError> {
        codec::to_isbn10(self)
    }

    /// True when both identifiers denote the same work once canonicalized
    /// to ISBN-13 (e.g. `0306406152` and `9780306406157`).
    pub fn same_work(&self, other: &Identifier) -> bool {
        match (self.to_isbn13(), other.to_isbn13()) {
            (Ok(a), Ok(b)) => a == b,
            _ => self == other,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.digits
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        codec::validate(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        codec::validate(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.digits
    }
}
