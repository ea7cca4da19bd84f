//! ISBN validation, conversion and extraction
//!
//! This crate provides the pure, I/O-free half of isbn-tools:
//! - Checksum validation of ISBN-10, ISBN-13 and EAN-13
//! - ISBN-10 ↔ ISBN-13 conversion
//! - Hyphenation from International ISBN Agency range data
//! - ISBN extraction from text, including spelled-out numbers

pub mod codec;
pub mod error;
pub mod extractors;
pub mod identifier;
pub mod ranges;
pub mod words;

pub use codec::{
    canonical, clean, is_isbn10, is_isbn13, not_isbn, to_ean13, to_isbn10, to_isbn13, validate,
    IdentifierCodec, IsbnParts, MaskStyle,
};
pub use error::{IdentifierError, RangeError};
pub use extractors::{extract_all, extract_isbnlike, extract_isbns, ExtractedIsbn};
pub use identifier::{Identifier, IdentifierKind, BOOKLAND_PREFIXES};
pub use ranges::{RangeEntry, RangeGroup, RangeTable};
pub use words::{extract_from_words, WordExtractor};
