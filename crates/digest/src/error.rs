//! Digest Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A digest error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for digest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Text is not hexadecimal.
    #[display("invalid hex digest: {_0}")]
    InvalidHex(#[error(not(source))] String),
    /// Input decoded to the wrong number of bytes.
    #[display("expected {} digest bytes, found {_0}", crate::DIGEST_LEN)]
    InvalidLength(#[error(not(source))] usize),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Parsing the same text again gives the same answer.
        false
    }
}
