//! Chunk Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use pistore_compress::error::{Error as CompressionError, ErrorKind as CompressionErrorKind};
use std::path::PathBuf;

/// A chunk error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for chunk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Serialized bytes (binary or JSON) don't describe a valid chunk. Don't
    /// retry with the same input.
    #[display("malformed chunk: {_0}")]
    Format(#[error(not(source))] String),
    /// The compression backend failed.
    #[display("compression error: {_0}")]
    Compression(CompressionErrorKind),
    /// Constructor arguments contradict each other or the format's limits.
    #[display("invalid chunk input: {_0}")]
    InvalidInput(#[error(not(source))] String),
    /// Chunk file does not exist.
    #[display("chunk file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Chunk file could not be created, written or read.
    #[display("I/O error: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Convert a compression error into a chunk error, preserving the
    /// compress crate's `Exn` frame as a child in its own error tree.
    #[track_caller]
    pub fn compression(err: CompressionError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Compression(inner))
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
