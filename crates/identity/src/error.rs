//! Identity Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An identity error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for identity operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No non-loopback network interface exposes a hardware address. There is
    /// no fallback scheme; supply a persisted host ID instead.
    #[display("no network interface with a hardware address")]
    NoInterface,
    /// The machine hostname could not be read, or was empty or not UTF-8.
    #[display("unable to read hostname")]
    Hostname,
    /// A caller-supplied host ID was unusable.
    #[display("invalid host ID: {_0:?}")]
    InvalidHostId(#[error(not(source))] String),
    /// The path could not be made absolute.
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Host state doesn't change between attempts in any useful timeframe.
        false
    }
}
