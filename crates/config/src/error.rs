//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A provider supplied a value that doesn't fit the config schema. Fix the
    /// file or environment and try again.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
    /// An explicitly requested config file doesn't exist.
    #[display("config file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The platform has no notion of a per-user config directory (no home
    /// directory). Pass an explicit config file instead.
    #[display("no configuration directory available on this platform")]
    NoConfigDirectory,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
