//! CLI Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("unable to load configuration")]
    Config,
    #[display("unable to determine host identity")]
    HostIdentity,
    #[display("unable to scan {}", _0.display())]
    Scan(#[error(not(source))] PathBuf),
    #[display("unable to read {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    #[display("unable to build chunk from {}", _0.display())]
    Pack(#[error(not(source))] PathBuf),
    #[display("unable to write chunk into {}", _0.display())]
    Store(#[error(not(source))] PathBuf),
}
