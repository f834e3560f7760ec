//! Compression schemes for chunk payloads.
//!
//! A unified [`Compression`] enum provides:
//!
//! - **Name parsing** for the algorithm identifier stored inside every chunk
//!   ([`FromStr`](std::str::FromStr) and [`Compression::as_str`])
//! - **Format detection** from magic bytes ([`Compression::from_magic_bytes`])
//! - **In-memory** compression/decompression ([`Compression::compress`],
//!   [`Compression::decompress`])
//!
//! All compression uses the highest available level for each format,
//! prioritizing storage space over speed. Output is deterministic for a given
//! input and format, which chunk IDs rely on.

mod construct;
pub mod error;
mod ops;
mod util;

/// A supported compression format.
///
/// Defaults to [`None`](Self::None) (uncompressed).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed
    #[default]
    None,
    /// Bzip2 compression
    Bzip2,
    /// Gzip compression
    Gzip,
}
