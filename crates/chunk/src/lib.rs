//! Content-addressed backup chunks.
//!
//! A [`Chunk`] is one already-cut slice of a source object: its compressed
//! payload, where it came from (POID, offset, birth version), fingerprints of
//! both the original and compressed bytes, and a [`ChunkId`] that is the digest
//! of everything else. Deciding where to cut an object into chunks is not this
//! crate's concern.
//!
//! - **Construction**: [`Chunk::from_original_data`] compresses raw bytes,
//!   [`Chunk::from_compressed_data`] wraps bytes compressed elsewhere.
//! - **Binary form**: [`Chunk::serialize`] / [`Chunk::deserialize`], a fixed
//!   little-endian layout (see [`codec`]).
//! - **Verification**: boolean predicates that never error, plus
//!   [`verify_serialized`] for checking raw bytes before parsing.
//! - **JSON form** for debugging and interchange ([`Chunk::to_json`]).
//! - **Persistence** under content-derived file names ([`Chunk::dump_to_file`]).
//!
//! ```
//! use pistore_chunk::Chunk;
//! use pistore_identity::Poid;
//!
//! let chunk = Chunk::from_original_data(1, Poid::default(), 0, b"some file contents").unwrap();
//! let bytes = chunk.serialize();
//! let parsed = Chunk::deserialize(&bytes).unwrap();
//! assert_eq!(parsed, chunk);
//! assert!(parsed.verify_chunk_id(&bytes));
//! assert!(parsed.verify_original_data_checksum());
//! ```

mod chunk;
pub mod codec;
pub mod error;
mod file;
mod json;
mod verify;

pub use crate::chunk::{Chunk, DEFAULT_COMPRESSION, MAX_ALGORITHM_LEN, Origin, Precompressed};
pub use crate::file::CHUNK_FILE_EXTENSION;
pub use crate::verify::{Verification, verify_serialized};
pub use pistore_compress::Compression;
pub use pistore_digest::Digest;
pub use pistore_identity::Poid;

/// Content-derived identity of a chunk.
pub type ChunkId = Digest;
/// Digest of a payload, compressed or not.
pub type Fingerprint = Digest;
