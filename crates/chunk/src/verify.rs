//! Integrity checks.
//!
//! All checks are pure predicates: they never error, never mutate, and give
//! the same answer every time. A check that can't even run (undecodable
//! payload, buffer too short) reports `false`, since that is itself evidence
//! of damage.

use crate::Chunk;
use crate::codec::ID_LEN;
use pistore_compress::Compression;
use pistore_digest::Digest;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Check a serialized chunk's stored ChunkID against the digest of the rest
/// of the buffer, without parsing it.
#[must_use]
pub fn verify_serialized(raw: &[u8]) -> bool {
    match raw.split_first_chunk::<ID_LEN>() {
        Some((stored, rest)) => Digest::of(rest).as_bytes() == stored,
        None => false,
    }
}

impl Chunk {
    /// Does the fingerprint of the compressed payload match?
    #[must_use]
    pub fn verify_compressed_data_checksum(&self) -> bool {
        Digest::of(&self.data) == self.compressed_fp
    }

    /// Decompress the payload and compare its fingerprint with the original's.
    ///
    /// Unknown algorithms and decompression failures count as a mismatch.
    #[must_use]
    pub fn verify_original_data_checksum(&self) -> bool {
        match self.decompress() {
            Ok(original) => Digest::of(&original) == self.original_fp,
            Err(err) => {
                let kind = &*err;
                tracing::debug!(
                    chunk_id = %self.id,
                    recorded = %self.algorithm,
                    detected = %self.detected_compression(),
                    error = %kind,
                    "Payload failed to decompress"
                );
                false
            },
        }
    }

    /// Scheme the payload's leading bytes look like, regardless of what the
    /// header records. [`Compression::None`] means no known magic bytes.
    ///
    /// Diagnostic only: helps tell a mislabelled payload from a corrupt one.
    #[must_use]
    pub fn detected_compression(&self) -> Compression {
        Compression::from_magic_bytes(&self.data)
    }

    /// Does the digest of `raw` minus its first 16 bytes match this chunk's ID?
    ///
    /// `raw` is normally the buffer this chunk was deserialized from.
    #[must_use]
    pub fn verify_chunk_id(&self, raw: &[u8]) -> bool {
        match raw.get(ID_LEN..) {
            Some(rest) => Digest::of(rest) == self.id,
            None => false,
        }
    }

    /// Recompute the ChunkID from the in-memory fields.
    ///
    /// For chunks that didn't come from a byte buffer, e.g. ones decoded from
    /// JSON.
    #[must_use]
    pub fn verify_canonical_id(&self) -> bool {
        self.compute_id() == self.id
    }

    /// Run every applicable check. Without `raw`, the ChunkID is checked
    /// against the re-encoded fields instead.
    #[must_use]
    pub fn verify(&self, raw: Option<&[u8]>) -> Verification {
        Verification {
            chunk_id: match raw {
                Some(raw) => self.verify_chunk_id(raw),
                None => self.verify_canonical_id(),
            },
            compressed_data: self.verify_compressed_data_checksum(),
            original_data: self.verify_original_data_checksum(),
        }
    }
}

/// Outcome of [`Chunk::verify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verification {
    pub chunk_id: bool,
    pub compressed_data: bool,
    pub original_data: bool,
}

impl Verification {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.chunk_id && self.compressed_data && self.original_data
    }
}

impl Display for Verification {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mark = |ok: bool| if ok { "ok" } else { "FAILED" };
        write!(
            f,
            "chunk id: {}, compressed data: {}, original data: {}",
            mark(self.chunk_id),
            mark(self.compressed_data),
            mark(self.original_data)
        )
    }
}
