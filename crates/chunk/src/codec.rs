//! Binary chunk layout.
//!
//! Every chunk serializes to a single self-describing byte string. All
//! integers are little-endian, and the layout is a wire-compatibility
//! contract: two implementations that disagree on a single byte can't read
//! each other's chunk files.
//!
//! | Offset    | Size | Field                                |
//! |-----------|------|--------------------------------------|
//! | 0         | 16   | ChunkID                              |
//! | 16        | 8    | BirthVersion (`u64`)                 |
//! | 24        | 16   | POID                                 |
//! | 40        | 8    | Offset (`u64`)                       |
//! | 48        | 8    | TimeStamp (`i64`, Unix seconds)      |
//! | 56        | 8    | OriginalSize (`u64`)                 |
//! | 64        | 8    | CompressedSize (`u64`)               |
//! | 72        | 16   | OriginalDataFP                       |
//! | 88        | 16   | CompressedDataFP                     |
//! | 104       | 1    | CompressionAlg length `n` (1..=255)  |
//! | 105       | `n`  | CompressionAlg (UTF-8)               |
//! | 105 + `n` | CompressedSize | Data                       |
//!
//! Everything from offset 16 onward is the *canonical encoding*, and the
//! ChunkID is the digest of it. That makes a serialized chunk self-verifying:
//! see [`verify_serialized`](crate::verify_serialized).

use crate::chunk::check_algorithm_name;
use crate::error::{ErrorKind, Result};
use crate::{Chunk, ChunkId};
use bytes::{Buf, BufMut};
use exn::ResultExt;
use pistore_digest::{DIGEST_LEN, Digest};
use pistore_identity::Poid;
use tracing::instrument;

/// Length of the ChunkID prefix.
pub const ID_LEN: usize = DIGEST_LEN;
/// Length of the fixed-width part, from the ChunkID up to and including the
/// algorithm-name length byte. Nothing shorter can be a chunk.
pub const HEADER_LEN: usize = ID_LEN + 8 + DIGEST_LEN + 8 + 8 + 8 + 8 + DIGEST_LEN + DIGEST_LEN + 1;

impl Chunk {
    /// Size of [`serialize`](Self::serialize)'s output.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.algorithm.len() + self.data.len()
    }

    /// Full binary form: the ChunkID followed by the canonical encoding.
    ///
    /// Deterministic; the same chunk always produces the same bytes.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.put_slice(self.id.as_bytes());
        self.encode_canonical(&mut buf);
        buf
    }

    /// Every field except the ChunkID, in layout order.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len() - ID_LEN);
        self.encode_canonical(&mut buf);
        buf
    }

    pub(crate) fn compute_id(&self) -> ChunkId {
        Digest::of(self.canonical_bytes())
    }

    fn encode_canonical(&self, buf: &mut impl BufMut) {
        buf.put_u64_le(self.birth_version);
        buf.put_slice(self.poid.as_bytes());
        buf.put_u64_le(self.offset);
        buf.put_i64_le(self.timestamp);
        buf.put_u64_le(self.original_size);
        buf.put_u64_le(self.compressed_size);
        buf.put_slice(self.original_fp.as_bytes());
        buf.put_slice(self.compressed_fp.as_bytes());
        // Constructors and decoders both cap names at MAX_ALGORITHM_LEN.
        buf.put_u8(self.algorithm.len() as u8);
        buf.put_slice(self.algorithm.as_bytes());
        buf.put_slice(&self.data);
    }

    /// Parse the binary form.
    ///
    /// Only the structure is checked. The ChunkID and fingerprints are *not*
    /// verified, so damaged chunks can still be inspected; use the `verify_*`
    /// predicates for that.
    #[instrument(skip(bytes), fields(size = bytes.len()))]
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            exn::bail!(ErrorKind::Format(format!(
                "{} bytes is shorter than the {HEADER_LEN}-byte header",
                bytes.len()
            )));
        }
        let mut buf = bytes;
        let id = get_digest(&mut buf);
        let birth_version = buf.get_u64_le();
        let poid = Poid::from(get_digest(&mut buf));
        let offset = buf.get_u64_le();
        let timestamp = buf.get_i64_le();
        let original_size = buf.get_u64_le();
        let compressed_size = buf.get_u64_le();
        let original_fp = get_digest(&mut buf);
        let compressed_fp = get_digest(&mut buf);

        let name_len = usize::from(buf.get_u8());
        if buf.remaining() < name_len {
            exn::bail!(ErrorKind::Format(format!(
                "compression algorithm name needs {name_len} bytes but only {} remain",
                buf.remaining()
            )));
        }
        let algorithm = std::str::from_utf8(&buf[..name_len])
            .or_raise(|| ErrorKind::format("compression algorithm name is not UTF-8"))?
            .to_string();
        if let Err(problem) = check_algorithm_name(&algorithm) {
            exn::bail!(ErrorKind::Format(problem));
        }
        buf.advance(name_len);

        let remaining = buf.remaining() as u64;
        if remaining < compressed_size {
            exn::bail!(ErrorKind::Format(format!(
                "declared {compressed_size} data bytes but only {remaining} remain"
            )));
        }
        if remaining > compressed_size {
            exn::bail!(ErrorKind::Format(format!(
                "{} unexpected bytes after {compressed_size} data bytes",
                remaining - compressed_size
            )));
        }

        Ok(Self {
            id,
            birth_version,
            poid,
            offset,
            timestamp,
            original_size,
            compressed_size,
            original_fp,
            compressed_fp,
            algorithm,
            data: buf.to_vec(),
        })
    }
}

impl TryFrom<&[u8]> for Chunk {
    type Error = crate::error::Error;
    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::deserialize(bytes)
    }
}

/// Caller guarantees at least [`DIGEST_LEN`] bytes remain.
fn get_digest(buf: &mut &[u8]) -> Digest {
    let mut out = [0u8; DIGEST_LEN];
    buf.copy_to_slice(&mut out);
    Digest::from_bytes(out)
}
