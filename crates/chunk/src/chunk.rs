use crate::error::{ErrorKind, Result};
use crate::{ChunkId, Fingerprint};
use pistore_compress::Compression;
use pistore_digest::Digest;
use pistore_identity::Poid;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use time::UtcDateTime;
use tracing::instrument;

/// Scheme used by [`Chunk::from_original_data`].
pub const DEFAULT_COMPRESSION: Compression = Compression::Gzip;
/// Longest algorithm name the binary format can record.
pub const MAX_ALGORITHM_LEN: usize = u8::MAX as usize;

/// Provenance shared by both construction paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Origin {
    /// Version of the owning object this chunk was produced for.
    pub birth_version: u64,
    /// Object the chunk was cut from.
    pub poid: Poid,
    /// Byte offset within the original, uncompressed object.
    pub offset: u64,
    /// Creation time, seconds since the Unix epoch.
    pub timestamp: i64,
}

impl Origin {
    /// Provenance stamped with the current time.
    #[must_use]
    pub fn new(birth_version: u64, poid: Poid, offset: u64) -> Self {
        Self {
            birth_version,
            poid,
            offset,
            timestamp: UtcDateTime::now().unix_timestamp(),
        }
    }

    /// Replace the creation time.
    #[must_use]
    pub fn at(self, timestamp: i64) -> Self {
        Self { timestamp, ..self }
    }
}

/// Payload that was compressed out-of-band, for [`Chunk::from_compressed_data`].
///
/// The declared sizes must match the slices exactly; they are checked rather
/// than trusted.
#[derive(Clone, Copy, Debug)]
pub struct Precompressed<'a> {
    pub original_size: u64,
    pub compressed_size: u64,
    pub original: &'a [u8],
    pub compressed: &'a [u8],
    /// Name of the scheme that produced `compressed`. Names this crate can't
    /// decompress are accepted, but [`Chunk::verify_original_data_checksum`]
    /// will fail for them.
    pub algorithm: &'a str,
}

/// One stored unit of compressed file data plus its provenance and integrity
/// metadata.
///
/// Chunks are immutable once built. The [`ChunkId`] is always computed from
/// the other fields (see [`codec`](crate::codec)), never supplied, and
/// `compressed_size` always equals the payload length.
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    pub(crate) id: ChunkId,
    pub(crate) birth_version: u64,
    pub(crate) poid: Poid,
    pub(crate) offset: u64,
    pub(crate) timestamp: i64,
    pub(crate) original_size: u64,
    pub(crate) compressed_size: u64,
    pub(crate) original_fp: Fingerprint,
    pub(crate) compressed_fp: Fingerprint,
    pub(crate) algorithm: String,
    pub(crate) data: Vec<u8>,
}

impl Chunk {
    /// Compress `data` with the [default scheme](DEFAULT_COMPRESSION) and build
    /// a chunk stamped with the current time.
    pub fn from_original_data(birth_version: u64, poid: Poid, offset: u64, data: &[u8]) -> Result<Self> {
        Self::compress(Origin::new(birth_version, poid, offset), DEFAULT_COMPRESSION, data)
    }

    /// Compress `data` with an explicit scheme and provenance.
    #[instrument(skip(origin, data), fields(
        poid = %origin.poid,
        offset = origin.offset,
        format = %compression,
        original_size = data.len()
    ))]
    pub fn compress(origin: Origin, compression: Compression, data: &[u8]) -> Result<Self> {
        let compressed = compression.compress(data).map_err(ErrorKind::compression)?;
        Ok(Self::assemble(
            origin,
            data.len() as u64,
            Digest::of(data),
            compression.as_str().to_string(),
            compressed,
        ))
    }

    /// Wrap data compressed elsewhere, stamped with the current time.
    ///
    /// Both fingerprints are computed from the supplied bytes. Declared sizes
    /// that disagree with the slices, or an unusable algorithm name, are
    /// rejected with [`InvalidInput`](ErrorKind::InvalidInput).
    pub fn from_compressed_data(
        birth_version: u64,
        poid: Poid,
        offset: u64,
        input: Precompressed<'_>,
    ) -> Result<Self> {
        Self::wrap(Origin::new(birth_version, poid, offset), input)
    }

    /// [`from_compressed_data`](Self::from_compressed_data) with explicit provenance.
    #[instrument(skip(origin, input), fields(
        poid = %origin.poid,
        offset = origin.offset,
        format = input.algorithm,
        original_size = input.original_size,
        compressed_size = input.compressed_size
    ))]
    pub fn wrap(origin: Origin, input: Precompressed<'_>) -> Result<Self> {
        check_size("original", input.original_size, input.original)?;
        check_size("compressed", input.compressed_size, input.compressed)?;
        if let Err(problem) = check_algorithm_name(input.algorithm) {
            exn::bail!(ErrorKind::InvalidInput(problem));
        }
        Ok(Self::assemble(
            origin,
            input.original_size,
            Digest::of(input.original),
            input.algorithm.to_string(),
            input.compressed.to_vec(),
        ))
    }

    fn assemble(origin: Origin, original_size: u64, original_fp: Fingerprint, algorithm: String, data: Vec<u8>) -> Self {
        let mut chunk = Self {
            id: ChunkId::default(),
            birth_version: origin.birth_version,
            poid: origin.poid,
            offset: origin.offset,
            timestamp: origin.timestamp,
            original_size,
            compressed_size: data.len() as u64,
            original_fp,
            compressed_fp: Digest::of(&data),
            algorithm,
            data,
        };
        chunk.id = chunk.compute_id();
        tracing::debug!(chunk_id = %chunk.id, compressed_size = chunk.compressed_size, "Assembled chunk");
        chunk
    }

    #[inline]
    pub fn id(&self) -> ChunkId {
        self.id
    }

    #[inline]
    pub fn birth_version(&self) -> u64 {
        self.birth_version
    }

    #[inline]
    pub fn poid(&self) -> Poid {
        self.poid
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Creation time, seconds since the Unix epoch.
    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[inline]
    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    #[inline]
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    #[inline]
    pub fn original_data_fp(&self) -> Fingerprint {
        self.original_fp
    }

    #[inline]
    pub fn compressed_data_fp(&self) -> Fingerprint {
        self.compressed_fp
    }

    /// Algorithm name exactly as recorded.
    #[inline]
    pub fn compression_alg(&self) -> &str {
        &self.algorithm
    }

    /// The recorded algorithm, if this crate supports it.
    pub fn compression(&self) -> Result<Compression> {
        self.algorithm.parse().map_err(ErrorKind::compression)
    }

    /// The compressed payload.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Restore the original payload.
    ///
    /// Output is capped at the recorded `original_size`. A payload that
    /// inflates past it fails with a compression error instead of being
    /// decoded in full.
    pub fn decompress(&self) -> Result<Vec<u8>> {
        self.compression()?.decompress_limited(&self.data, self.original_size).map_err(ErrorKind::compression)
    }

    /// Creation time, if representable.
    pub fn created_at(&self) -> Option<UtcDateTime> {
        UtcDateTime::from_unix_timestamp(self.timestamp).ok()
    }
}

impl Debug for Chunk {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        // Payloads can be megabytes; print the length instead.
        f.debug_struct("Chunk")
            .field("id", &self.id)
            .field("birth_version", &self.birth_version)
            .field("poid", &self.poid)
            .field("offset", &self.offset)
            .field("timestamp", &self.timestamp)
            .field("original_size", &self.original_size)
            .field("compressed_size", &self.compressed_size)
            .field("original_fp", &self.original_fp)
            .field("compressed_fp", &self.compressed_fp)
            .field("algorithm", &self.algorithm)
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .finish()
    }
}

fn check_size(field: &str, declared: u64, actual: &[u8]) -> Result<()> {
    if declared != actual.len() as u64 {
        exn::bail!(ErrorKind::InvalidInput(format!(
            "declared {field} size {declared} but {} bytes were supplied",
            actual.len()
        )));
    }
    Ok(())
}

/// Names must fit the single length byte of the binary layout.
pub(crate) fn check_algorithm_name(name: &str) -> std::result::Result<(), String> {
    match name.len() {
        0 => Err("empty compression algorithm name".to_string()),
        len if len > MAX_ALGORITHM_LEN => Err(format!(
            "compression algorithm name is {len} bytes, limit is {MAX_ALGORITHM_LEN}"
        )),
        _ => Ok(()),
    }
}
