//! Structured text form.
//!
//! One JSON object per chunk, using the same field set as the binary layout.
//! Digests and the POID are hex strings, the payload is standard base64. The
//! stored `chunk_id` is kept as-is on decode so that tampering is still caught
//! by [`Chunk::verify_canonical_id`].

use crate::chunk::check_algorithm_name;
use crate::error::{Error, ErrorKind, Result};
use crate::{Chunk, ChunkId, Fingerprint};
use exn::ResultExt;
use pistore_identity::Poid;
use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Cow;

#[derive(Serialize, Deserialize)]
struct ChunkRecord<'a> {
    chunk_id: ChunkId,
    birth_version: u64,
    poid: Poid,
    offset: u64,
    timestamp: i64,
    original_size: u64,
    compressed_size: u64,
    original_data_fp: Fingerprint,
    compressed_data_fp: Fingerprint,
    compression_alg: Cow<'a, str>,
    #[serde(with = "base64_data")]
    data: Cow<'a, [u8]>,
}

impl<'a> From<&'a Chunk> for ChunkRecord<'a> {
    fn from(chunk: &'a Chunk) -> Self {
        Self {
            chunk_id: chunk.id,
            birth_version: chunk.birth_version,
            poid: chunk.poid,
            offset: chunk.offset,
            timestamp: chunk.timestamp,
            original_size: chunk.original_size,
            compressed_size: chunk.compressed_size,
            original_data_fp: chunk.original_fp,
            compressed_data_fp: chunk.compressed_fp,
            compression_alg: Cow::Borrowed(&chunk.algorithm),
            data: Cow::Borrowed(&chunk.data),
        }
    }
}

impl TryFrom<ChunkRecord<'_>> for Chunk {
    type Error = Error;
    fn try_from(record: ChunkRecord<'_>) -> Result<Self> {
        if record.compressed_size != record.data.len() as u64 {
            exn::bail!(ErrorKind::Format(format!(
                "compressed_size is {} but data holds {} bytes",
                record.compressed_size,
                record.data.len()
            )));
        }
        if let Err(problem) = check_algorithm_name(&record.compression_alg) {
            exn::bail!(ErrorKind::Format(problem));
        }
        Ok(Self {
            id: record.chunk_id,
            birth_version: record.birth_version,
            poid: record.poid,
            offset: record.offset,
            timestamp: record.timestamp,
            original_size: record.original_size,
            compressed_size: record.compressed_size,
            original_fp: record.original_data_fp,
            compressed_fp: record.compressed_data_fp,
            algorithm: record.compression_alg.into_owned(),
            data: record.data.into_owned(),
        })
    }
}

impl Serialize for Chunk {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ChunkRecord::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Chunk {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = ChunkRecord::deserialize(deserializer)?;
        Chunk::try_from(record).map_err(|e| D::Error::custom(&*e))
    }
}

impl Chunk {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).or_raise(|| ErrorKind::format("unable to encode chunk as JSON"))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).or_raise(|| ErrorKind::format("unable to encode chunk as JSON"))
    }

    /// Decode the JSON form. Like [`deserialize`](Self::deserialize), this
    /// checks structure only.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).or_raise(|| ErrorKind::format("invalid chunk JSON"))
    }
}

mod base64_data {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use serde::de::{Deserializer, Error as _};
    use serde::{Deserialize, Serializer};
    use std::borrow::Cow;

    pub fn serialize<S: Serializer>(data: &impl AsRef<[u8]>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(data.as_ref()))
    }

    pub fn deserialize<'de, 'a, D: Deserializer<'de>>(deserializer: D) -> Result<Cow<'a, [u8]>, D::Error> {
        let text = String::deserialize(deserializer)?;
        BASE64.decode(text).map(Cow::Owned).map_err(D::Error::custom)
    }
}
