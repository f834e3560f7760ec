//! Fixed-width content digests.
//!
//! Every identifier and fingerprint in pistore is a 16-byte [`Digest`]: chunk
//! IDs, payload fingerprints, host identifiers and POIDs. Digests are the
//! first 16 bytes of BLAKE3's extendable output, so a single hash function
//! backs the whole system.
//!
//! ```
//! use pistore_digest::{Digest, Hasher};
//!
//! let whole = Digest::of(b"hello world");
//! let pieces = Hasher::new().update(b"hello ").update(b"world").finalize();
//! assert_eq!(whole, pieces);
//! assert_eq!(whole.to_hex().len(), 32);
//! ```

pub mod error;
mod hasher;

pub use crate::hasher::Hasher;
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Width of every digest, in bytes.
pub const DIGEST_LEN: usize = 16;

/// A 16-byte content digest.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Digest a single byte slice.
    #[must_use]
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        Hasher::new().update(bytes.as_ref()).finalize()
    }

    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex, always 32 characters.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(text: &str) -> Result<Self> {
        let bytes = hex::decode(text).or_raise(|| ErrorKind::InvalidHex(text.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = Error;
    fn try_from(value: &[u8]) -> Result<Self> {
        match <[u8; DIGEST_LEN]>::try_from(value) {
            Ok(bytes) => Ok(Self(bytes)),
            Err(_) => exn::bail!(ErrorKind::InvalidLength(value.len())),
        }
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Digest {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.to_hex())
    }
}

impl Debug for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(|e| D::Error::custom(&*e))
    }
}
