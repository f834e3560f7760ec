//! Compression Operations

use crate::Compression;
use crate::error::{ErrorKind, Result};
use bzip2::{Compression as BzCompression, read::BzDecoder, write::BzEncoder};
use exn::ResultExt;
use flate2::{Compression as GzCompression, read::GzDecoder, write::GzEncoder};
use std::io::{Read, Write};
use tracing::instrument;

// Highest level for both formats: chunks are written once and kept for a long
// time, so storage wins over speed.
const BZIP2_LEVEL: BzCompression = BzCompression::best();
const GZIP_LEVEL: GzCompression = GzCompression::best();

impl Compression {
    /// Compress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use pistore_compress::Compression;
    ///
    /// let data = b"Hello, world!";
    /// let compressed = Compression::Gzip.compress(data).unwrap();
    /// assert!(compressed.starts_with(&[0x1F, 0x8B]));
    /// ```
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.compress_into(input, &mut output)?;
        Ok(output)
    }

    /// Decompress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pistore_compress::Compression;
    ///
    /// let original = b"Hello, world!";
    /// let compressed = Compression::Gzip.compress(original).unwrap();
    /// assert_ne!(compressed, original);
    /// let decompressed = Compression::Gzip.decompress(&compressed).unwrap();
    /// assert_eq!(decompressed, original);
    /// ```
    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.decompress_into(input, &mut output)?;
        Ok(output)
    }

    /// Compress `input`, appending to `output`. Returns the number of bytes appended.
    #[instrument(skip(input, output), fields(
        format = %self,
        input_size = input.len(),
        output_size
    ))]
    pub fn compress_into(&self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        let start = output.len();
        match self {
            Compression::None => output.extend_from_slice(input),
            Compression::Bzip2 => {
                let mut encoder = BzEncoder::new(&mut *output, BZIP2_LEVEL);
                encoder.write_all(input).or_raise(|| ErrorKind::Io)?;
                encoder.finish().or_raise(|| ErrorKind::Io)?;
            },
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(&mut *output, GZIP_LEVEL);
                encoder.write_all(input).or_raise(|| ErrorKind::Io)?;
                encoder.finish().or_raise(|| ErrorKind::Io)?;
            },
        }
        let size = output.len() - start;
        tracing::Span::current().record("output_size", size);
        Ok(size)
    }

    /// Decompress `input`, appending to `output`. Returns the number of bytes appended.
    pub fn decompress_into(&self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        self.decompress_into_limited(input, output, u64::MAX)
    }

    /// Decompress a byte slice, refusing to produce more than `limit` bytes.
    ///
    /// Decoding stops as soon as the limit is crossed, so a tiny input that
    /// inflates to gigabytes costs at most `limit + 1` bytes of memory.
    pub fn decompress_limited(&self, input: &[u8], limit: u64) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.decompress_into_limited(input, &mut output, limit)?;
        Ok(output)
    }

    #[instrument(skip(input, output), fields(
        format = %self,
        input_size = input.len(),
        output_size
    ))]
    fn decompress_into_limited(&self, input: &[u8], output: &mut Vec<u8>, limit: u64) -> Result<usize> {
        let size = match self {
            Compression::None => read_limited(input, output, limit)?,
            Compression::Bzip2 => read_limited(BzDecoder::new(input), output, limit)?,
            Compression::Gzip => read_limited(GzDecoder::new(input), output, limit)?,
        };
        tracing::Span::current().record("output_size", size);
        Ok(size)
    }
}

fn read_limited(reader: impl Read, output: &mut Vec<u8>, limit: u64) -> Result<usize> {
    let start = output.len();
    reader.take(limit.saturating_add(1)).read_to_end(output).or_raise(|| ErrorKind::InvalidData)?;
    let size = output.len() - start;
    if size as u64 > limit {
        output.truncate(start);
        exn::bail!(ErrorKind::LimitExceeded(limit));
    }
    Ok(size)
}
