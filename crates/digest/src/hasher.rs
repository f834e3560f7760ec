use crate::{DIGEST_LEN, Digest};
use std::io::{Result as IoResult, Write};

/// Incremental digest builder.
///
/// Feeding the same bytes in any split produces the same [`Digest`] as
/// [`Digest::of`] over their concatenation.
#[derive(Clone, Debug, Default)]
pub struct Hasher(blake3::Hasher);

impl Hasher {
    #[must_use]
    pub fn new() -> Self {
        Self(blake3::Hasher::new())
    }

    pub fn update(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.update(bytes);
        self
    }

    /// Does not consume the hasher; more input may follow.
    #[must_use]
    pub fn finalize(&self) -> Digest {
        let mut out = [0u8; DIGEST_LEN];
        self.0.finalize_xof().fill(&mut out);
        Digest::from_bytes(out)
    }
}

impl Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
