//! On-disk persistence of single chunks.
//!
//! A chunk lives in `<dir>/<chunk id hex>.chunk` holding exactly its binary
//! serialization. Writes go through a temporary file in the same directory and
//! are renamed into place, so readers never observe a partial chunk.

use crate::Chunk;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::instrument;

/// File extension used for dumped chunks.
pub const CHUNK_FILE_EXTENSION: &str = "chunk";

fn map_io_error(err: std::io::Error, path: &Path) -> ErrorKind {
    match err.kind() {
        IoErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
        _ => ErrorKind::Io(path.to_path_buf()),
    }
}

impl Chunk {
    /// File name this chunk is stored under.
    pub fn file_name(&self) -> String {
        format!("{}.{CHUNK_FILE_EXTENSION}", self.id.to_hex())
    }

    /// Write the serialized chunk into `dir`, returning the path written.
    ///
    /// Dumping the same chunk twice overwrites the file with identical bytes.
    #[instrument(skip(self, dir), fields(chunk_id = %self.id, dir = %dir.as_ref().display()))]
    pub fn dump_to_file(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let target = dir.join(self.file_name());
        let mut staging = NamedTempFile::new_in(dir).map_err(|e| map_io_error(e, dir))?;
        staging.write_all(&self.serialize()).or_raise(|| ErrorKind::Io(staging.path().to_path_buf()))?;
        staging.as_file().sync_all().or_raise(|| ErrorKind::Io(staging.path().to_path_buf()))?;
        staging.persist(&target).or_raise(|| ErrorKind::Io(target.clone()))?;
        tracing::debug!(path = %target.display(), "chunk written");
        Ok(target)
    }

    /// Replace `self` with the chunk stored at `path`.
    ///
    /// The file's contents are parsed but not verified. On error `self` is left
    /// untouched.
    pub fn read_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        *self = Self::load(path)?;
        Ok(())
    }

    /// Read and parse the chunk stored at `path`.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path).map_err(|e| map_io_error(e, path))?;
        Self::deserialize(&raw)
    }
}
