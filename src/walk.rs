//! Depth-first filesystem walk.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs;
use std::path::{Path, PathBuf};

/// Visit `root` and everything beneath it in pre-order, with siblings in
/// lexical order. Symbolic links are reported but never followed.
pub fn walk(root: &Path, mut visit: impl FnMut(&Path) -> Result<()>) -> Result<()> {
    let mut stack = vec![root.to_path_buf()];
    while let Some(current) = stack.pop() {
        let metadata = fs::symlink_metadata(&current).or_raise(|| ErrorKind::Scan(current.clone()))?;
        visit(&current)?;
        if !metadata.is_dir() {
            continue;
        }
        let mut children = fs::read_dir(&current)
            .and_then(|entries| entries.map(|entry| entry.map(|e| e.path())).collect::<std::io::Result<Vec<PathBuf>>>())
            .or_raise(|| ErrorKind::Scan(current.clone()))?;
        children.sort_unstable();
        // Reversed so the smallest name is popped first.
        stack.extend(children.into_iter().rev());
    }
    Ok(())
}
