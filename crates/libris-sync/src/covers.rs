use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Permanent storage of cover images, one file per book and slot.
pub trait CoverStore: Send + Sync {
    /// No image, or a zero-length one.
    fn is_blank(&self, book_id: i64, index: usize) -> bool;

    /// Moves `temp` into the slot. Without `overwrite` a non-blank image
    /// already in place is kept and `temp` is discarded.
    ///
    /// Returns whether the slot now holds `temp`'s content.
    fn persist(&self, book_id: i64, index: usize, temp: &Path, overwrite: bool) -> Result<bool>;
}

/// Covers stored as `<root>/<book id>_<index>.jpg`.
#[derive(Debug, Clone)]
pub struct CoverDirectory {
    root: PathBuf,
}

impl CoverDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, book_id: i64, index: usize) -> PathBuf {
        self.root.join(format!("{book_id}_{index}.jpg"))
    }
}

impl CoverStore for CoverDirectory {
    fn is_blank(&self, book_id: i64, index: usize) -> bool {
        !fs::metadata(self.path_for(book_id, index)).is_ok_and(|meta| meta.len() > 0)
    }

    fn persist(&self, book_id: i64, index: usize, temp: &Path, overwrite: bool) -> Result<bool> {
        let target = self.path_for(book_id, index);

        if !overwrite && !self.is_blank(book_id, index) {
            debug!(book_id, index, "cover already present, discarding download");
            fs::remove_file(temp)?;
            return Ok(false);
        }

        fs::create_dir_all(&self.root)?;
        if fs::rename(temp, &target).is_err() {
            // rename fails across file systems
            fs::copy(temp, &target)?;
            fs::remove_file(temp)?;
        }
        debug!(book_id, index, path = %target.display(), "cover stored");
        Ok(true)
    }
}
