//! Physical copy seam.
//!
//! The engine decides *where* bytes go; how they move is behind this
//! trait so tests can inject failures and future backends (e.g. remote
//! storage) can slot in.

use crate::error::CopyError;
use std::fs;
use std::path::Path;

/// Copies file bytes verbatim from a source path to a destination path
pub trait FileCopier: Send + Sync {
    /// Copy the file, returning the number of bytes written
    fn copy(&self, source: &Path, dest: &Path) -> Result<u64, CopyError>;
}

/// Default copier backed by `std::fs::copy`
pub struct FsCopier;

impl FileCopier for FsCopier {
    fn copy(&self, source: &Path, dest: &Path) -> Result<u64, CopyError> {
        fs::copy(source, dest).map_err(|e| CopyError::Io {
            source_path: source.to_path_buf(),
            dest_path: dest.to_path_buf(),
            source: e,
        })
    }
}
