//! Blob stores: where imported image bytes come from.
//!
//! A blob store hands out the complete contents of a blob by id. Import
//! reads one blob in a single call and never keeps a handle open.

use crate::error::{PicError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

pub trait BlobStore {
    /// Read the complete contents of blob `id`.
    fn read_all(&self, id: &str) -> Result<Vec<u8>>;
}

/// Blobs as files in one directory; the id is the file name.
#[derive(Debug, Clone)]
pub struct DirBlobStore {
    root: PathBuf,
}

impl DirBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BlobStore for DirBlobStore {
    fn read_all(&self, id: &str) -> Result<Vec<u8>> {
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            return Err(PicError::Blob(format!("invalid blob id '{id}'")));
        }
        let path = self.root.join(id);
        fs::read(&path).map_err(|e| PicError::Blob(format!("{}: {e}", path.display())))
    }
}

/// In-memory blobs keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, bytes: Vec<u8>) {
        self.blobs.insert(id.into(), bytes);
    }
}

impl BlobStore for MemoryBlobStore {
    fn read_all(&self, id: &str) -> Result<Vec<u8>> {
        self.blobs
            .get(id)
            .cloned()
            .ok_or_else(|| PicError::Blob(format!("no blob with id '{id}'")))
    }
}
