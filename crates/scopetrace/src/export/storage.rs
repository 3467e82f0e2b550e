//! Trace storage backends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Result, TraceError};

/// Byte sink for encoded traces.
pub trait TraceStorage {
    /// Write `bytes` to `path`, replacing previous content.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Read back the content stored at `path`.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Storage on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl TraceStorage for FsStorage {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        std::fs::write(path, bytes).map_err(|source| TraceError::Storage {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|source| TraceError::Storage {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// In-memory storage keyed by path.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    /// Check if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl TraceStorage for MemoryStorage {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.files.lock().insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| TraceError::Storage {
                path: path.to_path_buf(),
                source: std::io::ErrorKind::NotFound.into(),
            })
    }
}
