//! On-disk cache of built frame indexes.
//!
//! Entries are keyed by file name and size in bytes. Content changes that keep
//! the size are not detected.

use cutmark_core::{CutmarkError, Result};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::index::TimestampIndex;

/// Cache key: base file name plus file size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    basename: String,
    size: u64,
}

impl CacheKey {
    pub fn new(basename: impl Into<String>, size: u64) -> Self {
        Self {
            basename: basename.into(),
            size,
        }
    }

    /// Key for an existing media file.
    pub fn for_file(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            CutmarkError::NotFound(format!("Cannot stat {}: {}", path.display(), e))
        })?;
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CutmarkError::InvalidParameter(format!("Not a file path: {}", path.display()))
            })?;
        Ok(Self::new(basename, metadata.len()))
    }

    /// Cache entry file name, `<basename>.<size>.frames`.
    pub fn file_name(&self) -> String {
        format!("{}.{}.frames", self.basename, self.size)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.basename, self.size)
    }
}

/// Directory holding one JSON file per cached index.
#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: PathBuf,
}

impl IndexCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<user cache dir>/cutmark`, or the temp dir when there is none.
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("cutmark")
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Read an entry. `Ok(None)` when absent, `Err(Cache)` when malformed.
    pub fn read(&self, key: &CacheKey) -> Result<Option<TimestampIndex>> {
        let path = self.entry_path(key);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CutmarkError::Cache(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let index: TimestampIndex = serde_json::from_slice(&data).map_err(|e| {
            CutmarkError::Cache(format!("Malformed cache entry {}: {}", path.display(), e))
        })?;
        if index.is_empty() {
            return Err(CutmarkError::Cache(format!(
                "Empty cache entry {}",
                path.display()
            )));
        }
        Ok(Some(index))
    }

    /// Read an entry, treating any read error as a miss.
    pub fn load(&self, key: &CacheKey) -> Option<TimestampIndex> {
        match self.read(key) {
            Ok(index) => index,
            Err(e) => {
                warn!("{}, rebuilding", e);
                None
            }
        }
    }

    /// Persist an entry.
    ///
    /// Written to a temporary file first and renamed into place, so readers
    /// never see a partial entry.
    pub fn store(&self, key: &CacheKey, index: &TimestampIndex) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_vec(index)
            .map_err(|e| CutmarkError::Serialization(format!("Failed to encode index: {e}")))?;

        let path = self.entry_path(key);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&data)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!("Stored frame index at {}", path.display());
        Ok(())
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}
