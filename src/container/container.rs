//! Container struct definition
//!
//! A Container is a zip archive held entirely in memory. Nested containers
//! are opened from bytes fetched out of their parent, never from disk.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{NestError, Result};
use crate::loader::ResourceLoader;

type Archive = ZipArchive<Cursor<Arc<[u8]>>>;

/// An in-memory packaged container
#[derive(Clone)]
pub struct Container {
    /// Display name (a file path or a virtual URI)
    name: String,
    archive: Archive,
}

impl Container {
    /// Read the container at `path` into memory
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(path.display().to_string(), bytes)
    }

    /// Open a container from its raw bytes
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let data: Arc<[u8]> = Arc::from(bytes);
        let archive = ZipArchive::new(Cursor::new(data)).map_err(|source| NestError::Archive {
            path: PathBuf::from(&name),
            source,
        })?;

        debug!("opened container {} ({} entries)", name, archive.len());
        Ok(Self { name, archive })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of entries, directories included
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Read the entry named `entry`, or `None` if the archive has no such entry
    pub fn entry(&self, entry: &str) -> Result<Option<Vec<u8>>> {
        let mut archive = self.archive.clone();
        let mut file = match archive.by_name(entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(source) => {
                return Err(NestError::Archive {
                    path: PathBuf::from(format!("{}!/{}", self.name, entry)),
                    source,
                })
            }
        };

        // declared sizes are not trusted for allocation
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }
}

impl ResourceLoader for Container {
    fn fetch(&self, path: &str) -> Result<Option<Vec<u8>>> {
        self.entry(path)
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name)
            .field("entries", &self.archive.len())
            .finish()
    }
}
