//! Resource loading capability
//!
//! A resource loader hands out the bytes stored under a path. The outer
//! container, and every resolver built on top of it, is one.

use std::collections::HashMap;

use crate::error::Result;

pub trait ResourceLoader: Send + Sync {
    /// Bytes stored at `path`, or `None` when nothing is stored there
    fn fetch(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Every resource named `path` visible to this loader, in the loader's
    /// own enumeration order.
    fn fetch_all(&self, path: &str) -> Result<Vec<Vec<u8>>> {
        Ok(self.fetch(path)?.into_iter().collect())
    }
}

/// Loader backed by a plain map, handy for hosts that assemble resources
/// in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any previous content at `path`
    pub fn with_entry(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(path.into(), bytes.into());
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(path.into(), bytes.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceLoader for MemoryLoader {
    fn fetch(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(path).cloned())
    }
}
