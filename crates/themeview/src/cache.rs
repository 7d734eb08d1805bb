//! Render-once cache for data-invariant fragments.
//!
//! Entries are keyed by the resolved template path and nothing else: not the
//! data, not the active theme, not the layout. A caller asking for reuse is
//! asserting that the fragment renders the same no matter what it is given.
//! Entries live until explicitly removed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Rendered output indexed by the template file that produced it.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: HashMap<PathBuf, String>,
    hits: u64,
    misses: u64,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored output for `path`, counting a hit or a miss.
    ///
    /// An entry holding an empty string is still a hit.
    pub fn lookup(&mut self, path: &Path) -> Option<String> {
        match self.entries.get(path) {
            Some(output) => {
                self.hits += 1;
                Some(output.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Stores output for `path`, replacing any previous entry.
    pub fn store(&mut self, path: impl Into<PathBuf>, output: impl Into<String>) {
        self.entries.insert(path.into(), output.into());
    }

    /// Drops the entry for `path`, returning it if present.
    pub fn remove(&mut self, path: &Path) -> Option<String> {
        self.entries.remove(path)
    }

    /// Whether output is stored for `path`. Does not touch the counters.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry. Hit and miss counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot of the hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// Counters describing cache usage since the registry was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}
