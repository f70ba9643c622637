use std::{cell::Cell, collections::HashMap};

use anyhow::{anyhow, Result};

use super::MetadataFetcher;

/// Metadata held in memory, keyed by archive URL.
/// Unknown URLs fail like an unreachable archive would.
#[derive(Debug, Default)]
pub struct MemArchive {
    metadata: HashMap<String, serde_json::Value>,
    fetches: Cell<usize>,
}

impl MemArchive {
    pub fn new(metadata: HashMap<String, serde_json::Value>) -> Self {
        Self { metadata, fetches: Cell::new(0) }
    }

    pub fn insert(&mut self, url: impl Into<String>, metadata: serde_json::Value) {
        self.metadata.insert(url.into(), metadata);
    }

    /// Number of fetch attempts so far, failed ones included.
    pub fn fetch_count(&self) -> usize { self.fetches.get() }
}

impl MetadataFetcher for MemArchive {
    fn fetch_metadata(&self, url: &str) -> Result<serde_json::Value> {
        self.fetches.set(self.fetches.get() + 1);
        self.metadata.get(url).cloned()
            .ok_or_else(|| anyhow!("[archive::memory] No archive at {url}"))
    }
}
