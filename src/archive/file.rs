use std::{fs::File, io::Read, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use pmtiles2::PMTiles;

use super::{ArchiveHeader, MetadataFetcher, HEADER_LEN};

/// Archives on the local filesystem. URLs are paths, optionally prefixed
/// with `file://`, resolved against `root`.
#[derive(Debug, Clone, Default)]
pub struct FileArchive {
    root: PathBuf,
}

impl FileArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    fn open(&self, url: &str) -> Result<File> {
        let rel = url.strip_prefix("file://").unwrap_or(url);
        let path = self.root.join(Path::new(rel));
        File::open(&path).with_context(|| format!("[archive::file] Failed to open {}", path.display()))
    }

    /// Read only the fixed-size header.
    pub fn header(&self, url: &str) -> Result<ArchiveHeader> {
        let mut bytes = [0u8; HEADER_LEN as usize];
        self.open(url)?.read_exact(&mut bytes)
            .with_context(|| format!("[archive::file] {url} is shorter than a PMTiles header"))?;
        ArchiveHeader::parse(&bytes)
    }
}

impl MetadataFetcher for FileArchive {
    fn fetch_metadata(&self, url: &str) -> Result<serde_json::Value> {
        // An empty tile id range skips the leaf directories.
        let pmtiles = PMTiles::from_reader_partially(self.open(url)?, 0..0)
            .with_context(|| format!("[archive::file] Failed to read PMTiles file {url}"))?;
        tracing::debug!(url, keys = pmtiles.meta_data.len(), "read archive metadata");
        serde_json::to_value(&pmtiles.meta_data)
            .context("[archive::file] Failed to convert archive metadata")
    }
}
