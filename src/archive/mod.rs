//! Reading embedded schema metadata out of PMTiles archives.

mod header;
mod memory;
#[cfg(feature = "download")]
mod http;
#[cfg(feature = "pmtiles")]
mod file;

use anyhow::Result;

pub use header::{ArchiveHeader, Compression, TileType, HEADER_LEN, MAX_METADATA_LEN};
pub use memory::MemArchive;
#[cfg(feature = "download")]
pub use http::HttpArchive;
#[cfg(feature = "pmtiles")]
pub use file::FileArchive;

/// Fetches the embedded JSON metadata of a vector tile archive.
pub trait MetadataFetcher {
    fn fetch_metadata(&self, url: &str) -> Result<serde_json::Value>;
}

impl<F: MetadataFetcher + ?Sized> MetadataFetcher for &F {
    fn fetch_metadata(&self, url: &str) -> Result<serde_json::Value> {
        (**self).fetch_metadata(url)
    }
}

impl<F: MetadataFetcher + ?Sized> MetadataFetcher for Box<F> {
    fn fetch_metadata(&self, url: &str) -> Result<serde_json::Value> {
        (**self).fetch_metadata(url)
    }
}
