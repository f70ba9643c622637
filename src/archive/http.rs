use std::{ops::Range, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use reqwest::{blocking::Client, header::RANGE, redirect::Policy, StatusCode};

use super::{ArchiveHeader, MetadataFetcher, HEADER_LEN};

/// Remote archive reader using HTTP range requests, so only the header and
/// the metadata section are transferred.
pub struct HttpArchive {
    client: Client,
}

impl HttpArchive {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("fieldmap/", env!("CARGO_PKG_VERSION")))
            .redirect(Policy::limited(10))
            .timeout(Duration::from_secs(30))
            .build()
            .context("[archive::http] Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Read the bytes in `range`.
    fn read_range(&self, url: &str, range: Range<u64>) -> Result<Vec<u8>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let resp = self.client
            .get(url)
            .header(RANGE, format!("bytes={}-{}", range.start, range.end - 1))
            .send()
            .with_context(|| format!("GET {url}"))?;

        match resp.status() {
            StatusCode::PARTIAL_CONTENT => {
                let body = resp.bytes().with_context(|| format!("read body of {url}"))?;
                Ok(body.to_vec())
            }
            // Server ignored the range; cut the window out of the full body.
            StatusCode::OK => {
                let body = resp.bytes().with_context(|| format!("read body of {url}"))?;
                let window = usize::try_from(range.start).ok()
                    .zip(usize::try_from(range.end).ok())
                    .and_then(|(start, end)| body.get(start..end));
                window
                    .map(<[u8]>::to_vec)
                    .ok_or_else(|| anyhow!("[archive::http] {url} is shorter than {} bytes", range.end))
            }
            s => bail!("[archive::http] Unexpected status {s} reading {url}"),
        }
    }

    pub fn header(&self, url: &str) -> Result<ArchiveHeader> {
        let bytes = self.read_range(url, 0..HEADER_LEN)?;
        ArchiveHeader::parse(&bytes).with_context(|| format!("[archive::http] Bad header in {url}"))
    }
}

impl MetadataFetcher for HttpArchive {
    fn fetch_metadata(&self, url: &str) -> Result<serde_json::Value> {
        let header = self.header(url)?;
        let range = header.metadata_range().with_context(|| format!("[archive::http] Bad header in {url}"))?;
        let raw = self.read_range(url, range)?;
        tracing::debug!(url, bytes = raw.len(), "fetched archive metadata");
        header.decode_metadata(&raw)
    }
}
