//! PMTiles v3 fixed-size header.

use std::{io::{Cursor, Read}, ops::Range};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use serde::Serialize;

/// Magic bytes at the start of every PMTiles archive.
const MAGIC: &[u8] = b"PMTiles";
/// Only PMTiles version 3 is supported.
const VERSION: u8 = 3;
/// Size of the fixed header in bytes.
pub const HEADER_LEN: u64 = 127;
/// Largest metadata section we are willing to fetch.
pub const MAX_METADATA_LEN: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Unknown,
    None,
    Gzip,
    Brotli,
    Zstd,
}

impl Compression {
    fn from_byte(b: u8) -> Result<Self> {
        Ok(match b {
            0 => Compression::Unknown,
            1 => Compression::None,
            2 => Compression::Gzip,
            3 => Compression::Brotli,
            4 => Compression::Zstd,
            other => bail!("[archive::header] Unknown compression byte {other}"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TileType {
    Unknown,
    Mvt,
    Png,
    Jpeg,
    Webp,
    Avif,
}

impl TileType {
    fn from_byte(b: u8) -> Result<Self> {
        Ok(match b {
            0 => TileType::Unknown,
            1 => TileType::Mvt,
            2 => TileType::Png,
            3 => TileType::Jpeg,
            4 => TileType::Webp,
            5 => TileType::Avif,
            other => bail!("[archive::header] Unknown tile type byte {other}"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveHeader {
    pub root_dir_offset: u64,
    pub root_dir_length: u64,
    pub metadata_offset: u64,
    pub metadata_length: u64,
    pub leaf_dirs_offset: u64,
    pub leaf_dirs_length: u64,
    pub tile_data_offset: u64,
    pub tile_data_length: u64,
    pub addressed_tiles: u64,
    pub tile_entries: u64,
    pub tile_contents: u64,
    pub clustered: bool,
    pub internal_compression: Compression,
    pub tile_compression: Compression,
    pub tile_type: TileType,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// [min_lon, min_lat, max_lon, max_lat] in degrees.
    pub bounds: [f64; 4],
    pub center_zoom: u8,
    /// [lon, lat] in degrees.
    pub center: [f64; 2],
}

fn read_u8(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<u8> {
    let mut buf = [0u8; 1];
    cursor.read_exact(&mut buf)
        .with_context(|| format!("[archive::header] Failed to read {what}"))?;
    Ok(buf[0])
}

fn read_u64(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<u64> {
    let mut buf = [0u8; 8];
    cursor.read_exact(&mut buf)
        .with_context(|| format!("[archive::header] Failed to read {what}"))?;
    Ok(u64::from_le_bytes(buf))
}

/// Coordinates are stored as degrees * 10^7.
fn read_e7(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<f64> {
    let mut buf = [0u8; 4];
    cursor.read_exact(&mut buf)
        .with_context(|| format!("[archive::header] Failed to read {what}"))?;
    Ok(i32::from_le_bytes(buf) as f64 / 10_000_000.0)
}

impl ArchiveHeader {
    /// Parse the header from the first bytes of an archive.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN as usize {
            bail!("[archive::header] Need {HEADER_LEN} header bytes, got {}", bytes.len());
        }
        if &bytes[..MAGIC.len()] != MAGIC {
            bail!("[archive::header] Not a PMTiles archive (bad magic)");
        }

        let mut cursor = Cursor::new(&bytes[MAGIC.len()..HEADER_LEN as usize]);
        let version = read_u8(&mut cursor, "version")?;
        if version != VERSION {
            bail!("[archive::header] Unsupported PMTiles version {version} (expected {VERSION})");
        }

        Ok(Self {
            root_dir_offset: read_u64(&mut cursor, "root directory offset")?,
            root_dir_length: read_u64(&mut cursor, "root directory length")?,
            metadata_offset: read_u64(&mut cursor, "metadata offset")?,
            metadata_length: read_u64(&mut cursor, "metadata length")?,
            leaf_dirs_offset: read_u64(&mut cursor, "leaf directories offset")?,
            leaf_dirs_length: read_u64(&mut cursor, "leaf directories length")?,
            tile_data_offset: read_u64(&mut cursor, "tile data offset")?,
            tile_data_length: read_u64(&mut cursor, "tile data length")?,
            addressed_tiles: read_u64(&mut cursor, "addressed tile count")?,
            tile_entries: read_u64(&mut cursor, "tile entry count")?,
            tile_contents: read_u64(&mut cursor, "tile content count")?,
            clustered: read_u8(&mut cursor, "clustered flag")? == 1,
            internal_compression: Compression::from_byte(read_u8(&mut cursor, "internal compression")?)?,
            tile_compression: Compression::from_byte(read_u8(&mut cursor, "tile compression")?)?,
            tile_type: TileType::from_byte(read_u8(&mut cursor, "tile type")?)?,
            min_zoom: read_u8(&mut cursor, "min zoom")?,
            max_zoom: read_u8(&mut cursor, "max zoom")?,
            bounds: [
                read_e7(&mut cursor, "min longitude")?,
                read_e7(&mut cursor, "min latitude")?,
                read_e7(&mut cursor, "max longitude")?,
                read_e7(&mut cursor, "max latitude")?,
            ],
            center_zoom: read_u8(&mut cursor, "center zoom")?,
            center: [
                read_e7(&mut cursor, "center longitude")?,
                read_e7(&mut cursor, "center latitude")?,
            ],
        })
    }

    /// Byte range of the metadata section. Fails when the header points past
    /// the addressable range or asks for more than [`MAX_METADATA_LEN`].
    pub fn metadata_range(&self) -> Result<Range<u64>> {
        if self.metadata_length > MAX_METADATA_LEN {
            bail!("[archive::header] Metadata section of {} bytes exceeds {MAX_METADATA_LEN}", self.metadata_length);
        }
        let end = self.metadata_offset.checked_add(self.metadata_length)
            .context("[archive::header] Metadata section overflows the archive")?;
        Ok(self.metadata_offset..end)
    }

    /// Decode the raw metadata section into JSON.
    pub fn decode_metadata(&self, raw: &[u8]) -> Result<serde_json::Value> {
        let json = match self.internal_compression {
            Compression::None | Compression::Unknown => raw.to_vec(),
            Compression::Gzip => {
                let mut decoder = GzDecoder::new(raw);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out)
                    .context("[archive::header] Failed to gunzip metadata")?;
                out
            }
            other => bail!("[archive::header] Unsupported metadata compression {other:?}"),
        };
        serde_json::from_slice(&json).context("[archive::header] Metadata is not valid JSON")
    }
}
