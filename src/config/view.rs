use serde::{Deserialize, Serialize};

/// Camera preset: center as (lon, lat) and a zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    pub center: [f64; 2],
    pub zoom: f64,
}

/// Raster basemap drawn under every overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasemapConfig {
    pub tiles: Vec<String>,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default)]
    pub attribution: Option<String>,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
}

fn default_tile_size() -> u32 { 256 }

fn default_max_zoom() -> u8 { 20 }
