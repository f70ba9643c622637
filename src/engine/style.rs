use serde::{Deserialize, Serialize};

use crate::config::BasemapConfig;

/// Source definition, serialized the way MapLibre style JSON expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceSpec {
    Vector {
        url: String,
    },
    Raster {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tiles: Vec<String>,
        #[serde(rename = "tileSize")]
        tile_size: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minzoom: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maxzoom: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribution: Option<String>,
    },
}

impl SourceSpec {
    /// Vector tile archive served through the `pmtiles://` protocol.
    pub fn pmtiles(archive_url: &str) -> Self {
        SourceSpec::Vector { url: format!("pmtiles://{archive_url}") }
    }

    /// Single raster resource (a styled `cog://` URL).
    pub fn raster_url(url: impl Into<String>, tile_size: u32, minzoom: u8, maxzoom: u8) -> Self {
        SourceSpec::Raster {
            url: Some(url.into()),
            tiles: Vec::new(),
            tile_size,
            minzoom: Some(minzoom),
            maxzoom: Some(maxzoom),
            attribution: None,
        }
    }

    /// XYZ raster tiles for the basemap.
    pub fn basemap(basemap: &BasemapConfig) -> Self {
        SourceSpec::Raster {
            url: None,
            tiles: basemap.tiles.clone(),
            tile_size: basemap.tile_size,
            minzoom: None,
            maxzoom: Some(basemap.max_zoom),
            attribution: basemap.attribution.clone(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            SourceSpec::Vector { url } => Some(url),
            SourceSpec::Raster { url, .. } => url.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    None,
}

impl From<bool> for Visibility {
    fn from(visible: bool) -> Self {
        if visible { Visibility::Visible } else { Visibility::None }
    }
}

impl Visibility {
    pub fn is_visible(self) -> bool { self == Visibility::Visible }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillPaint {
    #[serde(rename = "fill-color")]
    pub color: String,
    #[serde(rename = "fill-outline-color")]
    pub outline_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePaint {
    #[serde(rename = "line-color")]
    pub color: String,
    #[serde(rename = "line-width")]
    pub width: f64,
}

/// Layer type together with its paint properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "paint", rename_all = "lowercase")]
pub enum Paint {
    Fill(FillPaint),
    Line(LinePaint),
    Raster,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(flatten)]
    pub paint: Paint,
    pub source: String,
    #[serde(rename = "source-layer", default, skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    pub layout: Layout,
}

impl LayerSpec {
    /// Transparent fill so features stay queryable without covering the imagery.
    pub fn boundary_fill(id: &str, source: &str, source_layer: &str, visibility: Visibility) -> Self {
        Self {
            id: id.to_string(),
            paint: Paint::Fill(FillPaint {
                color: "rgba(0,0,0,0)".into(),
                outline_color: "rgba(0,0,0,0)".into(),
            }),
            source: source.to_string(),
            source_layer: Some(source_layer.to_string()),
            layout: Layout { visibility },
        }
    }

    pub fn boundary_line(id: &str, source: &str, source_layer: &str, visibility: Visibility) -> Self {
        Self {
            id: id.to_string(),
            paint: Paint::Line(LinePaint { color: "lightblue".into(), width: 1.0 }),
            source: source.to_string(),
            source_layer: Some(source_layer.to_string()),
            layout: Layout { visibility },
        }
    }

    pub fn raster(id: &str, source: &str) -> Self {
        Self {
            id: id.to_string(),
            paint: Paint::Raster,
            source: source.to_string(),
            source_layer: None,
            layout: Layout { visibility: Visibility::Visible },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vector_source_uses_pmtiles_protocol() {
        let spec = SourceSpec::pmtiles("https://x/zambia_2020.pmtiles");
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({ "type": "vector", "url": "pmtiles://https://x/zambia_2020.pmtiles" })
        );
    }

    #[test]
    fn raster_source_matches_style_spec() {
        let spec = SourceSpec::raster_url("cog://https://x/lc.tif", 256, 0, 22);
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({ "type": "raster", "url": "cog://https://x/lc.tif", "tileSize": 256, "minzoom": 0, "maxzoom": 22 })
        );
    }

    #[test]
    fn basemap_source_lists_tiles() {
        let basemap = BasemapConfig {
            tiles: vec!["https://tiles/{z}/{y}/{x}.jpg".into()],
            tile_size: 256,
            attribution: Some("imagery".into()),
            max_zoom: 20,
        };
        assert_eq!(
            serde_json::to_value(SourceSpec::basemap(&basemap)).unwrap(),
            json!({
                "type": "raster",
                "tiles": ["https://tiles/{z}/{y}/{x}.jpg"],
                "tileSize": 256,
                "maxzoom": 20,
                "attribution": "imagery"
            })
        );
    }

    #[test]
    fn line_layer_matches_style_spec() {
        let layer = LayerSpec::boundary_line("line-k", "src-k", "fields", Visibility::None);
        assert_eq!(
            serde_json::to_value(&layer).unwrap(),
            json!({
                "id": "line-k",
                "type": "line",
                "paint": { "line-color": "lightblue", "line-width": 1.0 },
                "source": "src-k",
                "source-layer": "fields",
                "layout": { "visibility": "none" }
            })
        );
    }

    #[test]
    fn raster_layer_has_no_paint_or_source_layer() {
        let value = serde_json::to_value(LayerSpec::raster("landcover-Tanzania", "landcover-Tanzania")).unwrap();
        assert_eq!(value["type"], "raster");
        assert!(value.get("paint").is_none());
        assert!(value.get("source-layer").is_none());
    }
}
