mod registry;

use std::{fmt, str::FromStr};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

pub use registry::{AddOutcome, LayerRegistry, ResolveTicket};

/// Kind of dataset a registry entry draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// Field boundaries from a PMTiles vector archive.
    Pmtiles,
}

impl LayerType {
    pub fn to_str(&self) -> &'static str {
        match self {
            LayerType::Pmtiles => "pmtiles",
        }
    }
}

impl FromStr for LayerType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "pmtiles" => Ok(LayerType::Pmtiles),
            _ => Err(anyhow!("Unknown layer type: {s}. Expected 'pmtiles'")),
        }
    }
}

/// Identifies one set of engine objects: `(country, layer type, year)`.
/// Year-less archives use `year: None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerKey {
    pub country: String,
    pub layer_type: LayerType,
    pub year: Option<String>,
}

impl LayerKey {
    pub fn new(country: &str, layer_type: LayerType, year: Option<&str>) -> Self {
        Self {
            country: country.to_string(),
            layer_type,
            year: year.map(str::to_string),
        }
    }

    pub fn pmtiles(country: &str, year: Option<&str>) -> Self {
        Self::new(country, LayerType::Pmtiles, year)
    }

    pub fn year(&self) -> Option<&str> { self.year.as_deref() }

    pub fn source_id(&self) -> String { format!("src-{self}") }

    pub fn fill_layer_id(&self) -> String { format!("fill-{self}") }

    pub fn line_layer_id(&self) -> String { format!("line-{self}") }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.year {
            Some(year) => write!(f, "{}-{}-{}", self.country, self.layer_type.to_str(), year),
            None => write!(f, "{}-{}", self.country, self.layer_type.to_str()),
        }
    }
}

/// Engine objects owned by one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerRecord {
    pub source_id: String,
    pub fill_layer_id: String,
    pub line_layer_id: String,
    pub source_layer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_string_form() {
        let key = LayerKey::pmtiles("Zambia", Some("2020"));
        assert_eq!(key.to_string(), "Zambia-pmtiles-2020");
        assert_eq!(key.source_id(), "src-Zambia-pmtiles-2020");
        assert_eq!(key.fill_layer_id(), "fill-Zambia-pmtiles-2020");
        assert_eq!(key.line_layer_id(), "line-Zambia-pmtiles-2020");
        assert_eq!(LayerKey::pmtiles("Congo", None).to_string(), "Congo-pmtiles");
    }

    #[test]
    fn keys_differ_across_countries_and_years() {
        let a = LayerKey::pmtiles("Zambia", Some("2020"));
        let b = LayerKey::pmtiles("Zambia", Some("2021"));
        let c = LayerKey::pmtiles("Ghana", Some("2020"));
        let d = LayerKey::pmtiles("Zambia", None);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn layer_type_parses() {
        assert_eq!("PMTiles".parse::<LayerType>().unwrap(), LayerType::Pmtiles);
        assert!("geojson".parse::<LayerType>().is_err());
    }
}
