mod sources;
mod view;

use std::{collections::{BTreeMap, BTreeSet}, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

pub use sources::Sources;
pub use view::{BasemapConfig, CameraView};

/// Static viewer configuration: which datasets exist per country and where
/// the camera goes. Loaded once; never mutated by the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Vector tile archives (field boundaries) per country.
    #[serde(default)]
    pub pmtiles_sources: BTreeMap<String, Sources>,
    /// Landcover COGs per country.
    #[serde(default)]
    pub landcover_sources: BTreeMap<String, Sources>,
    /// Camera preset per country.
    #[serde(default)]
    pub country_views: BTreeMap<String, CameraView>,
    /// Country panel order. Derived from the other tables when empty.
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub default_country: Option<String>,
    #[serde(default)]
    pub default_year: Option<String>,
    pub initial_view: CameraView,
    pub basemap: BasemapConfig,
    /// Fragment appended to landcover URLs (`cog://<url>#<style>`).
    #[serde(default)]
    pub landcover_style: Option<String>,
    #[serde(default = "default_fly_speed")]
    pub fly_speed: f64,
}

fn default_fly_speed() -> f64 { 1.5 }

const BUILTIN: &str = include_str!("builtin.json");

impl ViewerConfig {
    /// The Mapping Africa croplands / landcover dataset.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN).context("[config] Builtin config is invalid")
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ViewerConfig = serde_json::from_str(json)
            .context("[config] Failed to parse viewer config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("[config] Invalid config file {}", path.display()))
    }

    /// Reject dangling references and unusable URLs.
    pub fn validate(&self) -> Result<()> {
        let known: BTreeSet<&str> = self.country_names().into_iter().collect();

        for (country, sources) in self.pmtiles_sources.iter().chain(&self.landcover_sources) {
            for url in sources.urls() {
                if url.is_empty() {
                    bail!("[config] Empty URL configured for {country}");
                }
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    bail!("[config] URL for {country} must be http(s): {url}");
                }
            }
            if let Sources::ByYear(by_year) = sources {
                if by_year.is_empty() {
                    bail!("[config] {country} declares a year table with no years");
                }
            }
        }

        for country in self.countries.iter() {
            if !self.pmtiles_sources.contains_key(country) && !self.landcover_sources.contains_key(country) {
                bail!("[config] Country {country} has neither vector tiles nor landcover");
            }
        }

        for country in self.country_views.keys() {
            if !known.contains(country.as_str()) {
                bail!("[config] View configured for unknown country {country}");
            }
        }

        if let Some(country) = &self.default_country {
            if !known.contains(country.as_str()) {
                bail!("[config] Default country {country} is not configured");
            }
        }

        if self.basemap.tiles.is_empty() {
            bail!("[config] Basemap needs at least one tile URL template");
        }

        Ok(())
    }

    /// Countries in panel order.
    pub fn country_names(&self) -> Vec<&str> {
        if !self.countries.is_empty() {
            return self.countries.iter().map(String::as_str).collect();
        }
        let names: BTreeSet<&str> = self.pmtiles_sources.keys()
            .chain(self.landcover_sources.keys())
            .map(String::as_str)
            .collect();
        names.into_iter().collect()
    }

    pub fn tile_sources(&self, country: &str) -> Option<&Sources> {
        self.pmtiles_sources.get(country)
    }

    pub fn landcover(&self, country: &str) -> Option<&Sources> {
        self.landcover_sources.get(country)
    }

    pub fn view(&self, country: &str) -> Option<&CameraView> {
        self.country_views.get(country)
    }

    /// Vector tile URL for a country/year. Missing entries are configuration errors.
    pub fn tile_url(&self, country: &str, year: Option<&str>) -> Result<&str> {
        self.tile_sources(country)
            .and_then(|sources| sources.url(year))
            .ok_or_else(|| anyhow!("Missing source URL for {country} {}", year.unwrap_or_default()))
    }

    /// Selectable years for a country, sorted. Empty for year-less or landcover-only countries.
    pub fn years(&self, country: &str) -> Vec<&str> {
        self.tile_sources(country).map(Sources::years).unwrap_or_default()
    }

    pub fn has_vector_tiles(&self, country: &str) -> bool {
        self.pmtiles_sources.contains_key(country)
    }

    /// Landcover data but no vector tiles at all.
    pub fn is_landcover_only(&self, country: &str) -> bool {
        self.landcover_sources.contains_key(country) && !self.has_vector_tiles(country)
    }

    /// A single year-less vector archive.
    pub fn has_yearless_tiles(&self, country: &str) -> bool {
        self.tile_sources(country).is_some_and(Sources::is_single)
    }

    pub fn is_default_country(&self, country: &str) -> bool {
        self.default_country.as_deref() == Some(country)
    }

    /// Year preselected for the default country: the configured default when
    /// that year exists, otherwise the latest available year.
    pub fn default_year_for(&self, country: &str) -> Option<&str> {
        let sources = self.tile_sources(country)?;
        match self.default_year.as_deref() {
            Some(year) if sources.url(Some(year)).is_some() => Some(year),
            _ => sources.latest_year(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(extra: &str) -> String {
        format!(
            r#"{{
                "initial_view": {{ "center": [0, 0], "zoom": 2 }},
                "basemap": {{ "tiles": ["https://tiles/{{z}}/{{x}}/{{y}}"] }}
                {extra}
            }}"#
        )
    }

    #[test]
    fn builtin_config_parses_and_validates() {
        let config = ViewerConfig::builtin().unwrap();
        config.validate().unwrap();
        assert_eq!(config.country_names(), vec!["Congo", "Zambia", "Ghana", "Tanzania"]);
        assert_eq!(config.years("Zambia"), vec!["2018", "2019", "2020", "2021", "2022", "2023"]);
        assert!(config.is_landcover_only("Tanzania"));
        assert!(config.has_yearless_tiles("Congo"));
        assert_eq!(config.basemap.tile_size, 256);
    }

    #[test]
    fn default_year_falls_back_to_latest() {
        let config = ViewerConfig::builtin().unwrap();
        // 2024 is configured but Zambia only goes to 2023
        assert_eq!(config.default_year.as_deref(), Some("2024"));
        assert_eq!(config.default_year_for("Zambia"), Some("2023"));
        assert_eq!(config.default_year_for("Tanzania"), None);
    }

    #[test]
    fn tile_url_reports_missing_entries() {
        let config = ViewerConfig::builtin().unwrap();
        assert!(config.tile_url("Zambia", Some("2020")).unwrap().ends_with("zambia_2020_v4.pmtiles"));
        assert!(config.tile_url("Zambia", Some("1990")).is_err());
        assert!(config.tile_url("Atlantis", Some("2020")).is_err());
        assert!(config.tile_url("Congo", None).is_ok());
    }

    #[test]
    fn defaults_apply_to_optional_fields() {
        let config = ViewerConfig::from_json_str(&minimal("")).unwrap();
        assert!(config.pmtiles_sources.is_empty());
        assert_eq!(config.fly_speed, 1.5);
        assert_eq!(config.basemap.max_zoom, 20);
        assert!(config.country_names().is_empty());
    }

    #[test]
    fn country_names_are_derived_when_not_listed() {
        let config = ViewerConfig::from_json_str(&minimal(r#",
            "pmtiles_sources": { "Zambia": { "2020": "https://x/z.pmtiles" } },
            "landcover_sources": { "Kenya": "https://x/k.tif" }"#)).unwrap();
        assert_eq!(config.country_names(), vec!["Kenya", "Zambia"]);
    }

    #[test]
    fn validation_rejects_dangling_references() {
        let unknown_default = minimal(r#", "default_country": "Narnia""#);
        assert!(ViewerConfig::from_json_str(&unknown_default).is_err());

        let unknown_view = minimal(r#", "country_views": { "Narnia": { "center": [0, 0], "zoom": 1 } }"#);
        assert!(ViewerConfig::from_json_str(&unknown_view).is_err());

        let bad_url = minimal(r#", "pmtiles_sources": { "Zambia": "ftp://x/z.pmtiles" }"#);
        assert!(ViewerConfig::from_json_str(&bad_url).is_err());

        let listed_without_data = minimal(r#", "countries": ["Zambia"]"#);
        assert!(ViewerConfig::from_json_str(&listed_without_data).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        std::fs::write(&path, minimal(r#", "landcover_sources": { "Kenya": "https://x/k.tif" }"#)).unwrap();
        let config = ViewerConfig::from_path(&path).unwrap();
        assert!(config.is_landcover_only("Kenya"));

        assert!(ViewerConfig::from_path(&dir.path().join("missing.json")).is_err());
    }
}
