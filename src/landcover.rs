use std::collections::HashMap;

use anyhow::Result;

use crate::config::ViewerConfig;
use crate::engine::{LayerSpec, MapEngine, SourceSpec};

const TILE_SIZE: u32 = 256;
const MIN_ZOOM: u8 = 0;
const MAX_ZOOM: u8 = 22;

/// What a landcover toggle did to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandcoverChange {
    /// The country has no landcover for the requested year.
    Unavailable,
    /// Objects were already in place for the same URL; nothing touched.
    Unchanged,
    Created,
    /// Old raster removed and a new one added for a different URL.
    Replaced,
    Removed,
}

/// Engine id shared by the raster source and its layer.
pub fn landcover_id(country: &str) -> String {
    format!("landcover-{country}")
}

/// `cog://<url>`, with the style as URL fragment when one is configured.
pub fn styled_url(raw: &str, style: Option<&str>) -> String {
    match style {
        Some(style) if !style.is_empty() => format!("cog://{raw}#{style}"),
        _ => format!("cog://{raw}"),
    }
}

/// Keeps at most one raster landcover layer per country.
#[derive(Debug, Default)]
pub struct LandcoverToggle {
    active: HashMap<String, String>,
}

impl LandcoverToggle {
    pub fn new() -> Self { Self::default() }

    /// Styled URL currently shown for `country`.
    pub fn active_url(&self, country: &str) -> Option<&str> {
        self.active.get(country).map(String::as_str)
    }

    pub fn is_on(&self, country: &str) -> bool { self.active.contains_key(country) }

    /// Turn landcover for `country` on (for `year`, or the latest year) or off.
    /// A redundant "on" with an unchanged URL leaves the engine untouched.
    pub fn set(
        &mut self,
        engine: &mut dyn MapEngine,
        config: &ViewerConfig,
        country: &str,
        on: bool,
        year: Option<&str>,
    ) -> Result<LandcoverChange> {
        let Some(sources) = config.landcover(country) else {
            return Ok(LandcoverChange::Unavailable);
        };
        let id = landcover_id(country);

        if !on {
            let existed = engine.has_layer(&id) || engine.has_source(&id);
            remove_raster(engine, &id)?;
            self.active.remove(country);
            return Ok(if existed { LandcoverChange::Removed } else { LandcoverChange::Unchanged });
        }

        let Some((_, raw)) = sources.url_or_latest(year) else {
            tracing::warn!(country, year, "no landcover for requested year");
            return Ok(LandcoverChange::Unavailable);
        };
        let url = styled_url(raw, config.landcover_style.as_deref());

        let replaced = match self.active.get(country) {
            Some(prev) if *prev != url => {
                remove_raster(engine, &id)?;
                true
            }
            _ => false,
        };

        let mut created = false;
        if !engine.has_source(&id) {
            engine.add_source(&id, &SourceSpec::raster_url(url.as_str(), TILE_SIZE, MIN_ZOOM, MAX_ZOOM))?;
            created = true;
        }
        if !engine.has_layer(&id) {
            engine.add_layer(&LayerSpec::raster(&id, &id))?;
            created = true;
        }
        tracing::debug!(country, url = %url, replaced, created, "landcover on");
        self.active.insert(country.to_string(), url);

        Ok(match (replaced, created) {
            (true, _) => LandcoverChange::Replaced,
            (false, true) => LandcoverChange::Created,
            (false, false) => LandcoverChange::Unchanged,
        })
    }
}

fn remove_raster(engine: &mut dyn MapEngine, id: &str) -> Result<()> {
    if engine.has_layer(id) {
        engine.remove_layer(id)?;
    }
    if engine.has_source(id) {
        engine.remove_source(id)?;
    }
    Ok(())
}
