//! Toolbar panels. Rows are rebuilt from registry and view state every
//! time a panel is shown, so checkboxes can never drift from the map.

use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::config::ViewerConfig;
use crate::layer::{LayerKey, LayerRegistry};
use crate::selection::ViewState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    Country,
    Year,
    Layer,
}

impl PanelKind {
    pub const ALL: [PanelKind; 3] = [PanelKind::Country, PanelKind::Year, PanelKind::Layer];
}

impl FromStr for PanelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "country" => Ok(PanelKind::Country),
            "year" => Ok(PanelKind::Year),
            "layer" | "layers" => Ok(PanelKind::Layer),
            _ => Err(anyhow!("Unknown panel: {s}. Expected one of: country, year, layer")),
        }
    }
}

/// Which panel is open. At most one at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Toolbar {
    open: Option<PanelKind>,
}

impl Toolbar {
    pub fn new() -> Self { Self::default() }

    pub fn current(&self) -> Option<PanelKind> { self.open }

    pub fn is_open(&self, kind: PanelKind) -> bool { self.open == Some(kind) }

    /// Open `kind` and close the others; toggling the open panel closes it.
    /// Returns whether `kind` is open afterwards.
    pub fn toggle(&mut self, kind: PanelKind) -> bool {
        self.open = if self.is_open(kind) { None } else { Some(kind) };
        self.is_open(kind)
    }

    pub fn open(&mut self, kind: PanelKind) { self.open = Some(kind); }

    pub fn close(&mut self) { self.open = None; }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkbox {
    pub id: String,
    pub label: String,
    pub checked: bool,
}

impl Checkbox {
    fn new(id: String, label: &str, checked: bool) -> Self {
        Self { id, label: label.to_string(), checked }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub kind: PanelKind,
    pub rows: Vec<Checkbox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

pub fn country_panel(config: &ViewerConfig, state: &ViewState) -> Panel {
    let rows = config.country_names().into_iter()
        .map(|country| Checkbox::new(format!("country-{country}"), country, state.is_selected(country)))
        .collect();
    Panel { kind: PanelKind::Country, rows, hint: None }
}

/// Years of the active country. A year is checked while its layer set is
/// registered, including while the source layer is still resolving.
pub fn year_panel(config: &ViewerConfig, state: &ViewState, registry: &LayerRegistry) -> Panel {
    let Some(country) = state.active_country() else {
        return Panel { kind: PanelKind::Year, rows: Vec::new(), hint: Some("Choose a country first.".into()) };
    };

    let years = config.years(country);
    let hint = match (years.first(), years.last()) {
        (Some(first), Some(last)) if first == last => format!("{country}: {first}."),
        (Some(first), Some(last)) => format!("{country}: {first}–{last}."),
        _ => format!("No year options for {country}."),
    };
    let rows = years.into_iter()
        .map(|year| {
            let checked = registry.contains(&LayerKey::pmtiles(country, Some(year)));
            Checkbox::new(format!("year-{country}-{year}"), year, checked)
        })
        .collect();

    Panel { kind: PanelKind::Year, rows, hint: Some(hint) }
}

pub fn layer_panel(state: &ViewState) -> Panel {
    Panel {
        kind: PanelKind::Layer,
        rows: vec![
            Checkbox::new("layer-field".into(), "Field boundaries", state.field_boundaries),
            Checkbox::new("layer-landcover".into(), "Landcover", state.landcover),
        ],
        hint: None,
    }
}
