//! Country / year / layer selection as explicit state plus transitions.
//!
//! Transitions are pure: they take the current [`ViewState`] and return the
//! next one together with the [`Effect`]s the viewer must apply to the
//! registry, the landcover toggle and the camera. Effects are applied in
//! order, against the *new* state.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::ViewerConfig;
use crate::layer::LayerKey;
use crate::panel::PanelKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    Idle,
    Active { country: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    /// Country whose years the Year panel shows.
    pub selection: Selection,
    /// Countries whose checkbox is on. Always contains the active country.
    pub selected: BTreeSet<String>,
    /// Global field boundary visibility.
    pub field_boundaries: bool,
    /// Global landcover toggle, applied to the active country.
    pub landcover: bool,
    /// The first fly-to is skipped to keep the initial camera.
    pub first_flight: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            selection: Selection::Idle,
            selected: BTreeSet::new(),
            field_boundaries: false,
            landcover: false,
            first_flight: true,
        }
    }
}

impl ViewState {
    pub fn active_country(&self) -> Option<&str> {
        match &self.selection {
            Selection::Active { country } => Some(country),
            Selection::Idle => None,
        }
    }

    pub fn is_selected(&self, country: &str) -> bool { self.selected.contains(country) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    AddLayers { key: LayerKey },
    RemoveLayers { key: LayerKey },
    /// Remove every layer set and the landcover of a country.
    RemoveCountry { country: String },
    /// Re-apply field boundary visibility to all registered layers.
    SetFieldBoundaries { visible: bool },
    Landcover { country: String, on: bool, year: Option<String> },
    FlyTo { country: String },
    OpenPanel { panel: PanelKind },
}

/// Result of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ViewState,
    pub effects: Vec<Effect>,
}

/// Where a selection came from. Defaults applied at load never open panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Defaults,
}

fn landcover_on(country: &str, year: Option<&str>) -> Effect {
    Effect::Landcover { country: country.to_string(), on: true, year: year.map(str::to_string) }
}

/// Check a country: make it active and apply its defaults.
pub fn select_country(state: &ViewState, config: &ViewerConfig, country: &str, origin: Origin) -> Transition {
    let mut next = state.clone();
    let mut effects = Vec::new();
    next.selection = Selection::Active { country: country.to_string() };
    next.selected.insert(country.to_string());

    let is_default = config.is_default_country(country);
    if is_default {
        next.field_boundaries = true;
        next.landcover = true;
        if let Some(year) = config.default_year_for(country) {
            effects.push(Effect::AddLayers { key: LayerKey::pmtiles(country, Some(year)) });
        }
    }
    if config.is_landcover_only(country) {
        next.landcover = true;
    }
    if config.has_yearless_tiles(country) {
        effects.push(Effect::AddLayers { key: LayerKey::pmtiles(country, None) });
    }

    if next.first_flight {
        next.first_flight = false;
    } else if config.view(country).is_some() {
        effects.push(Effect::FlyTo { country: country.to_string() });
    }

    if next.landcover {
        effects.push(landcover_on(country, None));
    }
    if is_default && origin == Origin::User {
        effects.push(Effect::OpenPanel { panel: PanelKind::Year });
    }
    effects.push(Effect::SetFieldBoundaries { visible: next.field_boundaries });

    Transition { state: next, effects }
}

/// Uncheck a country: drop its layers and landcover.
pub fn deselect_country(state: &ViewState, country: &str) -> Transition {
    let mut next = state.clone();
    next.selected.remove(country);
    if next.active_country() == Some(country) {
        next.selection = Selection::Idle;
    }
    let effects = vec![
        Effect::RemoveCountry { country: country.to_string() },
        Effect::SetFieldBoundaries { visible: next.field_boundaries },
    ];
    Transition { state: next, effects }
}

/// Check or uncheck a year of the active country. Without an active
/// country this does nothing.
pub fn toggle_year(state: &ViewState, config: &ViewerConfig, year: &str, on: bool) -> Transition {
    let next = state.clone();
    let Some(country) = next.active_country() else {
        return Transition { state: next, effects: Vec::new() };
    };

    let key = LayerKey::pmtiles(country, Some(year));
    let mut effects = vec![
        if on { Effect::AddLayers { key } } else { Effect::RemoveLayers { key } },
        Effect::SetFieldBoundaries { visible: next.field_boundaries },
    ];
    if next.landcover {
        // Follow the checked year when landcover exists for it.
        let same_year = on && config.landcover(country).is_some_and(|lc| lc.url(Some(year)).is_some());
        effects.push(landcover_on(country, same_year.then_some(year)));
    }
    Transition { state: next, effects }
}

pub fn set_field_boundaries(state: &ViewState, visible: bool) -> Transition {
    let mut next = state.clone();
    next.field_boundaries = visible;
    Transition { state: next, effects: vec![Effect::SetFieldBoundaries { visible }] }
}

/// Global landcover toggle; acts on the active country only.
pub fn set_landcover(state: &ViewState, on: bool) -> Transition {
    let mut next = state.clone();
    next.landcover = on;
    let effects = match next.active_country() {
        Some(country) => vec![Effect::Landcover { country: country.to_string(), on, year: None }],
        None => Vec::new(),
    };
    Transition { state: next, effects }
}
