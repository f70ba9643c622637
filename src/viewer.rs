use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::archive::MetadataFetcher;
use crate::config::ViewerConfig;
use crate::engine::{LayerSpec, MapEngine, SourceSpec, Visibility};
use crate::landcover::LandcoverToggle;
use crate::layer::{AddOutcome, LayerKey, LayerRegistry, ResolveTicket};
use crate::panel::{self, Panel, PanelKind, Toolbar};
use crate::resolver::SourceLayerResolver;
use crate::selection::{self, Effect, Origin, Transition, ViewState};

/// Engine id of the basemap raster source and layer.
pub const BASEMAP_ID: &str = "basemap";

/// URL schemes the engine must resolve for overlays.
pub const PROTOCOLS: [&str; 2] = ["pmtiles", "cog"];

/// A UI interaction, as recorded in session scripts or sent from the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    Load,
    Country { name: String, checked: bool },
    Year { year: String, checked: bool },
    FieldBoundaries { visible: bool },
    Landcover { on: bool },
    Panel { kind: PanelKind },
}

/// Owns the map engine and every piece of viewer state. UI events enter
/// through the handler methods; failures inside a handler are logged and
/// never leave the viewer half-updated on the registry side.
pub struct Viewer<E: MapEngine> {
    config: ViewerConfig,
    engine: E,
    fetcher: Option<Box<dyn MetadataFetcher>>,
    resolver: SourceLayerResolver,
    registry: LayerRegistry,
    landcover: LandcoverToggle,
    state: ViewState,
    toolbar: Toolbar,
    loaded: bool,
}

impl<E: MapEngine> Viewer<E> {
    /// Register tile protocols, add the basemap and jump to the initial view.
    ///
    /// Without a `fetcher`, source-layer lookups stay pending until
    /// [`Viewer::complete_resolve`] is called with metadata fetched elsewhere.
    pub fn new(config: ViewerConfig, mut engine: E, fetcher: Option<Box<dyn MetadataFetcher>>) -> Result<Self> {
        for scheme in PROTOCOLS {
            engine.add_protocol(scheme)
                .with_context(|| format!("[viewer] Failed to register {scheme}:// protocol"))?;
        }
        engine.add_source(BASEMAP_ID, &SourceSpec::basemap(&config.basemap))
            .context("[viewer] Failed to add basemap source")?;
        engine.add_layer(&LayerSpec::raster(BASEMAP_ID, BASEMAP_ID))
            .context("[viewer] Failed to add basemap layer")?;
        engine.jump_to(&config.initial_view)?;

        Ok(Self {
            config,
            engine,
            fetcher,
            resolver: SourceLayerResolver::new(),
            registry: LayerRegistry::new(),
            landcover: LandcoverToggle::new(),
            state: ViewState::default(),
            toolbar: Toolbar::new(),
            loaded: false,
        })
    }

    /// Apply the configured default country. Runs once; later calls do nothing.
    pub fn on_load(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        let Some(country) = self.config.default_country.clone() else {
            return;
        };
        tracing::info!(country = %country, "applying defaults");
        let transition = selection::select_country(&self.state, &self.config, &country, Origin::Defaults);
        self.apply(transition);
    }

    /// Country checkbox changed.
    pub fn select_country(&mut self, country: &str, checked: bool) {
        if !self.config.country_names().contains(&country) {
            tracing::warn!(country, "ignoring unknown country");
            return;
        }
        tracing::info!(country, checked, "country toggled");
        let transition = if checked {
            selection::select_country(&self.state, &self.config, country, Origin::User)
        } else {
            selection::deselect_country(&self.state, country)
        };
        self.apply(transition);
    }

    /// Year checkbox of the active country changed.
    pub fn toggle_year(&mut self, year: &str, checked: bool) {
        tracing::info!(country = ?self.state.active_country(), year, checked, "year toggled");
        let transition = selection::toggle_year(&self.state, &self.config, year, checked);
        self.apply(transition);
    }

    pub fn set_field_boundaries(&mut self, visible: bool) {
        tracing::info!(visible, "field boundaries toggled");
        let transition = selection::set_field_boundaries(&self.state, visible);
        self.apply(transition);
    }

    pub fn set_landcover(&mut self, on: bool) {
        tracing::info!(on, "landcover toggled");
        let transition = selection::set_landcover(&self.state, on);
        self.apply(transition);
    }

    /// Route a UI event to its handler. Returns the panel a toolbar click opened.
    pub fn handle(&mut self, event: &UiEvent) -> Option<Panel> {
        match event {
            UiEvent::Load => self.on_load(),
            UiEvent::Country { name, checked } => self.select_country(name, *checked),
            UiEvent::Year { year, checked } => self.toggle_year(year, *checked),
            UiEvent::FieldBoundaries { visible } => self.set_field_boundaries(*visible),
            UiEvent::Landcover { on } => self.set_landcover(*on),
            UiEvent::Panel { kind } => return self.toggle_panel(*kind),
        }
        None
    }

    /// Toolbar button pressed. Returns the freshly built panel when it opened.
    pub fn toggle_panel(&mut self, kind: PanelKind) -> Option<Panel> {
        self.toolbar.toggle(kind).then(|| self.panel(kind))
    }

    /// The currently open panel, rebuilt from current state.
    pub fn open_panel(&self) -> Option<Panel> {
        self.toolbar.current().map(|kind| self.panel(kind))
    }

    pub fn panel(&self, kind: PanelKind) -> Panel {
        match kind {
            PanelKind::Country => panel::country_panel(&self.config, &self.state),
            PanelKind::Year => panel::year_panel(&self.config, &self.state, &self.registry),
            PanelKind::Layer => panel::layer_panel(&self.state),
        }
    }

    /// Source-layer lookups waiting for metadata, oldest first.
    pub fn pending_tickets(&self) -> Vec<ResolveTicket> { self.registry.pending() }

    /// Finish a pending lookup with metadata fetched by the caller (`None` when
    /// the fetch failed). Returns `false` if the ticket is unknown or stale.
    pub fn complete_resolve(&mut self, ticket_id: u64, metadata: Option<&Value>) -> Result<bool> {
        let Some(ticket) = self.registry.pending().into_iter().find(|ticket| ticket.id == ticket_id) else {
            tracing::debug!(ticket = ticket_id, "no pending lookup for ticket");
            return Ok(false);
        };
        let source_layer = self.resolver.record(&ticket.url, metadata);
        let visibility = self.visibility();
        self.registry.complete(&mut self.engine, &ticket, &source_layer, visibility)
            .with_context(|| format!("[viewer] Failed to add layers for {}", ticket.key))
    }

    pub fn config(&self) -> &ViewerConfig { &self.config }

    pub fn state(&self) -> &ViewState { &self.state }

    pub fn registry(&self) -> &LayerRegistry { &self.registry }

    pub fn landcover(&self) -> &LandcoverToggle { &self.landcover }

    pub fn resolver(&self) -> &SourceLayerResolver { &self.resolver }

    pub fn toolbar(&self) -> &Toolbar { &self.toolbar }

    pub fn engine(&self) -> &E { &self.engine }

    pub fn engine_mut(&mut self) -> &mut E { &mut self.engine }

    fn visibility(&self) -> Visibility { self.state.field_boundaries.into() }

    fn apply(&mut self, transition: Transition) {
        self.state = transition.state;
        for effect in transition.effects {
            if let Err(e) = self.apply_effect(&effect) {
                tracing::error!(?effect, error = format_args!("{e:#}"), "effect failed");
            }
        }
    }

    fn apply_effect(&mut self, effect: &Effect) -> Result<()> {
        match effect {
            Effect::AddLayers { key } => self.add_layers(key.clone()),
            Effect::RemoveLayers { key } => self.registry.remove(&mut self.engine, key).map(|_| ()),
            Effect::RemoveCountry { country } => {
                // Landcover still goes when the field layers fail to come off.
                if let Err(e) = self.registry.remove_country(&mut self.engine, country) {
                    tracing::error!(country = %country, error = format_args!("{e:#}"), "failed to remove field layers");
                }
                self.landcover.set(&mut self.engine, &self.config, country, false, None).map(|_| ())
            }
            Effect::SetFieldBoundaries { visible } => {
                self.registry.set_visibility(&mut self.engine, (*visible).into())
            }
            Effect::Landcover { country, on, year } => {
                let change = self.landcover.set(&mut self.engine, &self.config, country, *on, year.as_deref())?;
                tracing::debug!(country = %country, ?change, "landcover synced");
                Ok(())
            }
            Effect::FlyTo { country } => match self.config.view(country) {
                Some(view) => self.engine.fly_to(view, self.config.fly_speed),
                None => Ok(()),
            },
            Effect::OpenPanel { panel } => {
                self.toolbar.open(*panel);
                Ok(())
            }
        }
    }

    /// Add a layer set, resolving its source layer right away when a
    /// fetcher is available.
    fn add_layers(&mut self, key: LayerKey) -> Result<()> {
        let visibility = self.visibility();
        let outcome = self.registry
            .add(&mut self.engine, &self.config, &self.resolver, key.clone(), visibility)
            .with_context(|| format!("[viewer] Failed to add layers for {key}"))?;

        let AddOutcome::Pending(ticket) = outcome else {
            return Ok(());
        };
        let Some(fetcher) = self.fetcher.as_deref() else {
            tracing::debug!(key = %key, ticket = ticket.id, "waiting for external metadata");
            return Ok(());
        };
        let source_layer = self.resolver.resolve(&ticket.url, fetcher);
        self.registry.complete(&mut self.engine, &ticket, &source_layer, visibility)
            .with_context(|| format!("[viewer] Failed to add layers for {key}"))?;
        Ok(())
    }
}
