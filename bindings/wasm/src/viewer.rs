use fieldmap_core::{PanelKind, UiEvent, Viewer, ViewerConfig};
use wasm_bindgen::{JsValue, prelude::wasm_bindgen};

use crate::{common::*, engine::JsMapEngine};

#[wasm_bindgen]
pub struct WasmViewer {
    inner: Viewer<JsMapEngine>,
}

fn panel_or_null(panel: Option<fieldmap_core::Panel>) -> Result<JsValue, JsValue> {
    match panel {
        Some(panel) => to_js(&panel).map_err(js_err),
        None => Ok(JsValue::NULL),
    }
}

#[wasm_bindgen]
impl WasmViewer {
    /// Bootstrap the viewer on a MapLibre map.
    /// config: viewer config object, or null/undefined for the built-in dataset.
    #[wasm_bindgen(constructor)]
    pub fn new(engine: JsMapEngine, config: JsValue) -> Result<WasmViewer, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            ViewerConfig::builtin().map_err(js_err)?
        } else {
            let config: ViewerConfig = from_js(config).map_err(js_err)?;
            config.validate().map_err(js_err)?;
            config
        };
        let inner = Viewer::new(config, engine, None).map_err(js_err)?;
        Ok(WasmViewer { inner })
    }

    /// Call from the map's `load` event.
    pub fn on_load(&mut self) { self.inner.on_load(); }

    pub fn select_country(&mut self, name: &str, checked: bool) { self.inner.select_country(name, checked); }

    pub fn toggle_year(&mut self, year: &str, checked: bool) { self.inner.toggle_year(year, checked); }

    pub fn set_field_boundaries(&mut self, visible: bool) { self.inner.set_field_boundaries(visible); }

    pub fn set_landcover(&mut self, on: bool) { self.inner.set_landcover(on); }

    /// Toolbar click. Returns the opened panel, or null when it closed.
    pub fn toggle_panel(&mut self, kind: &str) -> Result<JsValue, JsValue> {
        let kind: PanelKind = kind.parse().map_err(js_err)?;
        panel_or_null(self.inner.toggle_panel(kind))
    }

    /// The open panel rebuilt from current state, or null.
    pub fn open_panel(&self) -> Result<JsValue, JsValue> {
        panel_or_null(self.inner.open_panel())
    }

    /// Dispatch an event object such as `{ event: "year", year: "2020", checked: true }`.
    pub fn handle(&mut self, event: JsValue) -> Result<JsValue, JsValue> {
        let event: UiEvent = from_js(event).map_err(js_err)?;
        panel_or_null(self.inner.handle(&event))
    }

    /// Source-layer lookups the page must fetch metadata for: `[{ id, key, url }]`.
    pub fn pending_tickets(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.pending_tickets()).map_err(js_err)
    }

    /// Hand back archive metadata (or null if the fetch failed) for a ticket.
    /// Returns false when the layer was unchecked in the meantime.
    pub fn complete_resolve(&mut self, ticket: u32, metadata: JsValue) -> Result<bool, JsValue> {
        let metadata: Option<serde_json::Value> = if metadata.is_undefined() || metadata.is_null() {
            None
        } else {
            Some(from_js(metadata).map_err(js_err)?)
        };
        self.inner.complete_resolve(ticket.into(), metadata.as_ref()).map_err(js_err)
    }

    /// Current view state as a plain object.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.state()).map_err(js_err)
    }
}
