use anyhow::{anyhow, Result};
use fieldmap_core::{config::CameraView, LayerSpec, MapEngine, SourceSpec, Visibility};
use js_sys::Reflect;
use serde_json::json;
use wasm_bindgen::{JsValue, prelude::wasm_bindgen};

use crate::common::*;

/// A MapLibre `Map` driven through its JS API.
#[wasm_bindgen]
pub struct JsMapEngine {
    map: JsValue,
    /// The `maplibregl` namespace, for `addProtocol`.
    maplibre: JsValue,
    /// `{ scheme: handler }` for every protocol the viewer registers.
    protocols: JsValue,
}

#[wasm_bindgen]
impl JsMapEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(map: JsValue, maplibre: JsValue, protocols: JsValue) -> JsMapEngine {
        JsMapEngine { map, maplibre, protocols }
    }
}

fn is_present(value: Result<JsValue>) -> bool {
    value.is_ok_and(|v| !v.is_undefined() && !v.is_null())
}

fn camera(view: &CameraView) -> serde_json::Value {
    json!({ "center": view.center, "zoom": view.zoom })
}

impl MapEngine for JsMapEngine {
    fn add_protocol(&mut self, scheme: &str) -> Result<()> {
        let handler = Reflect::get(&self.protocols, &JsValue::from_str(scheme))
            .map_err(|e| anyhow!("error getting protocol handler '{scheme}': {e:?}"))?;
        if handler.is_undefined() {
            return Err(anyhow!("No handler supplied for {scheme}:// protocol"));
        }
        call(&self.maplibre, "addProtocol", &[JsValue::from_str(scheme), handler])?;
        Ok(())
    }

    fn add_source(&mut self, id: &str, spec: &SourceSpec) -> Result<()> {
        call(&self.map, "addSource", &[JsValue::from_str(id), to_js(spec)?])?;
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<()> {
        call(&self.map, "removeSource", &[JsValue::from_str(id)])?;
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        is_present(call(&self.map, "getSource", &[JsValue::from_str(id)]))
    }

    fn add_layer(&mut self, spec: &LayerSpec) -> Result<()> {
        call(&self.map, "addLayer", &[to_js(spec)?])?;
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<()> {
        call(&self.map, "removeLayer", &[JsValue::from_str(id)])?;
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        is_present(call(&self.map, "getLayer", &[JsValue::from_str(id)]))
    }

    fn set_visibility(&mut self, layer_id: &str, visibility: Visibility) -> Result<()> {
        let args = [JsValue::from_str(layer_id), JsValue::from_str("visibility"), to_js(&visibility)?];
        call(&self.map, "setLayoutProperty", &args)?;
        Ok(())
    }

    fn jump_to(&mut self, view: &CameraView) -> Result<()> {
        call(&self.map, "jumpTo", &[to_js(&camera(view))?])?;
        Ok(())
    }

    fn fly_to(&mut self, view: &CameraView, speed: f64) -> Result<()> {
        let mut options = camera(view);
        options["speed"] = json!(speed);
        call(&self.map, "flyTo", &[to_js(&options)?])?;
        Ok(())
    }
}
