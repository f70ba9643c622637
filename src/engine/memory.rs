use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Result};
use serde::Serialize;

use crate::config::CameraView;
use super::{LayerSpec, MapEngine, SourceSpec, Visibility};

/// One recorded engine mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EngineOp {
    AddProtocol { scheme: String },
    AddSource { id: String },
    RemoveSource { id: String },
    AddLayer { id: String },
    RemoveLayer { id: String },
    SetVisibility { id: String, visibility: Visibility },
    JumpTo { view: CameraView },
    FlyTo { view: CameraView, speed: f64 },
}

/// Serializable view of the engine's source/layer tables.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub protocols: Vec<String>,
    pub sources: BTreeMap<String, SourceSpec>,
    pub layers: Vec<LayerSpec>,
    pub camera: Option<CameraView>,
}

/// In-memory engine enforcing the same table rules as MapLibre:
/// duplicate ids are rejected, layers need an existing source, and a source
/// cannot be removed while layers still use it.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    protocols: BTreeSet<String>,
    sources: BTreeMap<String, SourceSpec>,
    layers: Vec<LayerSpec>,
    camera: Option<CameraView>,
    ops: Vec<EngineOp>,
    failing: BTreeSet<String>,
}

impl MemoryEngine {
    pub fn new() -> Self { Self::default() }

    /// Make every future add of `id` (source or layer) fail.
    pub fn fail_on(&mut self, id: impl Into<String>) {
        self.failing.insert(id.into());
    }

    pub fn ops(&self) -> &[EngineOp] { &self.ops }

    pub fn clear_ops(&mut self) { self.ops.clear() }

    pub fn source(&self, id: &str) -> Option<&SourceSpec> { self.sources.get(id) }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn source_ids(&self) -> Vec<&str> { self.sources.keys().map(String::as_str).collect() }

    /// Layer ids in draw order.
    pub fn layer_ids(&self) -> Vec<&str> { self.layers.iter().map(|layer| layer.id.as_str()).collect() }

    pub fn camera(&self) -> Option<&CameraView> { self.camera.as_ref() }

    pub fn has_protocol(&self, scheme: &str) -> bool { self.protocols.contains(scheme) }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            protocols: self.protocols.iter().cloned().collect(),
            sources: self.sources.clone(),
            layers: self.layers.clone(),
            camera: self.camera,
        }
    }
}

impl MapEngine for MemoryEngine {
    fn add_protocol(&mut self, scheme: &str) -> Result<()> {
        if !self.protocols.insert(scheme.to_string()) {
            bail!("Protocol {scheme} is already registered");
        }
        self.ops.push(EngineOp::AddProtocol { scheme: scheme.to_string() });
        Ok(())
    }

    fn add_source(&mut self, id: &str, spec: &SourceSpec) -> Result<()> {
        if self.failing.contains(id) {
            bail!("Engine refused source {id}");
        }
        if self.sources.contains_key(id) {
            bail!("There is already a source with ID \"{id}\"");
        }
        self.sources.insert(id.to_string(), spec.clone());
        self.ops.push(EngineOp::AddSource { id: id.to_string() });
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<()> {
        if !self.sources.contains_key(id) {
            bail!("There is no source with ID \"{id}\"");
        }
        if let Some(layer) = self.layers.iter().find(|layer| layer.source == id) {
            bail!("Source \"{id}\" cannot be removed while layer \"{}\" is using it", layer.id);
        }
        self.sources.remove(id);
        self.ops.push(EngineOp::RemoveSource { id: id.to_string() });
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool { self.sources.contains_key(id) }

    fn add_layer(&mut self, spec: &LayerSpec) -> Result<()> {
        if self.failing.contains(&spec.id) {
            bail!("Engine refused layer {}", spec.id);
        }
        if self.has_layer(&spec.id) {
            bail!("Layer with id \"{}\" already exists on this map", spec.id);
        }
        if !self.sources.contains_key(&spec.source) {
            bail!("Source \"{}\" not found for layer \"{}\"", spec.source, spec.id);
        }
        self.layers.push(spec.clone());
        self.ops.push(EngineOp::AddLayer { id: spec.id.clone() });
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<()> {
        let Some(index) = self.layers.iter().position(|layer| layer.id == id) else {
            bail!("The layer '{id}' does not exist in the map's style");
        };
        self.layers.remove(index);
        self.ops.push(EngineOp::RemoveLayer { id: id.to_string() });
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool { self.layers.iter().any(|layer| layer.id == id) }

    fn set_visibility(&mut self, layer_id: &str, visibility: Visibility) -> Result<()> {
        let Some(layer) = self.layers.iter_mut().find(|layer| layer.id == layer_id) else {
            bail!("The layer '{layer_id}' does not exist in the map's style");
        };
        layer.layout.visibility = visibility;
        self.ops.push(EngineOp::SetVisibility { id: layer_id.to_string(), visibility });
        Ok(())
    }

    fn jump_to(&mut self, view: &CameraView) -> Result<()> {
        self.camera = Some(*view);
        self.ops.push(EngineOp::JumpTo { view: *view });
        Ok(())
    }

    fn fly_to(&mut self, view: &CameraView, speed: f64) -> Result<()> {
        self.camera = Some(*view);
        self.ops.push(EngineOp::FlyTo { view: *view, speed });
        Ok(())
    }
}
