//! Seam between the viewer and the external map engine.
//!
//! The viewer never renders anything itself. It only creates and removes
//! sources and layers, flips visibility and moves the camera through
//! [`MapEngine`]. [`MemoryEngine`] records those calls for headless runs.

mod memory;
mod style;

use anyhow::Result;

use crate::config::CameraView;

pub use memory::{EngineOp, EngineSnapshot, MemoryEngine};
pub use style::{FillPaint, Layout, LayerSpec, LinePaint, Paint, SourceSpec, Visibility};

/// Imperative map engine API (a MapLibre `Map`, or an in-memory stand-in).
pub trait MapEngine {
    /// Register a custom URL scheme handler (`pmtiles`, `cog`).
    fn add_protocol(&mut self, scheme: &str) -> Result<()>;

    fn add_source(&mut self, id: &str, spec: &SourceSpec) -> Result<()>;
    fn remove_source(&mut self, id: &str) -> Result<()>;
    fn has_source(&self, id: &str) -> bool;

    fn add_layer(&mut self, spec: &LayerSpec) -> Result<()>;
    fn remove_layer(&mut self, id: &str) -> Result<()>;
    fn has_layer(&self, id: &str) -> bool;

    fn set_visibility(&mut self, layer_id: &str, visibility: Visibility) -> Result<()>;

    /// Move the camera without animation.
    fn jump_to(&mut self, view: &CameraView) -> Result<()>;
    /// Animated camera transition.
    fn fly_to(&mut self, view: &CameraView, speed: f64) -> Result<()>;
}
