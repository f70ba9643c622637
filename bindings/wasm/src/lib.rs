use wasm_bindgen::prelude::*;

mod common;
mod engine;
mod viewer;

pub use engine::JsMapEngine;
pub use viewer::WasmViewer;

/// Called automatically when the WASM module is instantiated.
/// Sets up panic hook so Rust panics appear as console.error in the browser,
/// and routes tracing output to the console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    fieldmap_core::logging::init_console(tracing::Level::INFO);
}
