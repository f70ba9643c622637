#![doc = "fieldmap public API"]
pub mod archive;
pub mod config;
pub mod engine;
pub mod landcover;
pub mod layer;
#[cfg(feature = "wasm-console")]
pub mod logging;
pub mod panel;
pub mod resolver;
pub mod selection;
mod viewer;

#[doc(inline)]
pub use archive::{ArchiveHeader, MemArchive, MetadataFetcher};

#[cfg(feature = "download")]
#[doc(inline)]
pub use archive::HttpArchive;

#[cfg(feature = "pmtiles")]
#[doc(inline)]
pub use archive::FileArchive;

#[doc(inline)]
pub use config::{CameraView, Sources, ViewerConfig};

#[doc(inline)]
pub use engine::{EngineSnapshot, LayerSpec, MapEngine, MemoryEngine, SourceSpec, Visibility};

#[doc(inline)]
pub use layer::{LayerKey, LayerRegistry, LayerType, ResolveTicket};

#[doc(inline)]
pub use panel::{Checkbox, Panel, PanelKind};

#[doc(inline)]
pub use selection::ViewState;

#[doc(inline)]
pub use viewer::{UiEvent, Viewer, BASEMAP_ID};
