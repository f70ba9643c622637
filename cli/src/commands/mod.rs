pub mod check;
pub mod inspect;
pub mod session;

use std::path::Path;

use anyhow::Result;
use fieldmap::ViewerConfig;

/// Config from `path`, or the built-in dataset.
pub(crate) fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::from_path(path),
        None => ViewerConfig::builtin(),
    }
}
