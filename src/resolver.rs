use std::collections::HashMap;

use serde_json::Value;

use crate::archive::MetadataFetcher;

/// Used when the archive metadata names no layer at all.
pub const FALLBACK_SOURCE_LAYER: &str = "tiles";

/// Pick the source-layer name out of archive metadata:
/// first `vector_layers[].id`, then `name`, then [`FALLBACK_SOURCE_LAYER`].
pub fn source_layer_from_metadata(metadata: Option<&Value>) -> String {
    let non_empty = |v: Option<&Value>| v.and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_string);

    metadata
        .and_then(|md| {
            non_empty(md.pointer("/vector_layers/0/id"))
                .or_else(|| non_empty(md.get("name")))
        })
        .unwrap_or_else(|| FALLBACK_SOURCE_LAYER.to_string())
}

/// Memoizes the source-layer name per archive URL. Entries are never
/// invalidated; an archive URL is assumed to have an immutable schema.
#[derive(Debug, Default)]
pub struct SourceLayerResolver {
    cache: HashMap<String, String>,
}

impl SourceLayerResolver {
    pub fn new() -> Self { Self::default() }

    pub fn cached(&self, url: &str) -> Option<&str> {
        self.cache.get(url).map(String::as_str)
    }

    /// Resolve with the given fetcher on a cache miss. Fetch failures degrade
    /// to the fallback name and are cached like any other result.
    pub fn resolve(&mut self, url: &str, fetcher: &dyn MetadataFetcher) -> String {
        if let Some(name) = self.cached(url) {
            return name.to_string();
        }
        let metadata = match fetcher.fetch_metadata(url) {
            Ok(md) => Some(md),
            Err(e) => {
                tracing::warn!(url, error = %e, "archive metadata unavailable, using fallback source layer");
                None
            }
        };
        self.record(url, metadata.as_ref())
    }

    /// Cache the name derived from metadata fetched elsewhere (e.g. by the browser).
    /// An existing entry wins, so every caller sees the same name for a URL.
    pub fn record(&mut self, url: &str, metadata: Option<&Value>) -> String {
        self.cache
            .entry(url.to_string())
            .or_insert_with(|| source_layer_from_metadata(metadata))
            .clone()
    }

    pub fn len(&self) -> usize { self.cache.len() }

    pub fn is_empty(&self) -> bool { self.cache.is_empty() }
}
