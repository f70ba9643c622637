use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use crate::config::ViewerConfig;
use crate::engine::{LayerSpec, MapEngine, SourceSpec, Visibility};
use crate::resolver::SourceLayerResolver;
use super::{LayerKey, LayerRecord};

/// Handle for a source-layer lookup still in flight. Completing a ticket
/// whose entry was removed or re-added in the meantime is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveTicket {
    pub id: u64,
    pub key: LayerKey,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Key was already registered (ready or pending).
    AlreadyPresent,
    /// Source and both visual layers were created.
    Added,
    /// Source was created; visual layers wait for the source-layer name.
    Pending(ResolveTicket),
}

#[derive(Debug)]
enum Entry {
    Pending { source_id: String, ticket: ResolveTicket },
    Ready(LayerRecord),
}

/// Tracks which engine objects exist for each [`LayerKey`].
#[derive(Debug, Default)]
pub struct LayerRegistry {
    entries: BTreeMap<LayerKey, Entry>,
    next_ticket: u64,
}

impl LayerRegistry {
    pub fn new() -> Self { Self::default() }

    /// Create the vector source for `key`, and its fill and line layers once
    /// the source-layer name is known. No-op if the key is registered.
    /// A missing config entry fails before any engine mutation.
    pub fn add(
        &mut self,
        engine: &mut dyn MapEngine,
        config: &ViewerConfig,
        resolver: &SourceLayerResolver,
        key: LayerKey,
        visibility: Visibility,
    ) -> Result<AddOutcome> {
        if self.entries.contains_key(&key) {
            return Ok(AddOutcome::AlreadyPresent);
        }
        let url = config.tile_url(&key.country, key.year())?.to_string();

        let source_id = key.source_id();
        if !engine.has_source(&source_id) {
            engine.add_source(&source_id, &SourceSpec::pmtiles(&url))?;
            tracing::debug!(source = %source_id, "added vector source");
        }

        match resolver.cached(&url) {
            Some(source_layer) => {
                let record = build_layers(engine, &key, source_layer, visibility)
                    .inspect_err(|_| discard(engine, &key))?;
                self.entries.insert(key, Entry::Ready(record));
                Ok(AddOutcome::Added)
            }
            None => {
                self.next_ticket += 1;
                let ticket = ResolveTicket { id: self.next_ticket, key: key.clone(), url };
                self.entries.insert(key, Entry::Pending { source_id, ticket: ticket.clone() });
                Ok(AddOutcome::Pending(ticket))
            }
        }
    }

    /// Finish a pending add. Returns `false` when the ticket is stale and
    /// nothing was created.
    pub fn complete(
        &mut self,
        engine: &mut dyn MapEngine,
        ticket: &ResolveTicket,
        source_layer: &str,
        visibility: Visibility,
    ) -> Result<bool> {
        match self.entries.get(&ticket.key) {
            Some(Entry::Pending { ticket: current, .. }) if current.id == ticket.id => {}
            _ => {
                tracing::debug!(key = %ticket.key, ticket = ticket.id, "dropping stale source-layer result");
                return Ok(false);
            }
        }

        match build_layers(engine, &ticket.key, source_layer, visibility) {
            Ok(record) => {
                self.entries.insert(ticket.key.clone(), Entry::Ready(record));
                Ok(true)
            }
            Err(e) => {
                discard(engine, &ticket.key);
                self.entries.remove(&ticket.key);
                Err(e)
            }
        }
    }

    /// Remove line layer, fill layer, then source, and forget the key.
    /// Removing a pending key cancels its ticket.
    pub fn remove(&mut self, engine: &mut dyn MapEngine, key: &LayerKey) -> Result<bool> {
        let Some(entry) = self.entries.get(key) else {
            return Ok(false);
        };
        match entry {
            Entry::Ready(record) => {
                remove_layer_if_present(engine, &record.line_layer_id)?;
                remove_layer_if_present(engine, &record.fill_layer_id)?;
                remove_source_if_present(engine, &record.source_id)?;
            }
            Entry::Pending { source_id, .. } => {
                remove_source_if_present(engine, source_id)?;
            }
        }
        self.entries.remove(key);
        tracing::debug!(key = %key, "removed layer set");
        Ok(true)
    }

    /// Remove every key belonging to `country`.
    pub fn remove_country(&mut self, engine: &mut dyn MapEngine, country: &str) -> Result<()> {
        for key in self.keys_for_country(country) {
            self.remove(engine, &key)?;
        }
        Ok(())
    }

    /// Apply `visibility` to every registered fill/line pair.
    pub fn set_visibility(&self, engine: &mut dyn MapEngine, visibility: Visibility) -> Result<()> {
        for record in self.records() {
            for id in [&record.fill_layer_id, &record.line_layer_id] {
                if engine.has_layer(id) {
                    engine.set_visibility(id, visibility)?;
                }
            }
        }
        Ok(())
    }

    pub fn contains(&self, key: &LayerKey) -> bool { self.entries.contains_key(key) }

    pub fn is_ready(&self, key: &LayerKey) -> bool {
        matches!(self.entries.get(key), Some(Entry::Ready(_)))
    }

    pub fn is_pending(&self, key: &LayerKey) -> bool {
        matches!(self.entries.get(key), Some(Entry::Pending { .. }))
    }

    pub fn record(&self, key: &LayerKey) -> Option<&LayerRecord> {
        match self.entries.get(key) {
            Some(Entry::Ready(record)) => Some(record),
            _ => None,
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &LayerRecord> {
        self.entries.values().filter_map(|entry| match entry {
            Entry::Ready(record) => Some(record),
            Entry::Pending { .. } => None,
        })
    }

    /// Tickets of all pending entries, oldest first.
    pub fn pending(&self) -> Vec<ResolveTicket> {
        let mut tickets: Vec<ResolveTicket> = self.entries.values()
            .filter_map(|entry| match entry {
                Entry::Pending { ticket, .. } => Some(ticket.clone()),
                Entry::Ready(_) => None,
            })
            .collect();
        tickets.sort_by_key(|ticket| ticket.id);
        tickets
    }

    pub fn keys(&self) -> impl Iterator<Item = &LayerKey> { self.entries.keys() }

    pub fn keys_for_country(&self, country: &str) -> Vec<LayerKey> {
        self.entries.keys().filter(|key| key.country == country).cloned().collect()
    }

    /// Registered years of `country`, sorted. Year-less keys are skipped.
    pub fn years_for(&self, country: &str) -> Vec<&str> {
        self.entries.keys()
            .filter(|key| key.country == country)
            .filter_map(LayerKey::year)
            .collect()
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

fn build_layers(
    engine: &mut dyn MapEngine,
    key: &LayerKey,
    source_layer: &str,
    visibility: Visibility,
) -> Result<LayerRecord> {
    let record = LayerRecord {
        source_id: key.source_id(),
        fill_layer_id: key.fill_layer_id(),
        line_layer_id: key.line_layer_id(),
        source_layer: source_layer.to_string(),
    };
    if !engine.has_layer(&record.fill_layer_id) {
        engine.add_layer(&LayerSpec::boundary_fill(&record.fill_layer_id, &record.source_id, source_layer, visibility))?;
    }
    if !engine.has_layer(&record.line_layer_id) {
        engine.add_layer(&LayerSpec::boundary_line(&record.line_layer_id, &record.source_id, source_layer, visibility))?;
    }
    Ok(record)
}

/// Best-effort cleanup of whatever a failed add left behind.
fn discard(engine: &mut dyn MapEngine, key: &LayerKey) {
    if let Err(e) = remove_all(engine, key) {
        tracing::warn!(key = %key, error = %e, "could not clean up partially created layer set");
    }
}

fn remove_all(engine: &mut dyn MapEngine, key: &LayerKey) -> Result<()> {
    remove_layer_if_present(engine, &key.line_layer_id())?;
    remove_layer_if_present(engine, &key.fill_layer_id())?;
    remove_source_if_present(engine, &key.source_id())
}

fn remove_layer_if_present(engine: &mut dyn MapEngine, id: &str) -> Result<()> {
    if engine.has_layer(id) {
        engine.remove_layer(id)?;
    }
    Ok(())
}

fn remove_source_if_present(engine: &mut dyn MapEngine, id: &str) -> Result<()> {
    if engine.has_source(id) {
        engine.remove_source(id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::engine::MemoryEngine;

    fn config() -> ViewerConfig {
        ViewerConfig::from_json_str(r#"{
            "pmtiles_sources": {
                "Zambia": { "2018": "https://x/z2018.pmtiles", "2020": "https://x/z2020.pmtiles" },
                "Congo": "https://x/congo.pmtiles"
            },
            "initial_view": { "center": [0, 0], "zoom": 2 },
            "basemap": { "tiles": ["https://tiles/{z}/{x}/{y}"] }
        }"#).unwrap()
    }

    fn warm_resolver() -> SourceLayerResolver {
        let mut resolver = SourceLayerResolver::new();
        for url in ["https://x/z2018.pmtiles", "https://x/z2020.pmtiles", "https://x/congo.pmtiles"] {
            resolver.record(url, Some(&json!({ "vector_layers": [{ "id": "fields" }] })));
        }
        resolver
    }

    #[test]
    fn add_then_remove_leaves_nothing() {
        let (config, resolver) = (config(), warm_resolver());
        let mut engine = MemoryEngine::new();
        let mut registry = LayerRegistry::new();
        let key = LayerKey::pmtiles("Zambia", Some("2020"));

        let outcome = registry.add(&mut engine, &config, &resolver, key.clone(), Visibility::Visible).unwrap();
        assert_eq!(outcome, AddOutcome::Added);
        assert_eq!(engine.source_ids(), vec!["src-Zambia-pmtiles-2020"]);
        assert_eq!(engine.layer_ids(), vec!["fill-Zambia-pmtiles-2020", "line-Zambia-pmtiles-2020"]);
        assert_eq!(registry.record(&key).unwrap().source_layer, "fields");

        assert!(registry.remove(&mut engine, &key).unwrap());
        assert!(engine.source_ids().is_empty());
        assert!(engine.layer_ids().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn add_is_idempotent() {
        let (config, resolver) = (config(), warm_resolver());
        let mut engine = MemoryEngine::new();
        let mut registry = LayerRegistry::new();
        let key = LayerKey::pmtiles("Zambia", Some("2018"));

        registry.add(&mut engine, &config, &resolver, key.clone(), Visibility::Visible).unwrap();
        let ops = engine.ops().len();
        let again = registry.add(&mut engine, &config, &resolver, key, Visibility::Visible).unwrap();
        assert_eq!(again, AddOutcome::AlreadyPresent);
        assert_eq!(engine.ops().len(), ops);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_of_unknown_key_is_noop() {
        let mut engine = MemoryEngine::new();
        let mut registry = LayerRegistry::new();
        assert!(!registry.remove(&mut engine, &LayerKey::pmtiles("Zambia", Some("2018"))).unwrap());
        assert!(engine.ops().is_empty());
    }

    #[test]
    fn missing_config_mutates_nothing() {
        let (config, resolver) = (config(), warm_resolver());
        let mut engine = MemoryEngine::new();
        let mut registry = LayerRegistry::new();

        let err = registry.add(&mut engine, &config, &resolver, LayerKey::pmtiles("Zambia", Some("1999")), Visibility::Visible);
        assert!(err.is_err());
        assert!(engine.ops().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn engine_failure_leaves_no_entry_and_no_objects() {
        let (config, resolver) = (config(), warm_resolver());
        let mut engine = MemoryEngine::new();
        engine.fail_on("line-Zambia-pmtiles-2020");
        let mut registry = LayerRegistry::new();
        let key = LayerKey::pmtiles("Zambia", Some("2020"));

        assert!(registry.add(&mut engine, &config, &resolver, key.clone(), Visibility::Visible).is_err());
        assert!(!registry.contains(&key));
        assert!(engine.source_ids().is_empty());
        assert!(engine.layer_ids().is_empty());
    }

    #[test]
    fn visibility_follows_latest_call() {
        let (config, resolver) = (config(), warm_resolver());
        let mut engine = MemoryEngine::new();
        let mut registry = LayerRegistry::new();
        let a = LayerKey::pmtiles("Zambia", Some("2018"));
        let b = LayerKey::pmtiles("Zambia", Some("2020"));
        let c = LayerKey::pmtiles("Congo", None);

        registry.add(&mut engine, &config, &resolver, a.clone(), Visibility::None).unwrap();
        registry.add(&mut engine, &config, &resolver, b, Visibility::Visible).unwrap();
        registry.add(&mut engine, &config, &resolver, c, Visibility::None).unwrap();
        registry.remove(&mut engine, &a).unwrap();

        for visible in [true, false, true] {
            registry.set_visibility(&mut engine, visible.into()).unwrap();
            for id in engine.layer_ids() {
                assert_eq!(engine.layer(id).unwrap().layout.visibility.is_visible(), visible, "{id}");
            }
        }
    }

    #[test]
    fn pending_add_completes_into_layers() {
        let config = config();
        let resolver = SourceLayerResolver::new();
        let mut engine = MemoryEngine::new();
        let mut registry = LayerRegistry::new();
        let key = LayerKey::pmtiles("Zambia", Some("2020"));

        let AddOutcome::Pending(ticket) = registry.add(&mut engine, &config, &resolver, key.clone(), Visibility::None).unwrap() else {
            panic!("expected a pending add");
        };
        assert_eq!(ticket.url, "https://x/z2020.pmtiles");
        assert!(registry.is_pending(&key));
        assert_eq!(engine.source_ids(), vec!["src-Zambia-pmtiles-2020"]);
        assert!(engine.layer_ids().is_empty());
        assert_eq!(registry.pending(), vec![ticket.clone()]);

        assert!(registry.complete(&mut engine, &ticket, "fields", Visibility::None).unwrap());
        assert!(registry.is_ready(&key));
        assert_eq!(engine.layer_ids().len(), 2);
        assert!(registry.pending().is_empty());
    }

    #[test]
    fn completion_after_remove_is_dropped() {
        let config = config();
        let resolver = SourceLayerResolver::new();
        let mut engine = MemoryEngine::new();
        let mut registry = LayerRegistry::new();
        let key = LayerKey::pmtiles("Zambia", Some("2020"));

        let AddOutcome::Pending(ticket) = registry.add(&mut engine, &config, &resolver, key.clone(), Visibility::None).unwrap() else {
            panic!("expected a pending add");
        };
        registry.remove(&mut engine, &key).unwrap();
        assert!(engine.source_ids().is_empty());

        assert!(!registry.complete(&mut engine, &ticket, "fields", Visibility::None).unwrap());
        assert!(engine.source_ids().is_empty());
        assert!(engine.layer_ids().is_empty());
        assert!(!registry.contains(&key));
    }

    #[test]
    fn completion_of_superseded_ticket_is_dropped() {
        let config = config();
        let resolver = SourceLayerResolver::new();
        let mut engine = MemoryEngine::new();
        let mut registry = LayerRegistry::new();
        let key = LayerKey::pmtiles("Zambia", Some("2020"));

        let AddOutcome::Pending(old) = registry.add(&mut engine, &config, &resolver, key.clone(), Visibility::None).unwrap() else {
            panic!("expected a pending add");
        };
        registry.remove(&mut engine, &key).unwrap();
        let AddOutcome::Pending(new) = registry.add(&mut engine, &config, &resolver, key.clone(), Visibility::None).unwrap() else {
            panic!("expected a pending add");
        };
        assert_ne!(old.id, new.id);

        assert!(!registry.complete(&mut engine, &old, "fields", Visibility::None).unwrap());
        assert!(registry.is_pending(&key));
        assert!(registry.complete(&mut engine, &new, "fields", Visibility::None).unwrap());
        assert_eq!(engine.layer_ids().len(), 2);
    }

    #[test]
    fn remove_country_clears_all_years() {
        let (config, resolver) = (config(), warm_resolver());
        let mut engine = MemoryEngine::new();
        let mut registry = LayerRegistry::new();
        for year in ["2018", "2020"] {
            registry.add(&mut engine, &config, &resolver, LayerKey::pmtiles("Zambia", Some(year)), Visibility::Visible).unwrap();
        }
        registry.add(&mut engine, &config, &resolver, LayerKey::pmtiles("Congo", None), Visibility::Visible).unwrap();

        assert_eq!(registry.years_for("Zambia"), vec!["2018", "2020"]);
        assert!(registry.years_for("Congo").is_empty());

        registry.remove_country(&mut engine, "Zambia").unwrap();
        assert_eq!(registry.keys().cloned().collect::<Vec<_>>(), vec![LayerKey::pmtiles("Congo", None)]);
        assert_eq!(engine.source_ids(), vec!["src-Congo-pmtiles"]);
    }
}
