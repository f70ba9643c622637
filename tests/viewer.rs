// Integration tests for the viewer against the built-in dataset:
//   bootstrap, default selection, year toggles, landcover, panels

use fieldmap::{
    engine::EngineOp, LayerKey, MemArchive, MemoryEngine, PanelKind, UiEvent, Viewer, ViewerConfig, BASEMAP_ID,
};
use serde_json::json;

fn archive(config: &ViewerConfig) -> MemArchive {
    let mut archive = MemArchive::default();
    for country in config.country_names() {
        for url in config.tile_sources(country).map(|s| s.urls()).unwrap_or_default() {
            archive.insert(url, json!({ "vector_layers": [{ "id": format!("{}_fields", country.to_lowercase()) }] }));
        }
    }
    archive
}

fn loaded_viewer() -> Viewer<MemoryEngine> {
    let config = ViewerConfig::builtin().unwrap();
    let archive = archive(&config);
    let mut viewer = Viewer::new(config, MemoryEngine::new(), Some(Box::new(archive))).unwrap();
    viewer.on_load();
    viewer
}

fn overlay_layers(viewer: &Viewer<MemoryEngine>) -> Vec<String> {
    viewer.engine().layer_ids().into_iter().filter(|id| *id != BASEMAP_ID).map(str::to_string).collect()
}

#[test]
fn load_shows_default_country_at_latest_year() {
    let viewer = loaded_viewer();
    assert_eq!(viewer.state().active_country(), Some("Zambia"));
    assert_eq!(overlay_layers(&viewer), vec!["fill-Zambia-pmtiles-2023", "line-Zambia-pmtiles-2023"]);

    let line = viewer.engine().layer("line-Zambia-pmtiles-2023").unwrap();
    assert_eq!(line.source_layer.as_deref(), Some("zambia_fields"));
    assert!(line.layout.visibility.is_visible());

    // the initial camera is kept
    let camera_ops = viewer.engine().ops().iter().filter(|op| matches!(op, EngineOp::JumpTo { .. } | EngineOp::FlyTo { .. })).count();
    assert_eq!(camera_ops, 1);
}

#[test]
fn year_on_then_off_leaves_no_residue() {
    let mut viewer = loaded_viewer();
    let before_sources: Vec<String> = viewer.engine().source_ids().into_iter().map(str::to_string).collect();
    let before_layers = overlay_layers(&viewer);

    viewer.toggle_year("2020", true);
    assert!(viewer.registry().is_ready(&LayerKey::pmtiles("Zambia", Some("2020"))));
    viewer.toggle_year("2020", false);

    let after_sources: Vec<String> = viewer.engine().source_ids().into_iter().map(str::to_string).collect();
    assert_eq!(after_sources, before_sources);
    assert_eq!(overlay_layers(&viewer), before_layers);
}

#[test]
fn switching_countries_keeps_earlier_layers() {
    let mut viewer = loaded_viewer();
    viewer.select_country("Ghana", true);
    viewer.select_country("Tanzania", true);

    assert_eq!(viewer.state().active_country(), Some("Tanzania"));
    assert!(viewer.registry().is_ready(&LayerKey::pmtiles("Ghana", None)));
    assert!(viewer.registry().is_ready(&LayerKey::pmtiles("Zambia", Some("2023"))));
    assert!(viewer.landcover().is_on("Tanzania"));

    viewer.select_country("Ghana", false);
    assert!(!viewer.registry().contains(&LayerKey::pmtiles("Ghana", None)));
    assert_eq!(viewer.state().active_country(), Some("Tanzania"));
}

#[test]
fn hiding_boundaries_hides_every_layer_including_new_ones() {
    let mut viewer = loaded_viewer();
    viewer.set_field_boundaries(false);
    viewer.select_country("Congo", true);
    viewer.select_country("Ghana", true);

    let layers = overlay_layers(&viewer);
    assert_eq!(layers.len(), 6);
    for id in layers {
        assert!(!viewer.engine().layer(&id).unwrap().layout.visibility.is_visible(), "{id}");
    }
}

#[test]
fn scripted_session_drives_panels() {
    let events: Vec<UiEvent> = serde_json::from_value(json!([
        { "event": "panel", "kind": "country" },
        { "event": "country", "name": "Zambia", "checked": false },
        { "event": "country", "name": "Zambia", "checked": true }
    ])).unwrap();

    let mut viewer = loaded_viewer();
    let opened: Vec<_> = events.iter().map(|event| viewer.handle(event)).collect();
    let countries = opened[0].as_ref().unwrap();
    assert!(countries.rows.iter().any(|row| row.id == "country-Zambia" && row.checked));

    // selecting the default country by hand opens the year panel
    assert_eq!(viewer.toolbar().current(), Some(PanelKind::Year));
    let years = viewer.open_panel().unwrap();
    assert_eq!(years.hint.as_deref(), Some("Zambia: 2018–2023."));
    let checked: Vec<&str> = years.rows.iter().filter(|row| row.checked).map(|row| row.label.as_str()).collect();
    assert_eq!(checked, vec!["2023"]);
}
