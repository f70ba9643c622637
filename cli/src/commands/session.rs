use std::{collections::HashMap, fs::File, io::{self, Write}, path::Path};

use anyhow::{Context, Result};
use fieldmap::{
    EngineSnapshot, HttpArchive, MemArchive, MemoryEngine, MetadataFetcher, Panel, ResolveTicket,
    UiEvent, ViewState, Viewer,
};
use serde::Serialize;

/// What a replayed session leaves behind.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub state: ViewState,
    pub engine: EngineSnapshot,
    pub pending: Vec<ResolveTicket>,
    pub panel: Option<Panel>,
}

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::SessionArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let events = read_events(&args.events)?;

    let fetcher: Option<Box<dyn MetadataFetcher>> = match (&args.metadata, args.offline) {
        (_, true) => None,
        (Some(path), false) => Some(Box::new(read_metadata(path)?)),
        (None, false) => Some(Box::new(HttpArchive::new()?)),
    };

    let report = replay(Viewer::new(config, MemoryEngine::new(), fetcher)?, &events);
    eprintln!("[session] replayed {} events", events.len());

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).with_context(|| format!("[session] Failed to create {}", path.display()))?),
        None => Box::new(io::stdout().lock()),
    };
    serde_json::to_writer_pretty(&mut out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn replay(mut viewer: Viewer<MemoryEngine>, events: &[UiEvent]) -> SessionReport {
    for event in events {
        tracing::debug!(?event, "replaying");
        viewer.handle(event);
    }
    SessionReport {
        state: viewer.state().clone(),
        pending: viewer.pending_tickets(),
        panel: viewer.open_panel(),
        engine: viewer.engine().snapshot(),
    }
}

fn read_events(path: &Path) -> Result<Vec<UiEvent>> {
    let file = File::open(path).with_context(|| format!("[session] Failed to open {}", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("[session] Invalid events file {}", path.display()))
}

fn read_metadata(path: &Path) -> Result<MemArchive> {
    let file = File::open(path).with_context(|| format!("[session] Failed to open {}", path.display()))?;
    let metadata: HashMap<String, serde_json::Value> = serde_json::from_reader(file)
        .with_context(|| format!("[session] Invalid metadata file {}", path.display()))?;
    Ok(MemArchive::new(metadata))
}
