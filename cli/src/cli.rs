use std::path::PathBuf;

/// Field boundary / landcover viewer tooling
#[derive(clap::Parser, Debug)]
#[command(name = "fieldmap", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Validate a viewer config and list its datasets
    Check(CheckArgs),

    /// Print the header and source layer of a PMTiles archive
    Inspect(InspectArgs),

    /// Replay UI events against an in-memory map and print the result
    Session(SessionArgs),
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Viewer config (JSON); the built-in dataset when omitted
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// Archive URL (http/https) or local path
    pub archive: String,
}

#[derive(clap::Args, Debug)]
pub struct SessionArgs {
    /// Events file: a JSON array of UI events
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub events: PathBuf,

    /// Viewer config (JSON); the built-in dataset when omitted
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Archive metadata keyed by URL (JSON object) instead of fetching over HTTP
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub metadata: Option<PathBuf>,

    /// Do not resolve source layers; leave them pending
    #[arg(long, conflicts_with = "metadata")]
    pub offline: bool,

    /// Output file, defaults to stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
