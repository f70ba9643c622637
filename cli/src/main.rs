mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{check, inspect, session};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise the level follows `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match &cli.command {
        Commands::Check(args) => check::run(&cli, args),
        Commands::Inspect(args) => inspect::run(&cli, args),
        Commands::Session(args) => session::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
