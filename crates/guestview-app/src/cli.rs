use std::path::PathBuf;

use clap::Parser;

/// guestview: drive a pooled guest display from a scenario script.
#[derive(Parser, Debug)]
#[command(name = "guestview", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter directive override (e.g. `guestview=debug`).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Scenario file to run instead of the built-in demo.
    #[arg(short = 's', long)]
    pub script: Option<PathBuf>,

    /// Print the final snapshot as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
