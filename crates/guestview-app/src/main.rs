mod cli;
mod scenario;
mod simulator;

use std::process::ExitCode;

use guestview_common::{GuestViewError, Result};
use guestview_config::GuestViewConfig;
use guestview_display::{DisplayOptions, DisplaySnapshot, SurfaceState};
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

use crate::simulator::Simulator;

const DEFAULT_LOG_DIRECTIVE: &str = "guestview=info";

fn init_logging(directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &cli::Args) -> Result<GuestViewConfig> {
    let config = match &args.config {
        Some(path) => guestview_config::load_from_path(path)?,
        None => guestview_config::load_config()?,
    };
    Ok(config)
}

fn main() -> ExitCode {
    let args = cli::parse();

    // Config decides the default log level, so load it before logging is up
    // and report any failure afterwards.
    let loaded = load_config(&args);
    let directive = match (&args.log_level, &loaded) {
        (Some(directive), _) => directive.clone(),
        (None, Ok(config)) => config.logging.level.directive().to_string(),
        (None, Err(_)) => DEFAULT_LOG_DIRECTIVE.to_string(),
    };
    init_logging(&directive);

    tracing::info!("guestview v{} starting...", env!("CARGO_PKG_VERSION"));
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        GuestViewConfig::default()
    });

    match run(&args, &config) {
        Ok(snapshot) => {
            print_snapshot(&snapshot, args.json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("guestview: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &cli::Args, config: &GuestViewConfig) -> Result<DisplaySnapshot> {
    let source = match &args.script {
        Some(path) => {
            tracing::info!("Running scenario {}", path.display());
            std::fs::read_to_string(path)?
        }
        None => {
            tracing::info!("Running built-in demo scenario");
            scenario::DEMO.to_string()
        }
    };
    let commands = scenario::parse(&source).map_err(|e| GuestViewError::Other(e.to_string()))?;
    tracing::debug!(commands = commands.len(), "scenario parsed");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = LocalSet::new();
    let options = DisplayOptions::from(config);

    local.block_on(&runtime, async move {
        let mut sim = Simulator::new(options)?;
        sim.run(&commands).await?;
        tracing::info!(snapshots = sim.snapshots().len(), "scenario finished");
        Ok::<_, GuestViewError>(sim.snapshot())
    })
}

fn print_snapshot(snapshot: &DisplaySnapshot, json: bool) {
    if json {
        match serde_json::to_string_pretty(snapshot) {
            Ok(text) => println!("{text}"),
            Err(e) => tracing::error!("Failed to serialize snapshot: {e}"),
        }
        return;
    }

    println!("phase:        {:?}", snapshot.phase);
    match snapshot.active_guest {
        Some(guest) => println!("active guest: {guest}"),
        None => println!("active guest: none"),
    }
    println!(
        "surfaces:     {} created, {} free, {} attached",
        snapshot.created,
        snapshot.free,
        snapshot.count(SurfaceState::Attached)
    );
    if snapshot.disposed {
        println!("display torn down");
    }
}
