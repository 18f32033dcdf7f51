#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::mpsc;
use tracing::{info, warn, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use dispconf::backend::SnapshotBackend;
use dispconf::store::{AcpiLid, FilerController};
use dispconf::{Direction, Session, Settings};

#[derive(Parser)]
#[command(name = "dispconf", version, about = "Display configuration with remembered layouts")]
struct Cli {
    /// Output snapshot to read and apply configs to
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Preference root, overrides the settings file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the config with stored preferences restored
    Show,
    /// Recompute the whole layout
    Optimize,
    /// Place all outputs side by side
    Extend {
        /// Grow towards the left instead of the right
        #[arg(long)]
        left: bool,
        /// Output to start from
        #[arg(long)]
        first: Option<i32>,
    },
    /// Mirror every output onto the primary
    Replicate,
    /// Turn off the built-in panel
    DisableEmbedded,
    /// Restore stored preferences and apply them
    Restore,
}

fn init_logging(level: &str) -> Result<()> {
    let log_level = match level {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if cli.verbose {
        settings.log_level = Some("debug".to_string());
    }
    if let Some(dir) = cli.data_dir {
        settings.data_dir = Some(dir);
    }
    let notes = settings.validate();
    init_logging(settings.log_level())?;
    for note in notes {
        warn!("{note}");
    }

    let backend = SnapshotBackend::load(&cli.snapshot)?;
    let paths = settings.store_paths()?;
    info!(root = %paths.root().display(), snapshot = %cli.snapshot.display(), "Starting");

    let store = FilerController::new(paths, Box::new(AcpiLid::new(&settings.lid_state_glob_root)));
    let mut session = Session::new(backend, store);
    session.set_validity_flags(settings.validity_flags());

    let (tx, rx) = mpsc::channel();
    session.subscribe(tx);

    let done = match cli.command {
        Command::Show => {
            let config = session.load()?;
            let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("{json}");
            true
        }
        Command::Restore => session.restore()?,
        Command::Optimize => {
            session.load()?;
            session.optimize()?
        }
        Command::Extend { left, first } => {
            session.load()?;
            let direction = if left { Direction::Left } else { Direction::Right };
            session.extend(direction, first)?
        }
        Command::Replicate => {
            session.load()?;
            session.replicate()?
        }
        Command::DisableEmbedded => {
            session.load()?;
            session.disable_embedded()?
        }
    };

    for event in rx.try_iter() {
        info!(
            config = %event.hash,
            cause = ?event.cause,
            added = event.changes.added.len(),
            removed = event.changes.removed.len(),
            changed = event.changes.changed.len(),
            persisted = event.persisted,
            "Config committed"
        );
    }

    if !done {
        warn!("Operation did not complete");
        std::process::exit(1);
    }
    Ok(())
}
