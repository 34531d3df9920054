use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use log::{LevelFilter, debug, error};

use mdd_inspect::archive::{self, ArchiveOpener};
use mdd_inspect::report::Printer;
use mdd_inspect::{
    InspectError, ListingLimits, Orchestrator, Platform, PlaybackConfig, SystemRunner, app,
};

#[derive(Debug, Parser)]
#[command(name = "mdd-inspect", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct App {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Summarise the resources of an .mdd file by type.
    #[command(alias = "s", name = "show")]
    Show {
        /// Path to the .mdd file.
        path: Option<PathBuf>,
    },
    /// Play the audio entries of an .mdd file one after another.
    #[command(alias = "p", name = "play")]
    Play {
        /// Path to the .mdd file.
        path: PathBuf,
        /// Play at most N audio entries.
        #[arg(long, value_name = "N", conflicts_with = "all")]
        limit: Option<usize>,
        /// Play every audio entry.
        #[arg(long)]
        all: bool,
        /// Candidate player, tried in the order given. Replaces the Linux defaults.
        #[arg(long = "player", value_name = "NAME")]
        players: Vec<String>,
    },
}

fn main() -> ExitCode {
    let args = App::parse();
    init_logging(args.verbose);

    let stdout = io::stdout();
    let result = match args.cmd {
        Commands::Show { path: None } => return print_show_usage(),
        Commands::Show { path: Some(path) } => show(&path, stdout.lock()),
        Commands::Play {
            path,
            limit,
            all,
            players,
        } => {
            let mut config = PlaybackConfig::default();
            if all {
                config.limit = None;
            } else if limit.is_some() {
                config.limit = limit;
            }
            if !players.is_empty() {
                config.linux_players = players;
            }
            play(&path, config, stdout.lock())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let mut printer = Printer::new(stdout.lock(), ListingLimits::default());
            if let Err(write_err) = printer.error(&e) {
                error!("Could not print diagnostic: {}", write_err);
            }
            exit_code_for(&e)
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose && std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn print_show_usage() -> ExitCode {
    let mut cmd = App::command();
    let printed = match cmd.find_subcommand_mut("show") {
        Some(show) => show.print_help(),
        None => cmd.print_help(),
    };
    match printed {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn show<W: Write>(path: &Path, out: W) -> Result<(), InspectError> {
    let opener = backend()?;
    let counts = app::inspect(&opener, path, ListingLimits::default(), out)?;
    debug!("Category counts: {:?}", counts);
    Ok(())
}

fn play<W: Write>(path: &Path, config: PlaybackConfig, out: W) -> Result<(), InspectError> {
    let opener = backend()?;
    let platform = Platform::current();
    debug!("Detected platform: {}", platform);
    let orchestrator = Orchestrator::new(platform, SystemRunner, config);
    let summary = app::play(&opener, path, &orchestrator, out)?;
    debug!("Playback summary: {:?}", summary);
    Ok(())
}

#[cfg(feature = "mdict")]
fn backend() -> Result<impl ArchiveOpener, InspectError> {
    archive::probe().require()?;
    Ok(archive::MddOpener)
}

#[cfg(not(feature = "mdict"))]
fn backend() -> Result<impl ArchiveOpener, InspectError> {
    archive::probe().require()?;
    Ok(Unavailable)
}

/// Placeholder opener for builds without a backend. `probe` rejects it first.
#[cfg(not(feature = "mdict"))]
struct Unavailable;

#[cfg(not(feature = "mdict"))]
impl ArchiveOpener for Unavailable {
    type Archive = archive::MemoryArchive;

    fn open(&self, _path: &Path) -> Result<Self::Archive, InspectError> {
        Err(InspectError::ArchiveUnavailable(
            "built without the `mdict` feature".to_string(),
        ))
    }
}

/// Graceful conditions exit 0. A broken archive or report exits 1.
fn exit_code_for(err: &InspectError) -> ExitCode {
    match err {
        InspectError::ArchiveUnavailable(_) | InspectError::FileNotFound(_) => ExitCode::SUCCESS,
        InspectError::Decode { .. } | InspectError::Report(_) => ExitCode::FAILURE,
    }
}
