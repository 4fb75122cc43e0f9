//! bgm-daemon: seeded background music selection for observed game targets.
//!
//! This binary can run in several modes:
//! - Inspection: report unused tracks or per-track playlist usage
//! - Selection: resolve one target id and seed to a track
//! - Seed test: tabulate the seeded draw over seeds read from stdin
//! - Daemon mode: JSON-RPC server for a game-memory watcher

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bgm_daemon::catalog::Catalog;
use bgm_daemon::cli::{Cli, Mode};
use bgm_daemon::config::DaemonConfig;
use bgm_daemon::driver::{tabulate, LineSeedSource};
use bgm_daemon::inspect::{unused_tracks, Inspector};
use bgm_daemon::rpc::{run_server, ServerState};
use bgm_daemon::selection::{select_with_mode, SelectionMode};
use bgm_daemon::types::{TargetId, TrackId};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let config = build_config(&cli);

    init_tracing(&config.log_filter);

    if let Some(problem) = config.validate() {
        bail!("invalid configuration: {}", problem);
    }

    let mode = cli.mode().map_err(anyhow::Error::msg)?;
    match mode {
        Mode::Help => {
            print_usage();
            Ok(())
        }
        Mode::SeedTest { lo, hi, tries } => run_seed_test(lo, hi, tries),
        Mode::Inspect => run_inspect(&config),
        Mode::Usage(track_ids) => run_usage(&config, &track_ids),
        Mode::Select { target_id, seed } => run_select(&config, target_id, seed),
        Mode::Daemon => run_daemon_mode(config),
    }
}

/// Environment first, then command-line flags on top.
fn build_config(cli: &Cli) -> DaemonConfig {
    let mut config = DaemonConfig::from_env();
    if let Some(ref path) = cli.config {
        config.config_path = Some(path.clone());
    }
    if let Some(ref filter) = cli.log_level {
        config.log_filter = filter.clone();
    }
    if cli.unseeded {
        config.selection_mode = SelectionMode::Unseeded;
    }
    config
}

/// Logs go to stderr; stdout carries reports and JSON-RPC traffic.
fn init_tracing(filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_catalog(config: &DaemonConfig) -> Result<(Catalog, PathBuf)> {
    let path = config.effective_config_path();
    info!("Loading playlist from {}", path.display());
    let catalog = Catalog::load_file(&path)
        .with_context(|| format!("failed to load playlist document {}", path.display()))?;
    Ok((catalog, path))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode report")?;
    println!("{}", json);
    Ok(())
}

/// Reports tracks that no playlist uses.
fn run_inspect(config: &DaemonConfig) -> Result<()> {
    let (catalog, _) = load_catalog(config)?;
    let report = unused_tracks(&catalog);
    report.log();
    print_json(&report)
}

/// Reports which playlists use each given track.
fn run_usage(config: &DaemonConfig, track_ids: &[TrackId]) -> Result<()> {
    let (catalog, _) = load_catalog(config)?;
    let reports = Inspector::new(&catalog).usage_many(track_ids);
    for report in &reports {
        report.log();
    }
    print_json(&reports)
}

/// Resolves one target id and prints the chosen track.
fn run_select(config: &DaemonConfig, target_id: TargetId, seed: Option<u32>) -> Result<()> {
    let (catalog, _) = load_catalog(config)?;
    let selected = select_with_mode(
        &catalog,
        config.selection_mode,
        target_id,
        seed.unwrap_or_default(),
    )?;

    match selected {
        Some(track) => {
            info!("Selected {}", track);
            print_json(&track.descriptor())
        }
        None => {
            warn!("No music entry found for music id {:#x}.", target_id);
            println!("null");
            Ok(())
        }
    }
}

/// Tabulates the seeded draw over seeds read from stdin.
fn run_seed_test(lo: u64, hi: u64, tries: u32) -> Result<()> {
    let stdin = io::stdin();
    let mut source = LineSeedSource::new(stdin.lock());
    let distribution = tabulate(lo, hi, &mut source, tries);
    distribution.log();
    print_json(&distribution)
}

/// Runs the daemon mode (JSON-RPC server).
fn run_daemon_mode(config: DaemonConfig) -> Result<()> {
    info!("=== bgm-daemon JSON-RPC Server ===");
    info!("Reading from stdin, writing to stdout.");

    let (catalog, path) = load_catalog(&config)?;
    info!(
        "Selection mode: {}, ignored targets: {:x?}",
        config.selection_mode, config.ignored_target_ids
    );

    let state = ServerState::new(config, catalog, path);
    run_server(state)?;
    Ok(())
}

/// Prints usage information.
fn print_usage() {
    eprintln!("bgm-daemon: seeded background music selection");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  Report unused tracks:");
    eprintln!("    bgm-daemon --config config.toml --inspect");
    eprintln!();
    eprintln!("  Show which playlists use tracks:");
    eprintln!("    bgm-daemon --usage 0x10 0x11");
    eprintln!();
    eprintln!("  Pick a track for a target id and seed:");
    eprintln!("    bgm-daemon --target 0x2a --seed 0xabcd");
    eprintln!();
    eprintln!("  Check the seeded draw over observed seeds (one per line on stdin):");
    eprintln!("    bgm-daemon --seed-test --range-min 0 --range-max 9 --tries 100 < seeds.txt");
    eprintln!();
    eprintln!("  Daemon mode (JSON-RPC server):");
    eprintln!("    bgm-daemon --daemon");
    eprintln!();
    eprintln!("Run 'bgm-daemon --help' for full options.");
}
