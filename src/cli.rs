//! CLI argument parser.
//!
//! One-shot modes for checking a playlist document and the seeded draw,
//! plus the long-running daemon mode.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::driver::parse_seed;
use crate::types::{parse_id, TargetId, TrackId};

/// Default number of draws for `--seed-test`.
pub const DEFAULT_SEED_TEST_TRIES: u32 = 100;

/// bgm-daemon: seeded background music selection for observed game targets
#[derive(Parser, Debug)]
#[command(name = "bgm-daemon")]
#[command(about = "Resolves observed game music ids to playlist tracks")]
#[command(version)]
#[command(group(
    ArgGroup::new("mode").args(["inspect", "usage", "target", "seed_test", "daemon"])
))]
pub struct Cli {
    /// Playlist document (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "bgm_daemon=trace"
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use a local random generator instead of the observed seed
    #[arg(long)]
    pub unseeded: bool,

    /// Report tracks that no playlist uses
    #[arg(long)]
    pub inspect: bool,

    /// Report which playlists use the given track ids
    #[arg(long, num_args = 1.., value_parser = parse_id_arg)]
    pub usage: Vec<TrackId>,

    /// Select a track for this target id
    #[arg(long, value_parser = parse_id_arg)]
    pub target: Option<TargetId>,

    /// Observed seed for --target
    #[arg(long, value_parser = parse_seed_arg)]
    pub seed: Option<u32>,

    /// Tabulate the seeded draw over seeds read from stdin
    #[arg(long)]
    pub seed_test: bool,

    /// Lower bound of the --seed-test range
    #[arg(long, value_parser = parse_id_arg)]
    pub range_min: Option<u64>,

    /// Upper bound of the --seed-test range
    #[arg(long, value_parser = parse_id_arg)]
    pub range_max: Option<u64>,

    /// Number of distinct seeds to draw with for --seed-test
    #[arg(long, default_value_t = DEFAULT_SEED_TEST_TRIES)]
    pub tries: u32,

    /// Run in daemon mode (JSON-RPC over stdio)
    #[arg(long)]
    pub daemon: bool,
}

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Daemon,
    Inspect,
    Usage(Vec<TrackId>),
    Select {
        target_id: TargetId,
        seed: Option<u32>,
    },
    SeedTest {
        lo: u64,
        hi: u64,
        tries: u32,
    },
    /// No mode given; print usage.
    Help,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Resolves the flags into a single mode.
    ///
    /// Returns an error message when a mode is missing a required flag.
    pub fn mode(&self) -> Result<Mode, String> {
        if self.daemon {
            return Ok(Mode::Daemon);
        }
        if self.inspect {
            return Ok(Mode::Inspect);
        }
        if !self.usage.is_empty() {
            return Ok(Mode::Usage(self.usage.clone()));
        }
        if let Some(target_id) = self.target {
            if self.seed.is_none() && !self.unseeded {
                return Err("--target requires --seed (or --unseeded)".to_string());
            }
            return Ok(Mode::Select {
                target_id,
                seed: self.seed,
            });
        }
        if self.seed_test {
            let (Some(lo), Some(hi)) = (self.range_min, self.range_max) else {
                return Err("--seed-test requires --range-min and --range-max".to_string());
            };
            return Ok(Mode::SeedTest {
                lo,
                hi,
                tries: self.tries,
            });
        }
        Ok(Mode::Help)
    }
}

fn parse_id_arg(s: &str) -> Result<u64, String> {
    parse_id(s).ok_or_else(|| format!("'{}' is not a decimal or 0x-hex id", s))
}

fn parse_seed_arg(s: &str) -> Result<u32, String> {
    parse_seed(s).ok_or_else(|| format!("'{}' is not a 32-bit decimal or 0x-hex seed", s))
}
