//! Daemon configuration module.
//!
//! Contains the runtime configuration for bgm-daemon: where the playlist
//! document lives, how tracks are selected, and which target ids mean
//! "nothing playing".

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::driver::DEFAULT_IGNORED_TARGETS;
use crate::selection::SelectionMode;
use crate::types::{parse_id, TargetId};

/// File name of the playlist document.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default tracing filter.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Runtime configuration for the daemon.
///
/// This configuration is typically loaded from command-line arguments
/// or environment variables at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Path to the playlist document.
    /// If None, uses `./config.toml` or the platform config directory.
    pub config_path: Option<PathBuf>,

    /// Seeded (instances agree) or unseeded selection.
    pub selection_mode: SelectionMode,

    /// Target ids that mean "no music requested".
    pub ignored_target_ids: Vec<TargetId>,

    /// `tracing` filter directive, e.g. `info` or `bgm_daemon=debug`.
    pub log_filter: String,
}

impl DaemonConfig {
    /// Creates a new DaemonConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a DaemonConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `BGM_CONFIG_PATH` - Path to the playlist document
    /// - `BGM_SELECTION` - Selection mode (seeded, unseeded)
    /// - `BGM_IGNORE_TARGETS` - Comma separated ignored target ids
    /// - `BGM_LOG` - Log filter
    ///
    /// Falls back to defaults for unset or invalid variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("BGM_CONFIG_PATH") {
            if !path.trim().is_empty() {
                config.config_path = Some(PathBuf::from(path));
            }
        }

        if let Some(mode_str) = lookup("BGM_SELECTION") {
            if let Some(mode) = SelectionMode::parse(&mode_str) {
                config.selection_mode = mode;
            }
        }

        if let Some(ids_str) = lookup("BGM_IGNORE_TARGETS") {
            if let Some(ids) = parse_id_list(&ids_str) {
                config.ignored_target_ids = ids;
            }
        }

        if let Some(filter) = lookup("BGM_LOG") {
            if !filter.trim().is_empty() {
                config.log_filter = filter.trim().to_string();
            }
        }

        config
    }

    /// Returns the effective playlist document path.
    ///
    /// Prefers `./config.toml` when it exists, then the platform config dir.
    pub fn effective_config_path(&self) -> PathBuf {
        if let Some(ref path) = self.config_path {
            return path.clone();
        }
        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            local.to_path_buf()
        } else {
            default_config_path()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if let Some(ref path) = self.config_path {
            if path.as_os_str().is_empty() {
                return Some("config_path must not be empty".to_string());
            }
            if path.is_dir() {
                return Some(format!(
                    "config_path is a directory: {}",
                    path.display()
                ));
            }
        }

        if self.log_filter.trim().is_empty() {
            return Some("log_filter must not be empty".to_string());
        }

        None
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            selection_mode: SelectionMode::default(),
            ignored_target_ids: DEFAULT_IGNORED_TARGETS.to_vec(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Parses `"0xffff, 52, 0x0"`. Returns None if any entry is invalid.
fn parse_id_list(text: &str) -> Option<Vec<TargetId>> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_id)
        .collect()
}

/// Returns the platform-specific default playlist document path.
///
/// Uses the `directories` crate to find appropriate locations:
/// - macOS: ~/Library/Application Support/bgm-daemon/config.toml
/// - Linux: ~/.config/bgm-daemon/config.toml
/// - Windows: C:\Users\<user>\AppData\Roaming\bgm-daemon\config\config.toml
fn default_config_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "bgm-daemon") {
        proj_dirs.config_dir().join(CONFIG_FILE_NAME)
    } else {
        // Fallback to current directory
        PathBuf::from(CONFIG_FILE_NAME)
    }
}
