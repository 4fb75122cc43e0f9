//! bgm-daemon: seeded playlist selection for replacement game music.
//!
//! A TOML playlist document is validated into a read-only [`Catalog`]. A
//! target id observed in a running game is routed to one playlist, and a
//! track is drawn from its pool using only the observed seed, so separate
//! instances watching the same game agree on the choice without talking to
//! each other.
//!
//! # Modules
//!
//! - [`types`]: Core data types (Track, PlaylistGroup, TrackDescriptor)
//! - [`catalog`]: Document loading, validation and lookup
//! - [`selection`]: Seeded and unseeded track selection
//! - [`driver`]: Change detection and the seed distribution check
//! - [`inspect`]: Unused-track and usage reports
//! - [`config`]: Runtime configuration (DaemonConfig)
//! - [`error`]: Error types and codes (DaemonError, ErrorCode)
//! - [`rpc`]: JSON-RPC server
//!
//! # Example
//!
//! ```rust,ignore
//! use bgm_daemon::{catalog::Catalog, selection::select};
//!
//! let catalog = Catalog::load_file("config.toml".as_ref())?;
//! if let Some(track) = select(&catalog, 0x2a, 0xabcd)? {
//!     println!("{}", track);
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod inspect;
pub mod rpc;
pub mod selection;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used types at crate root for convenience
pub use catalog::Catalog;
pub use config::DaemonConfig;
pub use error::{DaemonError, ErrorCode, Result};
pub use selection::{select, select_unseeded, SelectionMode};
pub use types::{PlaylistGroup, Track, TrackDescriptor};
