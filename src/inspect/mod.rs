//! Catalog inspection.
//!
//! Provides the unused-track report and per-track usage lookup.

pub mod report;

// Re-export commonly used types
pub use report::{
    unused_tracks, Inspector, PlaylistUsage, TrackUsage, UnusedTrack, UnusedTrackReport,
    UsageIndex,
};
