//! Core types for the bgm-daemon.
//!
//! This module re-exports all the core data types used throughout the daemon:
//! - [`Track`]: A playable audio file with its play range and loop points
//! - [`PlaylistGroup`]: A named pool of tracks routed by target ids
//! - [`TrackDescriptor`]: The flat view handed to the playback collaborator

mod playlist;
mod track;

// Re-export all types at the module level
pub use playlist::PlaylistGroup;
pub use track::{
    LoopRange, PlayRange, ResolvedRange, TargetId, Track, TrackDescriptor, TrackId,
    DEFAULT_OFFSET,
};
pub use track::parse_id;
