//! Validated, read-only track and playlist catalog.
//!
//! A [`Catalog`] is built once by the [`loader`] and never mutated
//! afterwards, so it can be shared across threads behind an `Arc` without
//! locking.

pub mod loader;
pub mod path;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::types::{PlaylistGroup, TargetId, Track, TrackId};

// Re-export commonly used items
pub use loader::{load, load_file, load_with_base};

/// The complete in-memory model of one playlist document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Tracks indexed by track_id.
    tracks: BTreeMap<TrackId, Track>,
    /// Playlists in document order; owns every group.
    groups: Vec<PlaylistGroup>,
    /// Target id to index into `groups`.
    target_index: HashMap<TargetId, usize>,
}

impl Catalog {
    /// Builds the routing index over already validated parts.
    ///
    /// The loader guarantees that no target id appears in two groups; if it
    /// did, the later group would win here.
    pub(crate) fn from_parts(tracks: BTreeMap<TrackId, Track>, groups: Vec<PlaylistGroup>) -> Self {
        let target_index = groups
            .iter()
            .enumerate()
            .flat_map(|(index, group)| group.target_ids.iter().map(move |&t| (t, index)))
            .collect();

        Self {
            tracks,
            groups,
            target_index,
        }
    }

    /// Parses and validates a playlist document.
    pub fn load(text: &str) -> Result<Self> {
        loader::load(text)
    }

    /// Reads, parses and validates a playlist document from disk.
    pub fn load_file(path: &Path) -> Result<Self> {
        loader::load_file(path)
    }

    /// Returns a track by id.
    pub fn track(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    /// Returns the playlist a target id routes to.
    pub fn group_for_target(&self, target_id: TargetId) -> Option<&PlaylistGroup> {
        self.target_index
            .get(&target_id)
            .and_then(|&index| self.groups.get(index))
    }

    /// Returns all playlists in document order.
    pub fn groups(&self) -> &[PlaylistGroup] {
        &self.groups
    }

    /// Returns all tracks in ascending id order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Returns the number of tracks.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Returns the number of playlists.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Returns the number of routed target ids.
    pub fn target_count(&self) -> usize {
        self.target_index.len()
    }

    /// Returns a short digest of everything that influences selection.
    ///
    /// Two instances only agree on seeded choices when their catalogs are
    /// identical, so players can compare this value before a session.
    pub fn fingerprint(&self) -> String {
        compute_fingerprint(self)
    }
}

/// Computes the catalog fingerprint.
///
/// The fingerprint is the first 16 hex characters of the SHA256 hash of a
/// canonical rendering: one line per track in id order, then one line per
/// playlist in document order with its pool and sorted target ids. Track
/// paths are hashed as written, so the digest does not depend on where the
/// document lives.
pub fn compute_fingerprint(catalog: &Catalog) -> String {
    let mut hasher = Sha256::new();

    for track in catalog.tracks() {
        let loop_part = match track.loop_range {
            Some(l) => format!("{}:{}", l.begin, l.end),
            None => "-".to_string(),
        };
        hasher.update(
            format!(
                "t:{}:{}:{}:{}:{}\n",
                track.track_id,
                track.source_path,
                track.play_range.start,
                track.play_range.end,
                loop_part
            )
            .as_bytes(),
        );
    }

    for group in catalog.groups() {
        hasher.update(
            format!(
                "g:{}:{}:{}\n",
                group.name,
                join(group.track_ids.iter()),
                join(group.target_ids.iter())
            )
            .as_bytes(),
        );
    }

    let result = hasher.finalize();
    // Take first 8 bytes (16 hex chars)
    hex::encode(&result[..8])
}

fn join<'a>(ids: impl Iterator<Item = &'a u64>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}
