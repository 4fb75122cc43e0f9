//! Playlist group type.
//!
//! A playlist is one named section of the playlist document: a pool of
//! track ids to draw from plus the target ids that route to it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::track::{TargetId, TrackId};

/// A named pool of tracks reachable through one or more target ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistGroup {
    /// Section name from the document; unique by construction.
    pub name: String,

    /// Pool in document order. Selection indexes into this vector, so the
    /// order must be kept for two instances to agree. Repeats are allowed
    /// and act as weights.
    pub track_ids: Vec<TrackId>,

    /// Target ids routed to this playlist.
    pub target_ids: BTreeSet<TargetId>,
}

impl PlaylistGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            track_ids: Vec::new(),
            target_ids: BTreeSet::new(),
        }
    }

    /// Returns true if the pool has nothing to draw from.
    pub fn is_empty(&self) -> bool {
        self.track_ids.is_empty()
    }

    /// How many times `track_id` appears in the pool. Each entry is one
    /// more chance of being drawn.
    pub fn occurrences(&self, track_id: TrackId) -> usize {
        self.track_ids.iter().filter(|&&id| id == track_id).count()
    }
}
