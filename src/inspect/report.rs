//! Read-only reports over a catalog.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{error, info};

use crate::catalog::Catalog;
use crate::types::{TargetId, TrackId};

/// A track no playlist draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedTrack {
    pub track_id: TrackId,
    pub path: String,
}

/// Tracks present in the catalog but referenced by no playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedTrackReport {
    pub total_tracks: usize,
    /// Ascending by track id.
    pub unused: Vec<UnusedTrack>,
}

impl UnusedTrackReport {
    pub fn unused_ids(&self) -> BTreeSet<TrackId> {
        self.unused.iter().map(|t| t.track_id).collect()
    }

    /// Writes the report to the log.
    pub fn log(&self) {
        info!("********** Inspection Result **********");
        info!("Total music entries={}", self.total_tracks);
        info!("Total unused music entries={}", self.unused.len());
        for track in &self.unused {
            info!(
                "[Unused music entry] unique music id={:#x}, file='{}'",
                track.track_id, track.path
            );
        }
    }
}

/// Starts from every track id and removes each one some playlist uses.
pub fn unused_tracks(catalog: &Catalog) -> UnusedTrackReport {
    let mut remaining: BTreeSet<TrackId> = catalog.tracks().map(|t| t.track_id).collect();
    for group in catalog.groups() {
        for id in &group.track_ids {
            remaining.remove(id);
        }
    }

    let unused = remaining
        .into_iter()
        .filter_map(|id| catalog.track(id))
        .map(|track| UnusedTrack {
            track_id: track.track_id,
            path: track.file_path.display().to_string(),
        })
        .collect();

    UnusedTrackReport {
        total_tracks: catalog.track_count(),
        unused,
    }
}

/// Reverse index from track id to the playlists whose pool contains it.
#[derive(Debug, Clone, Default)]
pub struct UsageIndex {
    /// Indices into `Catalog::groups()`, in document order, no repeats.
    by_track: BTreeMap<TrackId, Vec<usize>>,
}

impl UsageIndex {
    /// Builds the index once from the catalog's playlists.
    pub fn build(catalog: &Catalog) -> Self {
        let mut by_track: BTreeMap<TrackId, Vec<usize>> = BTreeMap::new();
        for (index, group) in catalog.groups().iter().enumerate() {
            for id in &group.track_ids {
                let owners = by_track.entry(*id).or_default();
                if owners.last() != Some(&index) {
                    owners.push(index);
                }
            }
        }
        Self { by_track }
    }

    /// Returns the playlist indices using `track_id`.
    pub fn groups_for(&self, track_id: TrackId) -> &[usize] {
        self.by_track
            .get(&track_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// One playlist that includes a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistUsage {
    pub playlist: String,
    /// How many times the track appears in the pool.
    pub occurrences: usize,
    pub target_ids: Vec<TargetId>,
}

/// Which playlists include a given track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackUsage {
    pub track_id: TrackId,
    /// False if the catalog has no such track.
    pub registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub playlists: Vec<PlaylistUsage>,
}

impl TrackUsage {
    /// Writes the report to the log.
    pub fn log(&self) {
        if !self.registered {
            error!("Unique music id {:#x} is not registered.", self.track_id);
            return;
        }
        info!(
            "Music {:#x} ('{}') is used by {} playlist(s)",
            self.track_id,
            self.path.as_deref().unwrap_or(""),
            self.playlists.len()
        );
        for usage in &self.playlists {
            info!(
                "  [{}] x{} targets={:x?}",
                usage.playlist, usage.occurrences, usage.target_ids
            );
        }
    }
}

/// Catalog plus the reverse index, for repeated usage queries.
pub struct Inspector<'a> {
    catalog: &'a Catalog,
    usage: UsageIndex,
}

impl<'a> Inspector<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            usage: UsageIndex::build(catalog),
        }
    }

    pub fn unused_tracks(&self) -> UnusedTrackReport {
        unused_tracks(self.catalog)
    }

    /// Usage report for one track id.
    pub fn usage(&self, track_id: TrackId) -> TrackUsage {
        let track = self.catalog.track(track_id);
        let groups = self.catalog.groups();

        let playlists = self
            .usage
            .groups_for(track_id)
            .iter()
            .filter_map(|&index| groups.get(index))
            .map(|group| PlaylistUsage {
                playlist: group.name.clone(),
                occurrences: group.occurrences(track_id),
                target_ids: group.target_ids.iter().copied().collect(),
            })
            .collect();

        TrackUsage {
            track_id,
            registered: track.is_some(),
            path: track.map(|t| t.file_path.display().to_string()),
            playlists,
        }
    }

    /// Usage reports for several track ids, in the order given.
    pub fn usage_many(&self, track_ids: &[TrackId]) -> Vec<TrackUsage> {
        track_ids.iter().map(|&id| self.usage(id)).collect()
    }
}
