//! Target id to track selection.
//!
//! Seeded selection is a pure function of `(target_id, seed, catalog)`: no
//! counters, no clock, no state carried between calls. Two instances that
//! observe the same seed for the same target therefore pick the same track.

use std::fmt;

use rand::Rng;
use tracing::{debug, error};

use crate::catalog::Catalog;
use crate::types::{PlaylistGroup, TargetId, Track, TrackId};

use super::seeded::seeded_uniform;
use super::SelectionMode;

/// Why a target produced no track. A normal runtime outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMiss {
    /// No playlist routes this target id.
    UnmappedTarget,
    /// The routed playlist has an empty pool.
    EmptyPool,
}

impl LookupMiss {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupMiss::UnmappedTarget => "unmapped_target",
            LookupMiss::EmptyPool => "empty_pool",
        }
    }
}

impl fmt::Display for LookupMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A playlist references a track the catalog does not hold.
///
/// The loader rejects such documents, so this indicates a bug in catalog
/// construction rather than bad input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyFault {
    pub group: String,
    pub track_id: TrackId,
}

impl fmt::Display for ConsistencyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "playlist {} references missing track {:#x}",
            self.group, self.track_id
        )
    }
}

impl std::error::Error for ConsistencyFault {}

/// Result of a selection: `Ok(None)` is a lookup miss.
pub type Selection<'a> = Result<Option<&'a Track>, ConsistencyFault>;

/// Resolves a target id to a playlist with a non-empty pool.
pub fn lookup_pool(catalog: &Catalog, target_id: TargetId) -> Result<&PlaylistGroup, LookupMiss> {
    match catalog.group_for_target(target_id) {
        None => Err(LookupMiss::UnmappedTarget),
        Some(group) if group.is_empty() => Err(LookupMiss::EmptyPool),
        Some(group) => Ok(group),
    }
}

/// Maps a seed onto an index into a pool of `pool_len` entries.
///
/// Returns `None` for an empty pool.
pub fn select_index(pool_len: usize, seed: u32) -> Option<usize> {
    let last = pool_len.checked_sub(1)?;
    Some(seeded_uniform(0, last as u64, seed) as usize)
}

/// Picks a track for `target_id` using only `seed` as the source of
/// randomness.
pub fn select(catalog: &Catalog, target_id: TargetId, seed: u32) -> Selection<'_> {
    let group = match lookup_pool(catalog, target_id) {
        Ok(group) => group,
        Err(miss) => {
            debug!("No music for target {:#x}: {}", target_id, miss);
            return Ok(None);
        }
    };

    let Some(index) = select_index(group.track_ids.len(), seed) else {
        return Ok(None);
    };
    debug!(
        "Target {:#x} -> playlist {}, seed {:#x}, index {}/{}",
        target_id,
        group.name,
        seed,
        index,
        group.track_ids.len()
    );
    resolve(catalog, group, index).map(Some)
}

/// Picks a track for `target_id` from the thread-local generator.
///
/// For single-instance use only; the result is not reproducible.
pub fn select_unseeded(catalog: &Catalog, target_id: TargetId) -> Selection<'_> {
    let group = match lookup_pool(catalog, target_id) {
        Ok(group) => group,
        Err(miss) => {
            debug!("No music for target {:#x}: {}", target_id, miss);
            return Ok(None);
        }
    };

    let index = rand::thread_rng().gen_range(0..group.track_ids.len());
    resolve(catalog, group, index).map(Some)
}

/// Selects with the given mode. `seed` is ignored in unseeded mode.
pub fn select_with_mode(
    catalog: &Catalog,
    mode: SelectionMode,
    target_id: TargetId,
    seed: u32,
) -> Selection<'_> {
    match mode {
        SelectionMode::Seeded => select(catalog, target_id, seed),
        SelectionMode::Unseeded => select_unseeded(catalog, target_id),
    }
}

fn resolve<'a>(
    catalog: &'a Catalog,
    group: &PlaylistGroup,
    index: usize,
) -> Result<&'a Track, ConsistencyFault> {
    let fault = |track_id| ConsistencyFault {
        group: group.name.clone(),
        track_id,
    };

    let track_id = *group
        .track_ids
        .get(index)
        .ok_or_else(|| fault(TrackId::MAX))?;

    catalog.track(track_id).ok_or_else(|| {
        let fault = fault(track_id);
        error!("Catalog inconsistency: {}", fault);
        fault
    })
}
