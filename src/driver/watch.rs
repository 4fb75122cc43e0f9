//! Change detection between polls of the observed target id and seed.
//!
//! The external driver feeds every poll into [`PollState`]; only a change
//! of target id leads to a new selection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::TargetId;

/// Sentinel target ids that mean "no music requested".
pub const DEFAULT_IGNORED_TARGETS: [TargetId; 3] = [0xffff, 0xcccc, 0x0];

/// One sample taken by the external driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub target_id: TargetId,
    pub seed: u32,
}

/// Outcome of feeding a target id into [`PollState::observe_target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvent {
    /// Same as the last poll.
    Unchanged,
    /// Changed to a sentinel id; nothing should be played.
    Ignored(TargetId),
    /// Changed to a target that should be resolved.
    Changed {
        from: Option<TargetId>,
        to: TargetId,
    },
}

impl PollEvent {
    pub fn is_change(&self) -> bool {
        matches!(self, PollEvent::Changed { .. })
    }
}

/// Result of feeding a whole [`Observation`] into [`PollState::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub event: PollEvent,
    pub seed_changed: bool,
}

/// The last observed values. Updated only through the `observe_*` methods.
#[derive(Debug, Clone)]
pub struct PollState {
    last_target: Option<TargetId>,
    last_seed: Option<u32>,
    ignored: BTreeSet<TargetId>,
}

impl Default for PollState {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORED_TARGETS)
    }
}

impl PollState {
    pub fn new(ignored: impl IntoIterator<Item = TargetId>) -> Self {
        Self {
            last_target: None,
            last_seed: None,
            ignored: ignored.into_iter().collect(),
        }
    }

    pub fn last_target(&self) -> Option<TargetId> {
        self.last_target
    }

    pub fn last_seed(&self) -> Option<u32> {
        self.last_seed
    }

    pub fn is_ignored(&self, target_id: TargetId) -> bool {
        self.ignored.contains(&target_id)
    }

    /// Records `target_id` and reports whether it differs from the last one.
    ///
    /// A change to a sentinel id is still recorded, so switching back to the
    /// previous real target afterwards counts as a change.
    pub fn observe_target(&mut self, target_id: TargetId) -> PollEvent {
        if self.last_target == Some(target_id) {
            return PollEvent::Unchanged;
        }

        let from = self.last_target.replace(target_id);
        match from {
            Some(prev) => info!("Music change detected: {:#x} -> {:#x}", prev, target_id),
            None => info!("Music change detected: none -> {:#x}", target_id),
        }

        if self.is_ignored(target_id) {
            info!("Ignore music id {:#x}", target_id);
            return PollEvent::Ignored(target_id);
        }
        PollEvent::Changed {
            from,
            to: target_id,
        }
    }

    /// Records `seed` and returns true if it differs from the last one.
    pub fn observe_seed(&mut self, seed: u32) -> bool {
        if self.last_seed == Some(seed) {
            return false;
        }
        debug!("Seed changed to {:#x}", seed);
        self.last_seed = Some(seed);
        true
    }

    /// Records both halves of an observation. The seed is recorded first.
    pub fn observe(&mut self, observation: Observation) -> PollOutcome {
        let seed_changed = self.observe_seed(observation.seed);
        PollOutcome {
            event: self.observe_target(observation.target_id),
            seed_changed,
        }
    }

    /// Forgets the last observed values. Ignored ids are kept.
    pub fn reset(&mut self) {
        self.last_target = None;
        self.last_seed = None;
    }
}
