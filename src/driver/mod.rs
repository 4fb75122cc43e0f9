//! Pieces used by whatever polls the game for its current state.
//!
//! - [`watch`]: change detection over observed target ids and seeds
//! - [`seed_test`]: distribution check of the seeded draw

pub mod watch;

pub use seed_test::{parse_seed, tabulate, LineSeedSource, SeedDistribution, SeedSource};
pub use watch::{Observation, PollEvent, PollOutcome, PollState, DEFAULT_IGNORED_TARGETS};
