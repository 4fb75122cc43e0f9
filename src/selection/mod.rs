//! Track selection.
//!
//! - [`seeded`]: the pinned seed-to-integer draw shared by all instances
//! - [`selector`]: target id to track resolution, seeded or unseeded

pub mod seeded;
pub mod selector;

use serde::{Deserialize, Serialize};

// Re-export commonly used items
pub use seeded::{seeded_rng, seeded_uniform, uniform_inclusive};
pub use selector::{
    lookup_pool, select, select_index, select_unseeded, select_with_mode, ConsistencyFault,
    LookupMiss, Selection,
};

/// How the selector draws its random index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Derive the index from the observed seed so that every instance
    /// watching the same game picks the same track.
    #[default]
    Seeded,

    /// Use a locally seeded generator. For single-player use; instances
    /// will not agree.
    Unseeded,
}

impl SelectionMode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Seeded => "seeded",
            SelectionMode::Unseeded => "unseeded",
        }
    }

    /// Parses a mode from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "seeded" | "synced" => Some(SelectionMode::Seeded),
            "unseeded" | "random" | "local" => Some(SelectionMode::Unseeded),
            _ => None,
        }
    }
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing() {
        assert_eq!(SelectionMode::parse("seeded"), Some(SelectionMode::Seeded));
        assert_eq!(SelectionMode::parse("SYNCED"), Some(SelectionMode::Seeded));
        assert_eq!(SelectionMode::parse("unseeded"), Some(SelectionMode::Unseeded));
        assert_eq!(SelectionMode::parse("random"), Some(SelectionMode::Unseeded));
        assert_eq!(SelectionMode::parse("sometimes"), None);
    }

    #[test]
    fn mode_default_is_seeded() {
        assert_eq!(SelectionMode::default(), SelectionMode::Seeded);
        assert_eq!(SelectionMode::default().to_string(), "seeded");
    }
}
