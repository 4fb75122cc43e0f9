//! Shared fixtures for unit tests.

use std::path::PathBuf;

use tempfile::TempDir;

use crate::catalog::{load_with_base, Catalog};
use crate::error::Result;

/// A temporary directory holding empty audio files.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Creates a directory with one empty file per name.
    pub fn new(files: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        for name in files {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        Self { dir }
    }

    /// Loads a document whose relative paths point into the fixture.
    pub fn load(&self, text: &str) -> Result<Catalog> {
        load_with_base(text, Some(self.dir.path()))
    }

    /// Writes `text` as `config.toml` inside the fixture and returns its path.
    pub fn write_config(&self, text: &str) -> PathBuf {
        let path = self.dir.path().join("config.toml");
        std::fs::write(&path, text).unwrap();
        path
    }
}
