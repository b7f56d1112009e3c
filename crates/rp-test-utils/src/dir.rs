//! [`ManifestDir`] builder for tests that read manifests from disk.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::fixtures;

/// A temporary directory that manifest files can be written into.
///
/// # Example
///
/// ```rust,no_run
/// use rp_test_utils::dir::ManifestDir;
/// use rp_test_utils::fixtures;
///
/// let dir = ManifestDir::new();
/// let path = dir.copy_fixture(fixtures::VALID);
/// assert!(path.is_file());
/// ```
pub struct ManifestDir {
    temp_dir: TempDir,
}

impl Default for ManifestDir {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `name` inside the directory and return its path.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Copy a checked-in fixture into the directory under the same name.
    pub fn copy_fixture(&self, name: &str) -> PathBuf {
        self.write(name, &fixtures::fixture(name))
    }
}
