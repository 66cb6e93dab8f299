//! A throwaway `public/` directory for pipeline and web tests.

use std::fs;
use std::path::{Path, PathBuf};

/// A temporary public directory laid out like the one the web server serves.
///
/// Removed when dropped.
pub struct PublicTree {
    dir: tempfile::TempDir,
}

impl PublicTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::Builder::new()
                .prefix("gfs_public_")
                .tempdir()
                .expect("Failed to create temporary public directory"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create `<root>/<category>/` and return its path.
    pub fn category(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::create_dir_all(&path).expect("Failed to create category directory");
        path
    }

    /// Write a file relative to the root, creating parent directories.
    pub fn write(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, contents).expect("Failed to write fixture file");
        path
    }
}

impl Default for PublicTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_tree_layout() {
        let tree = PublicTree::new();
        let gust = tree.category("GUST");
        assert!(gust.is_dir());

        let file = tree.write("RS/a.png", b"png");
        assert!(file.exists());
        assert!(tree.root().join("RS").is_dir());
    }
}
