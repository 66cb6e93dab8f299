//! Locating the workspace and optional sample data.

use std::path::PathBuf;

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    match manifest.ancestors().nth(2) {
        Some(root) => root.to_path_buf(),
        None => manifest,
    }
}

/// First existing candidate among `$TEST_DATA_DIR/<name>`,
/// `crates/grib2-parser/testdata/<name>` and `testdata/<name>`.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let root = workspace_root();
    std::env::var_os("TEST_DATA_DIR")
        .map(|dir| PathBuf::from(dir).join(name))
        .into_iter()
        .chain([
            root.join("crates/grib2-parser/testdata").join(name),
            root.join("testdata").join(name),
        ])
        .find(|path| path.is_file())
}
