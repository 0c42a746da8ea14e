//! Temporary output locations for tests.

use std::path::PathBuf;

/// A temporary directory holding a single `.mbtiles` output path.
///
/// The directory (and anything written into it) is removed on drop.
pub struct TempOutput {
    pub dir: tempfile::TempDir,
    pub path: PathBuf,
}

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// A fresh `<tempdir>/<name>.mbtiles` path that does not exist yet.
pub fn temp_mbtiles_path(name: &str) -> TempOutput {
    let dir = tempfile::Builder::new()
        .prefix("rastertiler_")
        .tempdir()
        .expect("Failed to create temporary test directory");
    let path = dir.path().join(format!("{}.mbtiles", name));
    TempOutput { dir, path }
}
