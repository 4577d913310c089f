#![allow(dead_code)]

use assert_fs::TempDir;
use assert_fs::prelude::*;

/// Builds a temporary directory tree from `(relative path, content)` pairs.
/// Parent directories are created as needed.
pub fn tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    for (path, content) in files {
        dir.child(path)
            .write_str(content)
            .expect("failed to write fixture file");
    }
    dir
}
