#![allow(dead_code)]

use std::path::Path;

pub use gazer_test_utils::{init_tracing, touch, wait_until, with_timeout};

/// Slash-separated pattern `glob` inside `dir`. The directory is
/// canonicalized so it matches the paths the OS reports back.
pub fn pattern_in(dir: &Path, glob: &str) -> String {
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    format!("{}/{}", dir.to_string_lossy().replace('\\', "/"), glob)
}
