// src/watch/candidates.rs

//! Turning watch patterns into the directories that must be subscribed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::GlobMatcher;
use tracing::{debug, error};

use crate::errors::{GazerError, Result};
use crate::fs::FileSystem;
use crate::watch::path_utils::{clean_path, parent_or_dot, relative_str, to_slash};
use crate::watch::patterns::{compile_glob, find_dirs, find_real_directory};

/// Every ancestor prefix of `pattern`, longest first.
///
/// Wildcards are ordinary segments here; only trailing segments are trimmed.
///
/// ```text
/// "aaa/*/bbb" -> ["aaa/*/bbb", "aaa/*", "aaa", "."]
/// "../aaa"    -> ["../aaa", ".."]
/// "/aaa/bbb"  -> ["/aaa/bbb", "/aaa", "/"]
/// ```
pub fn parse_path_pattern(pattern: &str) -> Vec<String> {
    if pattern.is_empty() {
        return Vec::new();
    }
    if matches!(pattern, "/" | "\\" | "." | "..") {
        return vec![pattern.to_string()];
    }

    let bytes = pattern.as_bytes();
    let mut result = vec![pattern.to_string()];

    let is_abs = Path::new(pattern).is_absolute() || bytes[0] == b'/';
    let is_parent = pattern.starts_with("..");
    let is_win_abs = bytes[0] != b'/' && is_abs;
    let is_current = !is_abs && !is_parent;
    let is_explicit_current = is_current && pattern.starts_with('.');

    // `c:\aaa` keeps its separator on the drive root: `c:\`.
    let win_first_delimiter = if is_win_abs { pattern.find('\\') } else { None };

    for i in (0..bytes.len()).rev() {
        if bytes[i] != b'/' && bytes[i] != b'\\' {
            continue;
        }
        if i == 0 {
            result.push("/".to_string());
            continue;
        }
        let mut prefix = pattern[..i].to_string();
        if win_first_delimiter == Some(i) {
            prefix.push('\\');
        }
        result.push(prefix);
    }

    let needs_dot = if result.len() <= 1 {
        !is_abs && !is_explicit_current
    } else {
        is_current && !is_explicit_current
    };
    if needs_dot {
        result.push(".".to_string());
    }

    result
}

/// Ancestor prefixes of all patterns, shortest first per pattern, with
/// duplicates across patterns dropped in discovery order.
pub fn find_candidate_directories(patterns: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for pattern in patterns {
        for candidate in parse_path_pattern(pattern).into_iter().rev() {
            if seen.insert(candidate.clone()) {
                out.push(candidate);
            }
        }
    }
    out
}

/// Existing directories that the candidates resolve to.
///
/// Fails with [`GazerError::TooManyWatchDirs`] once more than `max` distinct
/// directories were found.
pub fn actual_directories(
    fs: &dyn FileSystem,
    candidates: &[String],
    max: usize,
) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut dirs = Vec::new();

    for candidate in candidates {
        for dir in find_dirs_by_pattern(fs, candidate, max) {
            if seen.insert(dir.clone()) {
                dirs.push(dir);
            }
        }
        if dirs.len() > max {
            break;
        }
    }

    if dirs.len() > max {
        let listed: Vec<String> = dirs[..max].iter().map(|d| to_slash(d)).collect();
        error!("{}\n...", listed.join("\n"));
        return Err(GazerError::TooManyWatchDirs { max });
    }

    Ok(dirs)
}

fn find_dirs_by_pattern(fs: &dyn FileSystem, pattern: &str, limit: usize) -> Vec<PathBuf> {
    let pattern_dir = parent_or_dot(&clean_path(Path::new(pattern)));
    let pattern_dir_str = to_slash(&pattern_dir);
    debug!(pattern, pattern_dir = %pattern_dir_str, "resolving watch directories");

    let mut targets = Vec::new();
    if let Some(real) = find_real_directory(fs, &pattern_dir_str) {
        targets.push(real);
    }
    targets.extend(find_dirs(fs, pattern, limit));
    targets.extend(find_dirs(fs, &pattern_dir_str, limit));
    targets
}

/// Compiled candidates, used to decide whether a freshly created directory
/// should be subscribed.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    matchers: Vec<GlobMatcher>,
    cwd: Option<PathBuf>,
}

impl CandidateSet {
    pub fn new(candidates: Vec<String>) -> Self {
        Self::with_cwd(candidates, std::env::current_dir().ok())
    }

    /// Relative candidates are matched against event paths made relative
    /// to `cwd`.
    pub fn with_cwd(candidates: Vec<String>, cwd: Option<PathBuf>) -> Self {
        let matchers = candidates
            .iter()
            .filter_map(|c| compile_glob(c).ok())
            .collect();
        Self { matchers, cwd }
    }

    /// True if `dir` is a directory matched by one of the candidates.
    pub fn should_watch(&self, fs: &dyn FileSystem, dir: &Path) -> bool {
        if !fs.is_dir(dir) {
            return false;
        }
        if self.matches(&to_slash(dir)) {
            return true;
        }
        if !dir.is_absolute() {
            return false;
        }
        self.cwd
            .as_deref()
            .and_then(|cwd| relative_str(cwd, dir))
            .is_some_and(|rel| self.matches(&rel))
    }

    fn matches(&self, slashed: &str) -> bool {
        self.matchers.iter().any(|m| m.is_match(slashed))
    }
}
