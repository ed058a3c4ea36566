// src/watch/patterns.rs

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use tracing::{trace, warn};

use crate::fs::FileSystem;
use crate::watch::path_utils::{clean_path, parent_or_dot, to_slash};

/// Characters that make a path segment a wildcard segment.
const WILDCARD_CHARS: &[char] = &['*', '?', '[', '{'];

pub fn contains_wildcard(segment: &str) -> bool {
    segment.contains(WILDCARD_CHARS)
}

/// Compile a single glob where `*` stops at `/` and `**` crosses it.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(&to_slash(Path::new(pattern)))
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// The watch patterns given on the command line, compiled once.
///
/// A path matches when the pattern matches the path itself or the directory
/// containing it, so `gazer src` reacts to `src/main.rs`.
#[derive(Clone)]
pub struct WatchPatterns {
    patterns: Vec<(String, GlobMatcher)>,
}

impl fmt::Debug for WatchPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.patterns.iter().map(|(p, _)| p.as_str()).collect();
        f.debug_struct("WatchPatterns").field("patterns", &names).finish()
    }
}

impl WatchPatterns {
    /// Patterns that fail to compile are logged and skipped.
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match compile_glob(p) {
                Ok(m) => Some((p.clone(), m)),
                Err(err) => {
                    warn!(pattern = %p, error = %err, "ignoring unusable watch pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns true if any pattern matches the given path.
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|(raw, m)| glob_match(raw, m, path))
    }
}

fn glob_match(raw: &str, matcher: &GlobMatcher, path: &str) -> bool {
    let file_path = path.trim_end_matches('/');
    if matcher.is_match(file_path) {
        trace!(pattern = %raw, path = %path, "glob matched file");
        return true;
    }

    let dir_path = to_slash(&parent_or_dot(Path::new(file_path)));
    if matcher.is_match(&dir_path) {
        trace!(pattern = %raw, path = %path, "glob matched directory");
        return true;
    }

    false
}

/// Longest leading run of wildcard-free segments of `path`, if it names an
/// existing directory.
///
/// `"/tmp/a/**/b"` -> `"/tmp/a"`, `"?ir/x"` -> `None` (no literal prefix).
pub fn find_real_directory(fs: &dyn FileSystem, path: &str) -> Option<PathBuf> {
    let slashed = to_slash(&clean_path(Path::new(path)));
    let absolute = slashed.starts_with('/');

    let literal: Vec<&str> = slashed
        .split('/')
        .take_while(|segment| !contains_wildcard(segment))
        .collect();

    let mut current = literal.join("/");
    if current.is_empty() {
        if !absolute {
            return None;
        }
        current = "/".to_string();
    }

    let current = PathBuf::from(current);
    fs.is_dir(&current).then_some(current)
}

/// Directories touched by `pattern`: every matching directory, plus the
/// parent of every matching file. A wildcard-free pattern is checked as is.
///
/// The expansion walks `fs`, so an in-memory filesystem drives it as well.
/// Stops collecting once more than `limit` directories were found.
pub fn find_dirs(fs: &dyn FileSystem, pattern: &str, limit: usize) -> Vec<PathBuf> {
    let mut found = DirSet::default();

    if let Some(stat) = fs.stat(Path::new(pattern)) {
        found.push(Path::new(pattern), stat.is_dir);
    }

    if !contains_wildcard(pattern) {
        return found.dirs;
    }

    let matcher = match compile_glob(pattern) {
        Ok(m) => m,
        Err(err) => {
            trace!(pattern, error = %err, "pattern is not a valid glob; skipping expansion");
            return found.dirs;
        }
    };

    let base = find_real_directory(fs, pattern).unwrap_or_else(|| PathBuf::from("."));
    let max_depth = (!pattern.contains("**"))
        .then(|| component_count(Path::new(pattern)).saturating_sub(component_count(&base)));

    for entry in fs.walk(&base, max_depth) {
        if !matcher.is_match(to_slash(&entry.path)) {
            continue;
        }
        found.push(&entry.path, entry.is_dir);
        if found.dirs.len() > limit {
            break;
        }
    }

    found.dirs
}

/// Distinct directories in discovery order.
#[derive(Default)]
struct DirSet {
    seen: HashSet<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl DirSet {
    fn push(&mut self, entry: &Path, is_dir: bool) {
        let dir = if is_dir {
            clean_path(entry)
        } else {
            parent_or_dot(&clean_path(entry))
        };
        if self.seen.insert(dir.clone()) {
            self.dirs.push(dir);
        }
    }
}

fn component_count(path: &Path) -> usize {
    clean_path(path)
        .components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .count()
}
