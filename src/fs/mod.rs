// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::watch::path_utils::clean_path;

pub mod mock;

/// The subset of file metadata the watcher cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_dir: bool,
    pub modified: SystemTime,
}

/// One entry produced by [`FileSystem::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    /// Metadata for `path`, following symlinks. `None` if it does not exist.
    fn stat(&self, path: &Path) -> Option<FileStat>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.stat(path), Some(stat) if stat.is_dir)
    }

    /// `root` and everything below it, at most `max_depth` levels down
    /// (`None` for no limit). Unreadable directories are skipped.
    fn walk(&self, root: &Path, max_depth: Option<usize>) -> Vec<WalkEntry> {
        let mut out = Vec::new();
        let Some(stat) = self.stat(root) else {
            return out;
        };

        let mut stack = vec![(clean_path(root), stat.is_dir, 0usize)];
        while let Some((path, is_dir, depth)) = stack.pop() {
            let descend = is_dir && max_depth.is_none_or(|max| depth < max);
            if descend {
                if let Ok(children) = self.read_dir(&path) {
                    for child in children {
                        let child = clean_path(&child);
                        if let Some(stat) = self.stat(&child) {
                            stack.push((child, stat.is_dir, depth + 1));
                        }
                    }
                }
            }
            out.push(WalkEntry { path, is_dir });
        }
        out
    }
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn stat(&self, path: &Path) -> Option<FileStat> {
        let meta = fs::metadata(path).ok()?;
        Some(FileStat {
            is_dir: meta.is_dir(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }

    fn walk(&self, root: &Path, max_depth: Option<usize>) -> Vec<WalkEntry> {
        let mut walker = WalkDir::new(root).follow_links(false);
        if let Some(max) = max_depth {
            walker = walker.max_depth(max);
        }
        walker
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|entry| WalkEntry {
                path: clean_path(entry.path()),
                is_dir: entry.file_type().is_dir(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn sorted(mut entries: Vec<WalkEntry>) -> Vec<(String, bool)> {
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
            .into_iter()
            .map(|e| (e.path.to_string_lossy().into_owned(), e.is_dir))
            .collect()
    }

    #[test]
    fn mock_walk_respects_depth() {
        let fs = MockFileSystem::new();
        fs.add_dir("src/a/b");
        fs.set_file("src/main.rs", SystemTime::now());

        let all = sorted(fs.walk(Path::new("src"), None));
        assert_eq!(
            all,
            vec![
                ("src".to_string(), true),
                ("src/a".to_string(), true),
                ("src/a/b".to_string(), true),
                ("src/main.rs".to_string(), false),
            ]
        );

        let shallow = sorted(fs.walk(Path::new("src"), Some(1)));
        assert_eq!(shallow.len(), 3);
        assert!(fs.walk(Path::new("missing"), None).is_empty());
    }

    #[test]
    fn real_walk_matches_the_tree() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("x/y")).unwrap();
        std::fs::write(tmp.path().join("x/f.txt"), "f").unwrap();

        let found = RealFileSystem.walk(tmp.path(), Some(1));
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|e| e.path.ends_with("x") && e.is_dir));
        assert_eq!(RealFileSystem.walk(tmp.path(), None).len(), 4);
    }
}
