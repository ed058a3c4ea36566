// src/watch/filter.rs

//! Debounce policy: which raw notifications count as a real save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::trace;

use crate::fs::FileSystem;
use crate::watch::event::RawOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Minimum spacing between two accepted writes of the same path.
    pub pending_period: Duration,
    /// A rename is only trusted if the file was modified this recently.
    pub regard_rename_as_mod_period: Duration,
    pub detect_create: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            pending_period: Duration::from_millis(100),
            regard_rename_as_mod_period: Duration::from_millis(1000),
            detect_create: true,
        }
    }
}

/// Per-path memory of the last accepted notification.
#[derive(Debug, Default)]
pub struct EventFilter {
    config: FilterConfig,
    last_accepted: HashMap<PathBuf, SystemTime>,
}

impl EventFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            last_accepted: HashMap::new(),
        }
    }

    /// Decide whether `op` on `path` is a user-visible update, and remember
    /// it if so. `now` is the wall-clock time of the notification.
    pub fn should_execute(
        &mut self,
        fs: &dyn FileSystem,
        path: &Path,
        op: RawOp,
        now: SystemTime,
    ) -> bool {
        let is_write = op == RawOp::Write || (self.config.detect_create && op == RawOp::Create);
        let is_rename = op == RawOp::Rename;

        if !is_write && !is_rename {
            trace!(?path, ?op, "skipped (op is not applicable)");
            return false;
        }

        let Some(stat) = fs.stat(path) else {
            trace!(?path, ?op, "skipped (not a file)");
            return false;
        };
        if stat.is_dir {
            trace!(?path, ?op, "skipped (not a file)");
            return false;
        }

        let text = path.to_string_lossy();
        if text.contains('\'') || text.contains('"') {
            trace!(?path, ?op, "skipped (unsupported character)");
            return false;
        }

        let modified = stat.modified;

        if is_write {
            if let Some(last) = self.last_accepted.get(path) {
                // A modification time before the last acceptance is a
                // duplicate of the same save.
                let too_frequent = match modified.duration_since(*last) {
                    Ok(elapsed) => elapsed < self.config.pending_period,
                    Err(_) => true,
                };
                if too_frequent {
                    trace!(?path, ?op, "skipped (too frequent)");
                    return false;
                }
            }
        }

        if is_rename {
            if let Ok(elapsed) = now.duration_since(modified) {
                if elapsed > self.config.regard_rename_as_mod_period {
                    trace!(?path, ?op, ?elapsed, "skipped (unnatural rename)");
                    return false;
                }
            }
        }

        self.last_accepted.insert(path.to_path_buf(), now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn t(ms: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000) + Duration::from_millis(ms)
    }

    fn setup() -> (MockFileSystem, EventFilter) {
        (MockFileSystem::new(), EventFilter::new(FilterConfig::default()))
    }

    #[test]
    fn ignores_ops_that_are_not_updates() {
        let (fs, mut filter) = setup();
        fs.set_file("a.py", t(0));
        assert!(!filter.should_execute(&fs, Path::new("a.py"), RawOp::Remove, t(0)));
        assert!(!filter.should_execute(&fs, Path::new("a.py"), RawOp::Chmod, t(0)));
        assert!(!filter.should_execute(&fs, Path::new("a.py"), RawOp::Other, t(0)));
    }

    #[test]
    fn create_is_ignored_when_detection_is_off() {
        let fs = MockFileSystem::new();
        let mut filter = EventFilter::new(FilterConfig {
            detect_create: false,
            ..FilterConfig::default()
        });
        fs.set_file("a.py", t(0));
        assert!(!filter.should_execute(&fs, Path::new("a.py"), RawOp::Create, t(0)));
        assert!(filter.should_execute(&fs, Path::new("a.py"), RawOp::Write, t(0)));
    }

    #[test]
    fn rejects_missing_paths_directories_and_quotes() {
        let (fs, mut filter) = setup();
        fs.add_dir("src");
        fs.set_file("it's.py", t(0));
        fs.set_file("say\"hi\".py", t(0));

        assert!(!filter.should_execute(&fs, Path::new("gone.py"), RawOp::Write, t(0)));
        assert!(!filter.should_execute(&fs, Path::new("src"), RawOp::Write, t(0)));
        assert!(!filter.should_execute(&fs, Path::new("it's.py"), RawOp::Write, t(0)));
        assert!(!filter.should_execute(&fs, Path::new("say\"hi\".py"), RawOp::Write, t(0)));
    }

    #[test]
    fn writes_within_pending_period_are_collapsed() {
        let (fs, mut filter) = setup();
        let path = Path::new("a.py");

        fs.set_file(path, t(0));
        assert!(filter.should_execute(&fs, path, RawOp::Write, t(0)));

        fs.set_file(path, t(30));
        assert!(!filter.should_execute(&fs, path, RawOp::Write, t(30)));
        assert!(!filter.should_execute(&fs, path, RawOp::Create, t(31)));

        fs.set_file(path, t(150));
        assert!(filter.should_execute(&fs, path, RawOp::Write, t(150)));
    }

    #[test]
    fn modification_before_last_acceptance_is_rejected() {
        let (fs, mut filter) = setup();
        let path = Path::new("a.py");

        fs.set_file(path, t(500));
        assert!(filter.should_execute(&fs, path, RawOp::Write, t(500)));

        fs.set_file(path, t(200));
        assert!(!filter.should_execute(&fs, path, RawOp::Write, t(600)));
    }

    #[test]
    fn paths_are_debounced_independently() {
        let (fs, mut filter) = setup();
        fs.set_file("a.py", t(0));
        fs.set_file("b.py", t(0));
        assert!(filter.should_execute(&fs, Path::new("a.py"), RawOp::Write, t(0)));
        assert!(filter.should_execute(&fs, Path::new("b.py"), RawOp::Write, t(0)));
    }

    #[test]
    fn rename_accepted_only_inside_window() {
        let (fs, mut filter) = setup();
        let path = Path::new("a.py");

        fs.set_file(path, t(0));
        assert!(filter.should_execute(&fs, path, RawOp::Rename, t(400)));

        fs.set_file(path, t(1000));
        assert!(!filter.should_execute(&fs, path, RawOp::Rename, t(2500)));
    }

    #[test]
    fn rename_with_future_mtime_is_accepted() {
        let (fs, mut filter) = setup();
        let path = Path::new("a.py");
        fs.set_file(path, t(5000));
        assert!(filter.should_execute(&fs, path, RawOp::Rename, t(0)));
    }
}
