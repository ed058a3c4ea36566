// src/watch/watcher.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc as std_mpsc};
use std::time::SystemTime;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, trace, warn};

use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::candidates::{CandidateSet, actual_directories, find_candidate_directories};
use crate::watch::event::{FileEvent, RawOp};
use crate::watch::filter::{EventFilter, FilterConfig};
use crate::watch::path_utils::{clean_path, to_slash};

/// State shared between the handle and the notification thread.
struct Shared {
    /// `None` once closed. Dropping the watcher ends the notification thread.
    watcher: Mutex<Option<RecommendedWatcher>>,
    watched: Mutex<Vec<PathBuf>>,
}

impl Shared {
    /// Subscribe to a single directory. Returns false if the set is closed
    /// or the OS refused.
    fn add(&self, dir: &Path) -> bool {
        let mut guard = self.watcher.lock();
        let Some(watcher) = guard.as_mut() else {
            return false;
        };

        // Re-adding refreshes a watch the OS dropped when the directory was
        // removed and created again.
        let _ = watcher.unwatch(dir);
        match watcher.watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                let mut watched = self.watched.lock();
                if !watched.iter().any(|d| d == dir) {
                    watched.push(dir.to_path_buf());
                }
                true
            }
            Err(err) => {
                error!(dir = %to_slash(dir), error = %err, "failed to watch directory");
                false
            }
        }
    }
}

/// The set of subscribed directories and the stream of filtered events.
///
/// Created -> Watching on [`WatchSet::new`], Watching -> Closed on the first
/// [`WatchSet::close`]. The set only grows while watching.
pub struct WatchSet {
    events_tx: mpsc::UnboundedSender<FileEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<FileEvent>>>,
    shared: Arc<Shared>,
    closed: AtomicBool,
    closed_tx: watch::Sender<bool>,
}

impl std::fmt::Debug for WatchSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSet")
            .field("watched", &self.shared.watched.lock().len())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl WatchSet {
    pub fn new(patterns: &[String], max_watch_dirs: usize, filter: FilterConfig) -> Result<Self> {
        Self::with_fs(patterns, max_watch_dirs, filter, Arc::new(RealFileSystem))
    }

    pub fn with_fs(
        patterns: &[String],
        max_watch_dirs: usize,
        filter: FilterConfig,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let candidates = find_candidate_directories(patterns);
        let dirs = actual_directories(fs.as_ref(), &candidates, max_watch_dirs)?;

        // notify calls back on its own thread; a std channel hands the raw
        // events to our loop without blocking it.
        let (raw_tx, raw_rx) = std_mpsc::channel::<notify::Result<Event>>();
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = raw_tx.send(res);
            },
            Config::default(),
        )?;

        let shared = Arc::new(Shared {
            watcher: Mutex::new(Some(watcher)),
            watched: Mutex::new(Vec::new()),
        });

        for dir in &dirs {
            if shared.add(dir) {
                debug!("gazing at: {}", to_slash(dir));
            }
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (closed_tx, _) = watch::channel(false);

        let notify_loop = NotifyLoop {
            raw_rx,
            events_tx: events_tx.clone(),
            shared: Arc::clone(&shared),
            candidates: CandidateSet::new(candidates),
            filter: EventFilter::new(filter),
            fs,
        };
        std::thread::Builder::new()
            .name("gazer-notify".to_string())
            .spawn(move || notify_loop.run())?;

        Ok(Self {
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            shared,
            closed: AtomicBool::new(false),
            closed_tx,
        })
    }

    /// Hand out the event stream. Only the first caller gets it.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<FileEvent>> {
        self.events_rx.lock().take()
    }

    /// Post an event back onto the stream. Never blocks.
    pub fn requeue(&self, event: FileEvent) {
        trace!(path = ?event.path, "requeue");
        if self.events_tx.send(event).is_err() {
            debug!("requeue dropped: event stream is gone");
        }
    }

    /// Release the OS watch handle. Only the call that performs the close
    /// returns true; every other call is a no-op.
    pub fn close(&self) -> bool {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let watcher = self.shared.watcher.lock().take();
        drop(watcher);
        self.closed_tx.send_replace(true);
        debug!("watch set closed");
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves to `true` once the set has been closed.
    pub fn closed(&self) -> watch::Receiver<bool> {
        self.closed_tx.subscribe()
    }

    /// Directories subscribed so far, in subscription order.
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        self.shared.watched.lock().clone()
    }
}

impl Drop for WatchSet {
    fn drop(&mut self) {
        self.close();
    }
}

/// The single routine that reads raw notifications, so growth of the watched
/// set is serialized.
struct NotifyLoop {
    raw_rx: std_mpsc::Receiver<notify::Result<Event>>,
    events_tx: mpsc::UnboundedSender<FileEvent>,
    shared: Arc<Shared>,
    candidates: CandidateSet,
    filter: EventFilter,
    fs: Arc<dyn FileSystem>,
}

impl NotifyLoop {
    fn run(mut self) {
        // Ends when the watcher (and with it the sending side) is dropped.
        while let Ok(res) = self.raw_rx.recv() {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "file watch error");
                    continue;
                }
            };

            let op = RawOp::from(&event.kind);
            for path in &event.paths {
                if !self.handle_path(path, op) {
                    debug!("notification loop finished: event stream is gone");
                    return;
                }
            }
        }
        debug!("notification loop finished");
    }

    /// Returns false when nobody is listening anymore.
    fn handle_path(&mut self, raw_path: &Path, op: RawOp) -> bool {
        let path = clean_path(raw_path);

        if op == RawOp::Create && self.candidates.should_watch(self.fs.as_ref(), &path) {
            self.watch_new_dir_tree(&path);
        }

        if !self
            .filter
            .should_execute(self.fs.as_ref(), &path, op, SystemTime::now())
        {
            return true;
        }

        debug!(path = %to_slash(&path), ?op, "notified");
        self.events_tx.send(FileEvent::new(path)).is_ok()
    }

    /// Subscribe to `root` and every directory below it.
    fn watch_new_dir_tree(&self, root: &Path) {
        let mut stack = vec![root.to_path_buf()];
        let mut visited = HashSet::new();

        while let Some(dir) = stack.pop() {
            if !visited.insert(dir.clone()) {
                continue;
            }
            if self.shared.add(&dir) {
                debug!("gazing at: {}", to_slash(&dir));
            }

            let children = match self.fs.read_dir(&dir) {
                Ok(children) => children,
                Err(err) => {
                    error!(error = %err, "ReadDir failed");
                    continue;
                }
            };
            stack.extend(
                children
                    .into_iter()
                    .filter(|child| self.fs.is_dir(child))
                    .map(|child| clean_path(&child)),
            );
        }
    }
}
