// src/watch/event.rs

use std::path::PathBuf;
use std::time::Instant;

use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};

/// A change that passed the debounce filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    /// Monotonic acceptance time, compared with launch instants when a
    /// pending event is drained.
    pub at: Instant,
}

impl FileEvent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::at(path, Instant::now())
    }

    pub fn at(path: impl Into<PathBuf>, at: Instant) -> Self {
        Self {
            path: path.into(),
            at,
        }
    }

}

/// The raw operation reported by the OS notifier, reduced to what the
/// filter distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawOp {
    Write,
    Create,
    Rename,
    Remove,
    Chmod,
    Other,
}

impl From<&EventKind> for RawOp {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => RawOp::Create,
            // The target of a rename-over save is reported on its own as
            // `To`; it is a new file at that path. `Both` repeats the pair.
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => RawOp::Create,
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => RawOp::Other,
            EventKind::Modify(ModifyKind::Name(_)) => RawOp::Rename,
            EventKind::Modify(ModifyKind::Metadata(_)) => RawOp::Chmod,
            EventKind::Modify(_) => RawOp::Write,
            EventKind::Remove(_) => RawOp::Remove,
            EventKind::Access(_) | EventKind::Any | EventKind::Other => RawOp::Other,
        }
    }
}
