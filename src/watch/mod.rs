// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Deriving the directories to subscribe to from the watch patterns.
//! - Wiring up a cross-platform filesystem watcher (`notify`) that grows
//!   when matching directories are created.
//! - Debouncing raw notifications into `FileEvent`s.
//!
//! It does **not** know about commands; it only turns filesystem changes
//! into events.

pub mod candidates;
pub mod event;
pub mod filter;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use candidates::{
    CandidateSet, actual_directories, find_candidate_directories, parse_path_pattern,
};
pub use event::{FileEvent, RawOp};
pub use filter::{EventFilter, FilterConfig};
pub use patterns::WatchPatterns;
pub use watcher::WatchSet;
