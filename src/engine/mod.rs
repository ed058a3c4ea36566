// src/engine/mod.rs

//! Dispatch engine for gazer.
//!
//! This module ties together:
//! - command resolution (pattern match, config lookup, template rendering)
//! - the per-key bookkeeping of ongoing and pending invocations
//! - the per-key lock registry that serializes runs of one command
//! - the main event loop in [`gazer`], which reacts to filtered file events
//!   and spawns one task per invocation.
//!
//! The bookkeeping in [`invocations`] is synchronous and testable without
//! Tokio; the async shell is [`gazer::Gazer`].

pub mod gazer;
pub mod invocations;
pub mod locks;
pub mod progress;
pub mod resolve;
pub mod template;

pub use gazer::{Gazer, GazerOptions, default_max_watch_dirs};
pub use invocations::{Dispatch, Drain, Invocations, OngoingInvocation, Ticket};
pub use locks::LockRegistry;
pub use resolve::{invocation_key, resolve_commands, split_commands};
pub use template::{FileParams, Template, TemplateCache, TemplateError};
