// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! The scheduler talks to a `CommandRunner` instead of spawning processes
//! itself. Production code uses [`ProcessRunner`]; tests swap in a fake that
//! sleeps instead of forking, so concurrency can be observed directly.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Instant;

use crate::errors::InvokeError;
use crate::exec::process::{ProcessHandle, invoke_with};

pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<Duration, InvokeError>> + Send + 'a>>;

/// Runs one rendered sub-command.
///
/// Implementations must call [`ProcessHandle::mark_started`] once the
/// process exists and stop early when the handle is killed.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(&'a self, command: &'a str, deadline: Instant, handle: &'a ProcessHandle)
    -> RunFuture<'a>;
}

/// Real runner used by the `gazer` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
        deadline: Instant,
        handle: &'a ProcessHandle,
    ) -> RunFuture<'a> {
        Box::pin(invoke_with(command, deadline, handle))
    }
}
