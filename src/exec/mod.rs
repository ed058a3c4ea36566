// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] splits a rendered command line into arguments.
//! - [`process`] spawns one process with inherited stdio and races it
//!   against a deadline; [`process::kill`] terminates it.
//! - [`backend`] provides the `CommandRunner` trait the scheduler uses, and
//!   the real `ProcessRunner`.

pub mod backend;
pub mod command;
pub mod process;

pub use backend::{CommandRunner, ProcessRunner, RunFuture};
pub use command::parse_command;
pub use process::{LAUNCH_GRACE, ProcessHandle, deadline_after, invoke, invoke_with, kill};
