// src/exec/process.rs

//! Spawning one sub-command and racing it against a deadline.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::process::Command;
use tokio::sync::{Notify, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::errors::InvokeError;
use crate::exec::command::parse_command;

/// Extra time granted when a deadline fires before the process exists.
pub const LAUNCH_GRACE: Duration = Duration::from_millis(5);

/// Timeouts beyond this are treated as "never".
const MAX_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Deadline `timeout` from now, clamped so far-future values cannot overflow.
pub fn deadline_after(timeout: Duration) -> Instant {
    Instant::now() + timeout.min(MAX_TIMEOUT)
}

#[derive(Debug, Default)]
struct HandleState {
    pid: Mutex<Option<u32>>,
    started: AtomicBool,
    exited: AtomicBool,
    cancelled: AtomicBool,
    terminate: Notify,
}

/// Shared view of a (possibly not yet started) process.
///
/// The scheduler keeps a clone in its ongoing record so it can terminate the
/// process from the event loop while the runner waits on it.
#[derive(Debug, Clone, Default)]
pub struct ProcessHandle {
    state: Arc<HandleState>,
}

impl ProcessHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_started(&self, pid: Option<u32>) {
        *self.state.pid.lock() = pid;
        self.state.started.store(true, Ordering::SeqCst);
    }

    pub fn mark_exited(&self) {
        self.state.exited.store(true, Ordering::Release);
    }

    pub fn pid(&self) -> Option<u32> {
        *self.state.pid.lock()
    }

    pub fn is_started(&self) -> bool {
        self.state.started.load(Ordering::SeqCst)
    }

    pub fn has_exited(&self) -> bool {
        self.state.exited.load(Ordering::Acquire)
    }

    /// Ask for termination even if the process has not started yet. A
    /// cancelled handle never runs, or is signalled right after spawning.
    ///
    /// Returns true if a started process was signalled here. `started` and
    /// `cancelled` are both SeqCst: either this call sees the start, or the
    /// runner sees the cancellation after marking the start.
    pub fn cancel(&self) -> bool {
        self.state.cancelled.store(true, Ordering::SeqCst);
        if kill(Some(self), "Restart") {
            return true;
        }
        self.request_termination();
        false
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`kill`] has been called on this handle.
    pub async fn terminated(&self) {
        self.state.terminate.notified().await
    }

    fn request_termination(&self) {
        // notify_one stores a permit, so a waiter that arrives late still wakes.
        self.state.terminate.notify_one();
    }
}

/// Ask a running process to stop.
///
/// SIGTERM on unix, a forced kill elsewhere. Returns false, doing nothing,
/// for a missing handle, a process that never started, or one that already
/// exited.
pub fn kill(handle: Option<&ProcessHandle>, reason: &str) -> bool {
    let Some(handle) = handle else {
        return false;
    };
    if !handle.is_started() || handle.has_exited() {
        return false;
    }

    #[cfg(unix)]
    if let Some(pid) = handle.pid() {
        use nix::sys::signal::{Signal, kill as send_signal};
        use nix::unistd::Pid;

        if let Err(err) = send_signal(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            info!("kill failed: {err}");
            return false;
        }
    }

    handle.request_termination();
    match handle.pid() {
        Some(pid) => info!("{reason}: {pid} has been killed"),
        None => info!("{reason}: process has been killed"),
    }
    true
}

/// Run `command` once with a fresh handle and `timeout`.
pub async fn invoke(command: &str, timeout: Duration) -> Result<Duration, InvokeError> {
    invoke_with(command, deadline_after(timeout), &ProcessHandle::new()).await
}

/// Run `command` until it exits or `deadline` passes, whichever comes first.
///
/// `handle` is updated as the process starts and exits, so another task can
/// [`kill`] it in the meantime.
pub async fn invoke_with(
    command: &str,
    deadline: Instant,
    handle: &ProcessHandle,
) -> Result<Duration, InvokeError> {
    let argv = parse_command(command)?;
    let started_at = Instant::now();

    let (result_tx, mut result_rx) = oneshot::channel();
    let runner_handle = handle.clone();
    tokio::spawn(async move {
        let result = execute(argv, &runner_handle).await;
        runner_handle.mark_exited();
        let _ = result_tx.send(result);
    });

    let mut deadline = deadline;
    loop {
        tokio::select! {
            result = &mut result_rx => {
                return result.unwrap_or(Err(InvokeError::Lost));
            }
            _ = sleep_until(deadline) => {
                if !handle.is_started() {
                    deadline = Instant::now() + LAUNCH_GRACE;
                    continue;
                }
                if !kill(Some(handle), "Timeout") {
                    // Exited between the deadline and the kill; collect it.
                    deadline = Instant::now() + LAUNCH_GRACE;
                    continue;
                }
                return Err(InvokeError::Timeout(started_at.elapsed()));
            }
        }
    }
}

async fn execute(argv: Vec<String>, handle: &ProcessHandle) -> Result<Duration, InvokeError> {
    let (program, args) = match argv.split_first() {
        Some(split) => split,
        None => return Err(InvokeError::EmptyCommand),
    };

    if handle.is_cancelled() {
        handle.mark_started(None);
        return Err(InvokeError::Terminated {
            elapsed: Duration::ZERO,
        });
    }

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let start = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(source) => {
            // Nothing to wait for; let the deadline loop stop waiting too.
            handle.mark_started(None);
            return Err(InvokeError::Spawn {
                program: program.clone(),
                source,
            });
        }
    };

    let pid = child.id();
    handle.mark_started(pid);
    match pid {
        Some(pid) => debug!("Pid: {pid}"),
        None => debug!("Pid: ????"),
    }
    if handle.is_cancelled() {
        kill(Some(handle), "Restart");
    }

    #[cfg(unix)]
    let status = child.wait().await;

    #[cfg(not(unix))]
    let status = tokio::select! {
        status = child.wait() => status,
        _ = handle.terminated() => {
            let _ = child.start_kill();
            child.wait().await
        }
    };

    let elapsed = start.elapsed();
    let status = status.map_err(InvokeError::Wait)?;

    match status.code() {
        Some(0) => Ok(elapsed),
        Some(code) => Err(InvokeError::NonZeroExit { code, elapsed }),
        None => Err(InvokeError::Terminated { elapsed }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_and_start_never_miss_each_other() {
        for _ in 0..2_000 {
            let handle = ProcessHandle::new();
            let barrier = Arc::new(std::sync::Barrier::new(2));

            let runner = {
                let handle = handle.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    handle.mark_started(None);
                    handle.is_cancelled()
                })
            };

            barrier.wait();
            let signalled = handle.cancel();
            let runner_saw_cancel = runner.join().unwrap();
            assert!(signalled || runner_saw_cancel);
        }
    }

    #[test]
    fn cancel_before_start_only_sets_the_flag() {
        let handle = ProcessHandle::new();
        assert!(!handle.cancel());
        assert!(handle.is_cancelled());
        assert!(!handle.is_started());
    }
}
