use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gazer::errors::InvokeError;
use gazer::exec::{CommandRunner, ProcessHandle, RunFuture};
use tokio::time::{Instant, sleep, sleep_until};

/// Counters shared between a [`FakeRunner`] and the test observing it.
#[derive(Debug, Default)]
pub struct RunnerStats {
    runs: AtomicUsize,
    current: AtomicUsize,
    max_concurrent: AtomicUsize,
    terminations: AtomicUsize,
    timeouts: AtomicUsize,
    commands: Mutex<Vec<String>>,
}

impl RunnerStats {
    /// Number of `run` calls that got as far as "starting" a process.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }

    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }

    pub fn timeouts(&self) -> usize {
        self.timeouts.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

/// A fake runner that:
/// - records which commands were "run"
/// - sleeps for `delay` instead of forking
/// - stops early when its handle is killed or the deadline passes.
#[derive(Debug, Clone)]
pub struct FakeRunner {
    delay: Duration,
    fail_on: Option<String>,
    stats: Arc<RunnerStats>,
}

impl FakeRunner {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail_on: None,
            stats: Arc::new(RunnerStats::default()),
        }
    }

    /// Commands containing `needle` exit with code 1.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn stats(&self) -> Arc<RunnerStats> {
        Arc::clone(&self.stats)
    }
}

impl CommandRunner for FakeRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
        deadline: Instant,
        handle: &'a ProcessHandle,
    ) -> RunFuture<'a> {
        Box::pin(async move {
            let stats = &self.stats;

            if handle.is_cancelled() {
                handle.mark_started(None);
                handle.mark_exited();
                stats.terminations.fetch_add(1, Ordering::SeqCst);
                return Err(InvokeError::Terminated {
                    elapsed: Duration::ZERO,
                });
            }

            stats.commands.lock().unwrap().push(command.to_string());
            let now = stats.current.fetch_add(1, Ordering::SeqCst) + 1;
            stats.max_concurrent.fetch_max(now, Ordering::SeqCst);
            stats.runs.fetch_add(1, Ordering::SeqCst);
            handle.mark_started(None);

            let start = Instant::now();
            let result = tokio::select! {
                _ = sleep(self.delay) => {
                    match &self.fail_on {
                        Some(needle) if command.contains(needle.as_str()) => {
                            Err(InvokeError::NonZeroExit { code: 1, elapsed: start.elapsed() })
                        }
                        _ => Ok(start.elapsed()),
                    }
                }
                _ = handle.terminated() => {
                    stats.terminations.fetch_add(1, Ordering::SeqCst);
                    Err(InvokeError::Terminated { elapsed: start.elapsed() })
                }
                _ = sleep_until(deadline) => {
                    stats.timeouts.fetch_add(1, Ordering::SeqCst);
                    Err(InvokeError::Timeout(start.elapsed()))
                }
            };

            stats.current.fetch_sub(1, Ordering::SeqCst);
            handle.mark_exited();
            result
        })
    }
}
