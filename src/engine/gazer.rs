// src/engine/gazer.rs

//! The event loop: one task reads filtered events and decides, per
//! invocation key, whether to start, queue, or restart a command.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::engine::invocations::{Dispatch, Drain, Invocations, Ticket};
use crate::engine::locks::LockRegistry;
use crate::engine::progress::ProgressLog;
use crate::engine::resolve::{invocation_key, resolve_commands};
use crate::engine::template::TemplateCache;
use crate::errors::{GazerError, Result};
use crate::exec::{CommandRunner, ProcessHandle, ProcessRunner, deadline_after};
use crate::watch::path_utils::clean_str;
use crate::watch::{FileEvent, FilterConfig, WatchPatterns, WatchSet};

/// Default cap on subscribed directories.
pub fn default_max_watch_dirs() -> usize {
    if cfg!(target_os = "macos") { 100 } else { 10_000 }
}

#[derive(Debug, Clone, Copy)]
pub struct GazerOptions {
    pub max_watch_dirs: usize,
    pub filter: FilterConfig,
}

impl Default for GazerOptions {
    fn default() -> Self {
        Self {
            max_watch_dirs: default_max_watch_dirs(),
            filter: FilterConfig::default(),
        }
    }
}

struct Inner {
    patterns: WatchPatterns,
    watch_set: WatchSet,
    runner: Arc<dyn CommandRunner>,
    invocations: Invocations,
    locks: LockRegistry,
    templates: TemplateCache,
    invoke_count: AtomicU64,
}

/// Watches the patterns and runs the configured command for each update.
///
/// Cloning is cheap; clones share the same watch set and bookkeeping.
#[derive(Clone)]
pub struct Gazer {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Gazer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gazer")
            .field("patterns", &self.inner.patterns)
            .field("watch_set", &self.inner.watch_set)
            .field("invoke_count", &self.invoke_count())
            .finish()
    }
}

impl Gazer {
    pub fn new(patterns: &[String], max_watch_dirs: usize) -> Result<Self> {
        let options = GazerOptions {
            max_watch_dirs,
            ..GazerOptions::default()
        };
        Self::with_options(patterns, options, Arc::new(ProcessRunner))
    }

    pub fn with_options(
        patterns: &[String],
        options: GazerOptions,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        let patterns: Vec<String> = patterns
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| clean_str(p))
            .collect();
        let watch_set = WatchSet::new(&patterns, options.max_watch_dirs, options.filter)?;

        Ok(Self {
            inner: Arc::new(Inner {
                patterns: WatchPatterns::new(&patterns),
                watch_set,
                runner,
                invocations: Invocations::new(),
                locks: LockRegistry::new(),
                templates: TemplateCache::new(),
                invoke_count: AtomicU64::new(0),
            }),
        })
    }

    /// Watch until Ctrl-C.
    pub async fn run(&self, config: Config, timeout_ms: i64, restart: bool) -> Result<()> {
        self.run_until(config, timeout_ms, restart, interrupted()).await
    }

    /// Watch until `shutdown` resolves or the watch set is closed.
    ///
    /// Running invocations are not cancelled on return; they finish or time
    /// out on their own.
    pub async fn run_until<F>(
        &self,
        config: Config,
        timeout_ms: i64,
        restart: bool,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if timeout_ms <= 0 {
            return Err(GazerError::InvalidTimeout(timeout_ms));
        }
        let mut events = self
            .inner
            .watch_set
            .take_events()
            .ok_or(GazerError::AlreadyRunning)?;

        let config = Arc::new(config);
        let timeout = Duration::from_millis(timeout_ms.unsigned_abs());

        let closed = wait_closed(self.inner.watch_set.closed());
        tokio::pin!(closed);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    debug!("shutdown requested");
                    break;
                }
                _ = &mut closed => {
                    debug!("watch set closed; leaving event loop");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        trace!(path = ?event.path, "Receive");
                        self.handle_event(&config, timeout, restart, event);
                    }
                    None => break,
                },
            }
        }

        Ok(())
    }

    /// Dispatch one event. Only bookkeeping happens here; the invocation
    /// itself runs on its own task.
    fn handle_event(&self, config: &Arc<Config>, timeout: Duration, restart: bool, event: FileEvent) {
        let inner = &self.inner;
        let Some(commands) =
            resolve_commands(&inner.patterns, config, &inner.templates, &event.path)
        else {
            return;
        };
        let key = invocation_key(&commands);

        let ticket = match inner.invocations.dispatch(&key, event, restart) {
            Dispatch::Queued => {
                debug!(key = %key, "busy; event queued");
                return;
            }
            Dispatch::Start { ticket, preempted } => {
                if let Some(process) = preempted.and_then(|p| p.process) {
                    process.cancel();
                }
                ticket
            }
        };

        inner.invoke_count.fetch_add(1, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        let config = Arc::clone(config);
        tokio::spawn(async move {
            inner.invoke(commands, key, ticket, timeout, &config).await;
        });
    }

    /// Release the watch set. Safe to call any number of times.
    pub fn close(&self) {
        self.inner.watch_set.close();
    }

    /// Number of invocations started so far.
    pub fn invoke_count(&self) -> u64 {
        self.inner.invoke_count.load(Ordering::SeqCst)
    }

    /// Feed an event into the loop as if the watcher had produced it.
    pub fn requeue(&self, event: FileEvent) {
        self.inner.watch_set.requeue(event);
    }

    pub fn watch_set(&self) -> &WatchSet {
        &self.inner.watch_set
    }

    /// Keys with an invocation running or waiting for its lock.
    pub fn ongoing_count(&self) -> usize {
        self.inner.invocations.ongoing_len()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.invocations.pending_len()
    }
}

impl Inner {
    async fn invoke(
        &self,
        commands: Vec<String>,
        key: String,
        ticket: Ticket,
        timeout: Duration,
        config: &Config,
    ) {
        let lock = self.locks.get(&key);
        let guard = lock.lock().await;
        trace!(key = %key, "Lock");

        let launched_at = Instant::now();
        self.invocations
            .mark_launched(&key, ticket.generation, launched_at);

        // One deadline covers the whole sequence.
        let deadline = deadline_after(timeout);
        let progress = ProgressLog::new(&config.log, &self.templates);
        let total = commands.len();

        for (index, command) in commands.iter().enumerate() {
            if ticket.is_preempted() {
                debug!(key = %key, "preempted; skipping remaining commands");
                break;
            }

            let handle = ProcessHandle::new();
            if !self
                .invocations
                .attach_process(&key, ticket.generation, handle.clone())
            {
                break;
            }

            progress.start(command, index, total);
            let started = Instant::now();
            let result = self.runner.run(command, deadline, &handle).await;
            let elapsed = match &result {
                Ok(elapsed) => *elapsed,
                Err(err) => err.elapsed().unwrap_or_else(|| started.elapsed()),
            };
            progress.end(command, elapsed);

            if let Err(err) = result {
                info!("{err}");
                break;
            }
        }

        match self.invocations.finish(&key, ticket.generation, launched_at) {
            Drain::Idle | Drain::Superseded => {}
            Drain::Abolished(event) => {
                debug!(path = ?event.path, "Abolish: pending event predates launch");
            }
            Drain::Requeue(event) => self.watch_set.requeue(event),
        }

        drop(guard);
        trace!(key = %key, "Unlock");
    }
}

async fn wait_closed(mut closed: watch::Receiver<bool>) {
    let _ = closed.wait_for(|closed| *closed).await;
}

async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
