// src/engine/invocations.rs

//! Bookkeeping of ongoing and pending invocations per key.
//!
//! Every method is a short critical section; nothing here awaits.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use crate::exec::ProcessHandle;
use crate::watch::FileEvent;

/// Identifies one dispatch, so a preempted task cannot clear the record of
/// the task that replaced it.
pub type Generation = u64;

#[derive(Debug, Clone)]
pub struct OngoingInvocation {
    pub generation: Generation,
    /// Set once the per-key lock is held.
    pub launched_at: Option<Instant>,
    /// The sub-command currently running, if any.
    pub process: Option<ProcessHandle>,
    preempted: Arc<AtomicBool>,
}

/// Handed to the task that runs a dispatch.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub generation: Generation,
    preempted: Arc<AtomicBool>,
}

impl Ticket {
    /// True once a restart replaced this dispatch.
    pub fn is_preempted(&self) -> bool {
        self.preempted.load(Ordering::Acquire)
    }
}

/// Outcome of [`Invocations::dispatch`].
#[derive(Debug)]
pub enum Dispatch {
    /// The key is busy; the event became its pending event.
    Queued,
    /// A new invocation must be started with `ticket`. `preempted` is the
    /// record it replaced in restart mode, whose process must be stopped.
    Start {
        ticket: Ticket,
        preempted: Option<OngoingInvocation>,
    },
}

/// What to do with the key after an invocation finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drain {
    Idle,
    /// The pending event is older than the launch and is dropped.
    Abolished(FileEvent),
    /// The pending event must be processed again.
    Requeue(FileEvent),
    /// A newer dispatch owns the key; nothing was touched.
    Superseded,
}

#[derive(Debug, Default)]
struct Table {
    ongoing: HashMap<String, OngoingInvocation>,
    pending: HashMap<String, FileEvent>,
    next_generation: Generation,
}

#[derive(Debug, Default)]
pub struct Invocations {
    table: Mutex<Table>,
}

impl Invocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide, in one critical section, whether `event` starts a new
    /// invocation of `key` or waits for the ongoing one.
    pub fn dispatch(&self, key: &str, event: FileEvent, restart: bool) -> Dispatch {
        let mut table = self.table.lock();

        let preempted = if table.ongoing.contains_key(key) {
            if !restart {
                table.pending.insert(key.to_string(), event);
                return Dispatch::Queued;
            }
            take_preempted(&mut table, key)
        } else {
            None
        };

        Dispatch::Start {
            ticket: begin_in(&mut table, key),
            preempted,
        }
    }

    pub fn mark_launched(&self, key: &str, generation: Generation, at: Instant) {
        if let Some(ongoing) = owned_mut(&mut self.table.lock(), key, generation) {
            ongoing.launched_at = Some(at);
        }
    }

    /// Returns false if `generation` no longer owns the key.
    pub fn attach_process(&self, key: &str, generation: Generation, process: ProcessHandle) -> bool {
        match owned_mut(&mut self.table.lock(), key, generation) {
            Some(ongoing) => {
                ongoing.process = Some(process);
                true
            }
            None => false,
        }
    }

    /// Close the dispatch `generation` of `key` and drain its pending event.
    pub fn finish(&self, key: &str, generation: Generation, launched_at: Instant) -> Drain {
        let mut table = self.table.lock();

        match table.ongoing.get(key) {
            Some(ongoing) if ongoing.generation == generation => {}
            _ => return Drain::Superseded,
        }
        table.ongoing.remove(key);

        match table.pending.remove(key) {
            None => Drain::Idle,
            Some(event) if launched_at > event.at => Drain::Abolished(event),
            Some(event) => Drain::Requeue(event),
        }
    }

    pub fn ongoing_len(&self) -> usize {
        self.table.lock().ongoing.len()
    }

    pub fn pending_len(&self) -> usize {
        self.table.lock().pending.len()
    }
}

fn begin_in(table: &mut Table, key: &str) -> Ticket {
    table.next_generation += 1;
    let generation = table.next_generation;
    let preempted = Arc::new(AtomicBool::new(false));
    table.ongoing.insert(
        key.to_string(),
        OngoingInvocation {
            generation,
            launched_at: None,
            process: None,
            preempted: Arc::clone(&preempted),
        },
    );
    Ticket {
        generation,
        preempted,
    }
}

fn take_preempted(table: &mut Table, key: &str) -> Option<OngoingInvocation> {
    let removed = table.ongoing.remove(key)?;
    removed.preempted.store(true, Ordering::Release);
    Some(removed)
}

fn owned_mut<'t>(
    table: &'t mut Table,
    key: &str,
    generation: Generation,
) -> Option<&'t mut OngoingInvocation> {
    table
        .ongoing
        .get_mut(key)
        .filter(|ongoing| ongoing.generation == generation)
}

#[cfg(test)]
impl Invocations {
    fn get(&self, key: &str) -> Option<OngoingInvocation> {
        self.table.lock().ongoing.get(key).cloned()
    }

    fn is_ongoing(&self, key: &str) -> bool {
        self.table.lock().ongoing.contains_key(key)
    }

    fn begin(&self, key: &str) -> Ticket {
        begin_in(&mut self.table.lock(), key)
    }

    fn preempt(&self, key: &str) -> Option<OngoingInvocation> {
        take_preempted(&mut self.table.lock(), key)
    }

    fn enqueue(&self, key: &str, event: FileEvent) {
        self.table.lock().pending.insert(key.to_string(), event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn finish_without_pending_goes_idle() {
        let inv = Invocations::new();
        let ticket = inv.begin("k");
        assert!(inv.is_ongoing("k"));
        assert_eq!(inv.finish("k", ticket.generation, Instant::now()), Drain::Idle);
        assert!(!inv.is_ongoing("k"));
    }

    #[test]
    fn pending_older_than_launch_is_abolished() {
        let inv = Invocations::new();
        let before = Instant::now();
        let ticket = inv.begin("k");
        let launched = before + Duration::from_millis(10);

        inv.enqueue("k", FileEvent::at("a.py", before));
        match inv.finish("k", ticket.generation, launched) {
            Drain::Abolished(ev) => assert_eq!(ev.at, before),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(inv.pending_len(), 0);
        assert_eq!(inv.ongoing_len(), 0);
    }

    #[test]
    fn pending_newer_than_launch_is_requeued() {
        let inv = Invocations::new();
        let launched = Instant::now();
        let ticket = inv.begin("k");

        inv.enqueue("k", FileEvent::at("a.py", launched + Duration::from_millis(1)));
        inv.enqueue("k", FileEvent::at("b.py", launched + Duration::from_millis(2)));
        assert_eq!(inv.pending_len(), 1);

        match inv.finish("k", ticket.generation, launched) {
            Drain::Requeue(ev) => assert_eq!(ev.path, std::path::PathBuf::from("b.py")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!inv.is_ongoing("k"));
    }

    #[test]
    fn dispatch_queues_while_busy_unless_restarting() {
        let inv = Invocations::new();

        let first = match inv.dispatch("k", FileEvent::new("a.py"), false) {
            Dispatch::Start { ticket, preempted } => {
                assert!(preempted.is_none());
                ticket
            }
            Dispatch::Queued => panic!("idle key must start"),
        };
        assert!(matches!(inv.dispatch("k", FileEvent::new("a.py"), false), Dispatch::Queued));
        assert_eq!(inv.pending_len(), 1);

        match inv.dispatch("k", FileEvent::new("a.py"), true) {
            Dispatch::Start { ticket, preempted } => {
                assert_eq!(preempted.unwrap().generation, first.generation);
                assert!(first.is_preempted());
                assert!(ticket.generation > first.generation);
            }
            Dispatch::Queued => panic!("restart must start"),
        }
        assert_eq!(inv.ongoing_len(), 1);
    }

    #[test]
    fn preempted_dispatch_cannot_clear_its_successor() {
        let inv = Invocations::new();
        let old = inv.begin("k");
        let removed = inv.preempt("k").unwrap();
        assert_eq!(removed.generation, old.generation);
        assert!(old.is_preempted());

        let new = inv.begin("k");
        inv.enqueue("k", FileEvent::new("a.py"));
        assert_eq!(inv.finish("k", old.generation, Instant::now()), Drain::Superseded);
        assert!(inv.is_ongoing("k"));
        assert_eq!(inv.pending_len(), 1);
        assert!(!new.is_preempted());

        inv.mark_launched("k", old.generation, Instant::now());
        assert!(inv.get("k").unwrap().launched_at.is_none());
        assert!(!inv.attach_process("k", old.generation, ProcessHandle::new()));
        assert!(inv.attach_process("k", new.generation, ProcessHandle::new()));
    }
}
