//! Discrete-event scheduler
//!
//! Keeps virtual time and a min-heap of pending resumptions keyed by
//! `(due_time, sequence)`. Processes live in an arena owned by the scheduler
//! and are referenced from the heap by [`ProcessId`]; a process runs
//! non-preemptively from one resumption until it returns its next suspension.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::wsn_interface::SimTime;

/// Index of a process in the scheduler arena
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct ProcessId(usize);

/// What a process asks for when it yields back to the scheduler
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Resume {
    /// suspend and resume again after the given delay
    After(SimTime),
    /// the process terminated
    Done,
}

/// A cooperative process driven by the scheduler.
///
/// `C` is the shared context the processes read and append to; only the
/// currently resumed process can touch it.
pub trait Process<C> {
    fn resume(&mut self, now: SimTime, ctx: &mut C) -> Resume;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledEvent {
    due: SimTime,
    seq: u64,
    process: ProcessId,
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest time first, then insertion order)
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct Scheduler<C> {
    now: SimTime,
    next_seq: u64,
    queue: BinaryHeap<ScheduledEvent>,
    processes: Vec<Box<dyn Process<C>>>,
    resumed: u64,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
            processes: Vec::new(),
            resumed: 0,
        }
    }

    /// Current virtual time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of resumptions executed so far
    pub fn resumed(&self) -> u64 {
        self.resumed
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Add a process to the arena and schedule its first resumption at `now`.
    pub fn spawn(&mut self, process: Box<dyn Process<C>>) -> ProcessId {
        let id = ProcessId(self.processes.len());
        self.processes.push(process);
        self.schedule_after(0, id);
        id
    }

    /// Enqueue a resumption of `process` at `now + delay`.
    pub fn schedule_after(&mut self, delay: SimTime, process: ProcessId) {
        let event = ScheduledEvent {
            due: self.now.saturating_add(delay),
            seq: self.next_seq,
            process,
        };
        self.next_seq += 1;
        self.queue.push(event);
    }

    /// Run every event due at or before `until`, then park the clock at the
    /// horizon. Processes still pending are abandoned in the queue.
    pub fn run(&mut self, until: SimTime, ctx: &mut C) {
        while let Some(event) = self.pop_due(until) {
            debug_assert!(event.due >= self.now, "virtual time went backwards");
            self.now = event.due;
            self.resumed += 1;

            let ProcessId(index) = event.process;
            match self.processes[index].resume(self.now, ctx) {
                Resume::After(delay) => self.schedule_after(delay, event.process),
                Resume::Done => {}
            }
        }

        self.now = self.now.max(until);
    }

    fn pop_due(&mut self, until: SimTime) -> Option<ScheduledEvent> {
        match self.queue.peek() {
            Some(event) if event.due <= until => self.queue.pop(),
            _ => None,
        }
    }
}
