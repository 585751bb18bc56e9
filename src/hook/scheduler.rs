use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    time::Duration,
};

use parse_display::Display;
use slabmap::SlabMap;


/// Deferred work supplied by the host framework.
pub trait Scheduler {
    /// Runs `task` after the current call stack has unwound.
    fn defer(&self, task: Box<dyn FnOnce()>);

    /// Runs `task` once `after` has elapsed.
    fn delay(&self, after: Duration, task: Box<dyn FnOnce()>) -> TimerId;

    /// Cancels a task scheduled by [`Scheduler::delay`]. Does nothing if it
    /// already ran or was cancelled.
    fn cancel(&self, id: TimerId);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[display("timer #{seq}")]
pub struct TimerId {
    slot: usize,
    seq: usize,
}

/// A [`Scheduler`] driven by hand, with a virtual clock.
///
/// Nothing runs until [`run_pending`](Self::run_pending) or
/// [`advance`](Self::advance) is called. Timers with the same deadline run in
/// the order they were scheduled.
#[derive(Default)]
pub struct ManualScheduler(RefCell<Queue>);

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    deadline: Duration,
    seq: usize,
}

struct Timer {
    key: Key,
    task: Box<dyn FnOnce()>,
}

struct Queue {
    now: Duration,
    next_seq: usize,
    deferred: VecDeque<Box<dyn FnOnce()>>,
    timers: BTreeMap<Key, usize>,
    entries: SlabMap<Timer>,
}

impl Default for Queue {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            deferred: VecDeque::new(),
            timers: BTreeMap::new(),
            entries: SlabMap::new(),
        }
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.0.borrow().now
    }

    /// Number of deferred tasks and timers that have not run yet.
    pub fn pending_count(&self) -> usize {
        let q = self.0.borrow();
        q.deferred.len() + q.entries.len()
    }

    /// Runs deferred tasks, including ones they defer, until none are left.
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut count = 0;
        loop {
            let task = self.0.borrow_mut().deferred.pop_front();
            let Some(task) = task else {
                return count;
            };
            task();
            count += 1;
        }
    }

    /// Moves the clock forward by `duration`, running every timer that comes
    /// due in deadline order, and the deferred tasks after each of them.
    pub fn advance(&self, duration: Duration) {
        self.run_pending();
        let target = self.now() + duration;
        while let Some(task) = self.pop_due(target) {
            task();
            self.run_pending();
        }
        self.0.borrow_mut().now = target;
    }

    fn pop_due(&self, target: Duration) -> Option<Box<dyn FnOnce()>> {
        let mut q = self.0.borrow_mut();
        let (&key, &slot) = q.timers.first_key_value()?;
        if key.deadline > target {
            return None;
        }
        q.timers.remove(&key);
        q.now = key.deadline;
        q.entries.remove(slot).map(|timer| timer.task)
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, task: Box<dyn FnOnce()>) {
        self.0.borrow_mut().deferred.push_back(task);
    }

    fn delay(&self, after: Duration, task: Box<dyn FnOnce()>) -> TimerId {
        let mut q = self.0.borrow_mut();
        let seq = q.next_seq;
        q.next_seq += 1;
        let key = Key {
            deadline: q.now + after,
            seq,
        };
        let slot = q.entries.insert(Timer { key, task });
        q.timers.insert(key, slot);
        TimerId { slot, seq }
    }

    fn cancel(&self, id: TimerId) {
        let mut q = self.0.borrow_mut();
        let matches = q.entries.get(id.slot).is_some_and(|t| t.key.seq == id.seq);
        if matches {
            if let Some(timer) = q.entries.remove(id.slot) {
                q.timers.remove(&timer.key);
            }
        }
    }
}
