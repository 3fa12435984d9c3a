use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use super::r#trait::{Scheduler, Task, TimerHandle};

type TimerKey = (Duration, u64);

#[derive(Default)]
struct VirtualClock {
    now: Duration,
    next_seq: u64,
    pending: BTreeMap<TimerKey, Task>,
}

/// Manually driven clock. Time only moves on [`advance`](Self::advance);
/// due tasks run on the advancing thread in deadline order, ties broken by
/// scheduling order.
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    clock: Arc<Mutex<VirtualClock>>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the scheduler was created
    pub fn now(&self) -> Duration {
        self.clock.lock().now
    }

    pub fn pending(&self) -> usize {
        self.clock.lock().pending.len()
    }

    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        self.advance_to(target);
    }

    /// Move the clock to `target`, running every task due on the way.
    /// Moving backwards is a no-op.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let task = {
                let mut clock = self.clock.lock();
                let due = match clock.pending.keys().next() {
                    Some(key) if key.0 <= target => *key,
                    _ => break,
                };
                clock.now = clock.now.max(due.0);
                clock.pending.remove(&due)
            };
            // Lock released: the task may schedule or cancel timers
            if let Some(task) = task {
                task();
            }
        }

        let mut clock = self.clock.lock();
        clock.now = clock.now.max(target);
    }
}

struct VirtualTimer {
    clock: Weak<Mutex<VirtualClock>>,
    key: TimerKey,
}

impl TimerHandle for VirtualTimer {
    fn cancel(self: Box<Self>) {
        if let Some(clock) = self.clock.upgrade() {
            clock.lock().pending.remove(&self.key);
        }
    }
}

impl Scheduler for VirtualScheduler {
    fn after(&self, delay: Duration, task: Task) -> Box<dyn TimerHandle> {
        let mut clock = self.clock.lock();
        let key = (clock.now + delay, clock.next_seq);
        clock.next_seq += 1;
        clock.pending.insert(key, task);

        Box::new(VirtualTimer {
            clock: Arc::downgrade(&self.clock),
            key,
        })
    }
}
