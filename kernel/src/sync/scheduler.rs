// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;
use std::sync::Condvar;

use super::interrupt::InterruptController;

/// Identifies a kernel thread. Thread creation/teardown proper is an
/// external collaborator; this crate only needs a stable, comparable handle
/// for the threads it schedules.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(pub u32);

struct SchedulerState {
    live: HashSet<ThreadId>,
    asleep: HashSet<ThreadId>,
}

/// A minimal ready/sleep/live-thread-id service: just enough scheduler for a
/// mailbox or semaphore to block a thread on and wake it back up later.
///
/// `sleep` atomically enqueues the calling thread onto the wait set and
/// blocks; `ready_to_run` marks a thread runnable and wakes it. The
/// scheduler never hands a sleeping thread back out on its own -- something
/// else (a mailbox waking a blocked reader, a semaphore's `v`) must call
/// `ready_to_run` explicitly.
pub struct Scheduler {
    inner: InterruptController<SchedulerState>,
    wake: Condvar,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: InterruptController::new(SchedulerState { live: HashSet::new(), asleep: HashSet::new() }),
            wake: Condvar::new(),
        }
    }

    /// Registers a thread id as live, e.g. when a kernel thread starts.
    pub fn register(&self, id: ThreadId) {
        self.inner.raise().live.insert(id);
    }

    /// Retires a thread id, e.g. at thread termination.
    pub fn retire(&self, id: ThreadId) {
        let mut state = self.inner.raise();
        state.live.remove(&id);
        state.asleep.remove(&id);
    }

    /// Whether `id` currently names a live thread.
    pub fn is_valid(&self, id: ThreadId) -> bool {
        self.inner.raise().live.contains(&id)
    }

    /// Blocks the calling thread until some other thread calls
    /// `ready_to_run(id)`. Returns immediately if the thread is already not
    /// marked asleep (a pending wakeup is never lost).
    pub fn sleep(&self, id: ThreadId) {
        self.mark_asleep(id);
        self.park(id);
    }

    /// Records `id` as asleep without blocking. Split out from `sleep` so a
    /// caller that needs to enqueue itself on some other wait list first
    /// (a mailbox's `wait_read_list`) can do so and mark itself asleep
    /// while still holding that list's own lock, then `park` afterwards --
    /// closing the window where a wakeup could be missed between enqueueing
    /// and actually blocking.
    pub fn mark_asleep(&self, id: ThreadId) {
        self.inner.raise().asleep.insert(id);
    }

    /// Blocks until `id` is no longer marked asleep. Returns immediately if
    /// it already isn't (covers the wakeup-before-park race).
    pub fn park(&self, id: ThreadId) {
        let mut state = self.inner.raise();
        while state.asleep.contains(&id) {
            state = self.wake.wait(state).unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Marks `id` runnable, waking it if it is currently asleep.
    pub fn ready_to_run(&self, id: ThreadId) {
        let mut state = self.inner.raise();
        if state.asleep.remove(&id) {
            self.wake.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn valid_ids_track_registration() {
        let sched = Scheduler::new();
        let t = ThreadId(7);
        assert!(!sched.is_valid(t));
        sched.register(t);
        assert!(sched.is_valid(t));
        sched.retire(t);
        assert!(!sched.is_valid(t));
    }

    #[test]
    fn sleep_blocks_until_ready_to_run() {
        let sched = Arc::new(Scheduler::new());
        let t = ThreadId(1);
        sched.register(t);

        let sleeper = Arc::clone(&sched);
        let handle = thread::spawn(move || {
            sleeper.sleep(t);
        });

        thread::sleep(Duration::from_millis(50));
        sched.ready_to_run(t);
        handle.join().unwrap();
    }
}
