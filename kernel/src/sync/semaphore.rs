// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Condvar;

use super::interrupt::InterruptController;

/// Classic counting semaphore with blocking `p`/`v`. Backs the mailbox's
/// write-permit gate.
pub struct Semaphore {
    count: InterruptController<usize>,
    available: Condvar,
}

impl Semaphore {
    pub fn new(initial: usize) -> Self {
        Self { count: InterruptController::new(initial), available: Condvar::new() }
    }

    /// Blocks until a permit is available, then takes it.
    pub fn p(&self) {
        let mut count = self.count.raise();
        while *count == 0 {
            count = self.available.wait(count).unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *count -= 1;
    }

    /// Returns a permit, waking one waiter if any are blocked in `p`.
    pub fn v(&self) {
        *self.count.raise() += 1;
        self.available.notify_one();
    }

    /// Current permit count, for invariant checks in tests.
    pub fn value(&self) -> usize {
        *self.count.raise()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn p_blocks_until_v() {
        let sem = Arc::new(Semaphore::new(0));
        let waiter = Arc::clone(&sem);
        let handle = thread::spawn(move || {
            waiter.p();
        });

        thread::sleep(Duration::from_millis(50));
        assert_eq!(sem.value(), 0);
        sem.v();
        handle.join().unwrap();
    }

    #[test]
    fn value_round_trips() {
        let sem = Semaphore::new(2);
        sem.p();
        assert_eq!(sem.value(), 1);
        sem.v();
        assert_eq!(sem.value(), 2);
    }
}
