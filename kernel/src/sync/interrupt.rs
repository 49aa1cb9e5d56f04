// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::{Mutex, MutexGuard};

/// A raised-interrupt-level critical section guarding some piece of kernel
/// state `T`.
///
/// On real hardware this would turn interrupts off for the duration of the
/// guard and back on when it drops; since this crate only runs hosted, a
/// per-region lock gives the same "one operation touches this state at a
/// time, and the region is left on every exit path" property. Because the
/// guard is an ordinary `MutexGuard`, it can be handed straight to a
/// `Condvar::wait`, which is exactly the "sleeping atomically releases the
/// critical section and re-raises it on return" behavior a blocked mailbox
/// read needs.
pub struct InterruptController<T> {
    state: Mutex<T>,
}

impl<T> InterruptController<T> {
    pub fn new(data: T) -> Self {
        Self { state: Mutex::new(data) }
    }

    /// Raises the interrupt level, returning exclusive access to the guarded
    /// state. Lowered again when the returned guard is dropped.
    pub fn raise(&self) -> MutexGuard<'_, T> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
