// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interrupt-level critical sections and the cooperative scheduler
//! primitives other modules block on.
//!
//! This crate only ever runs hosted, so "raising the interrupt level" has no
//! hardware to talk to: it's modelled as a process-wide lock standing in for
//! a single coarse critical section, with `Condvar::wait` giving "atomically
//! release the critical section while sleeping, reacquire on wake" for free.

mod interrupt;
mod scheduler;
mod semaphore;

pub use interrupt::InterruptController;
pub use scheduler::{Scheduler, ThreadId};
pub use semaphore::Semaphore;
