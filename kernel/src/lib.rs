// SPDX-License-Identifier: MIT OR Apache-2.0

//! Demand-paged virtual memory and a bounded thread mailbox for a hosted
//! teaching kernel.
//!
//! `memory` multiplexes a fixed pool of physical frames over a larger
//! virtual-page space backed by a swap file. `mailbox` is a bounded,
//! thread-addressed inbox used for inter-thread message passing. `kernel`
//! ties both to a scheduler behind one explicit context struct; `syscall`
//! implements the kernel-side half of the system calls a user-mode shell
//! built on top of this would issue.

pub mod debug;
pub mod error;
pub mod kernel;
pub mod mailbox;
pub mod memory;
pub mod sync;
pub mod syscall;

pub use kernel::{Kernel, KernelConfig};
