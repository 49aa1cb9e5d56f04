// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the memory manager and mailbox.
//!
//! Recoverable conditions (exhaustion, invalid argument, resource
//! contention) are surfaced through these types and returned to the caller;
//! short-count swap I/O is treated as a bug and panics instead, since the
//! memory manager is defined to either complete a transfer fully or halt.

use thiserror::Error;

/// Failures a [`crate::memory::MemoryManager`] can report without aborting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    /// `page_size` was not a power of two, or `num_phys_pages` was zero.
    #[error("invalid memory configuration: page_size={page_size}, num_phys_pages={num_phys_pages}")]
    InvalidConfig { page_size: usize, num_phys_pages: usize },
}

/// Failures a [`crate::mailbox::Mailbox`] operation can report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MailboxError {
    /// `recId` does not name a thread the scheduler considers live.
    #[error("invalid recipient thread id")]
    InvalidRecipient,
    /// `Put` found no empty slot; it never blocks.
    #[error("mailbox full")]
    Full,
    /// A write permit was admitted but no empty slot was found. Should never
    /// happen at a quiescent point; kept as a defensive return instead of
    /// falling off the end of the scan.
    #[error("mailbox write permit admitted with no empty slot (invariant violation)")]
    Corrupt,
}
