// SPDX-License-Identifier: MIT OR Apache-2.0

//! Demand-paged virtual memory manager.
//!
//! Multiplexes `num_phys_pages` physical frames over `2 * num_phys_pages`
//! virtual pages backed by a swap file, using a clock-with-write-back
//! replacement policy.

mod bitmap;
mod manager;
mod random_access;
mod translation;

pub use bitmap::Bitmap;
pub use manager::{MemoryConfig, MemoryManager};
pub use random_access::{FileBackedStore, InMemoryStore, RandomAccessStore};
pub use translation::{PageFlags, TranslationEntry};
