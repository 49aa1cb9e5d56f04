// SPDX-License-Identifier: MIT OR Apache-2.0

use bitflags::bitflags;

bitflags! {
    /// Per-page residency and access flags, set by the replacement policy
    /// and (notionally) by the machine simulator on every access.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFlags: u8 {
        /// This virtual page currently occupies `physical_page` and that
        /// frame is reserved on its behalf.
        const VALID     = 0b0001;
        /// Reference bit: set by the simulator on access, cleared by the
        /// replacement policy.
        const USE       = 0b0010;
        /// Write bit: set by the simulator on store.
        const DIRTY     = 0b0100;
        /// Static per-page attribute, unused by the replacement policy but
        /// preserved because the simulator reads it.
        const READ_ONLY = 0b1000;
    }
}

/// One per virtual page. Field names are preserved verbatim (modulo Rust's
/// `snake_case` convention) because the machine simulator this crate is
/// embedded in reads and writes them directly on every translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationEntry {
    /// Its own index; fixed at initialization.
    pub virtual_page: usize,
    /// Frame index when resident; meaningless unless `valid()`.
    pub physical_page: usize,
    pub flags: PageFlags,
}

impl TranslationEntry {
    pub fn new(virtual_page: usize) -> Self {
        Self { virtual_page, physical_page: 0, flags: PageFlags::empty() }
    }

    pub fn valid(&self) -> bool {
        self.flags.contains(PageFlags::VALID)
    }

    pub fn use_bit(&self) -> bool {
        self.flags.contains(PageFlags::USE)
    }

    pub fn dirty(&self) -> bool {
        self.flags.contains(PageFlags::DIRTY)
    }

    pub fn read_only(&self) -> bool {
        self.flags.contains(PageFlags::READ_ONLY)
    }

    pub fn set(&mut self, flag: PageFlags, value: bool) {
        self.flags.set(flag, value);
    }
}
