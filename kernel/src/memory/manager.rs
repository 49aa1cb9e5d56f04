// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::error::MemoryError;
use crate::klog;

use super::bitmap::Bitmap;
use super::random_access::RandomAccessStore;
use super::translation::{PageFlags, TranslationEntry};

/// Page size in bytes and physical frame count. The virtual-page count is
/// always `2 * num_phys_pages`, giving every process page table room to map
/// twice as much address space as fits in physical memory at once.
#[derive(Debug, Clone, Copy)]
pub struct MemoryConfig {
    pub page_size: usize,
    pub num_phys_pages: usize,
}

impl MemoryConfig {
    pub fn num_virt_pages(&self) -> usize {
        self.num_phys_pages * 2
    }

    fn validate(&self) -> Result<(), MemoryError> {
        if self.page_size == 0 || !self.page_size.is_power_of_two() || self.num_phys_pages == 0 {
            return Err(MemoryError::InvalidConfig {
                page_size: self.page_size,
                num_phys_pages: self.num_phys_pages,
            });
        }
        Ok(())
    }
}

/// Owns the physical-frame bitmap, the virtual-page bitmap, the global page
/// table, a handle to the swap file, and -- standing in for the machine
/// simulator's linear main-memory buffer, an external collaborator this
/// crate doesn't implement -- the physical frame storage itself, since
/// something concrete has to hold frame contents for `load`/replacement to
/// operate on and for tests to observe round-trip behavior against.
pub struct MemoryManager {
    config: MemoryConfig,
    frame_bitmap: Bitmap,
    virtual_bitmap: Bitmap,
    page_table: Vec<TranslationEntry>,
    main_memory: Vec<u8>,
    swap: Box<dyn RandomAccessStore>,
}

impl MemoryManager {
    pub fn new(config: MemoryConfig, swap: Box<dyn RandomAccessStore>) -> Result<Self, MemoryError> {
        config.validate()?;
        let num_virt = config.num_virt_pages();
        assert!(
            swap.len() >= num_virt * config.page_size,
            "swap file of {} bytes too small to back {} virtual pages of {} bytes each",
            swap.len(),
            num_virt,
            config.page_size
        );

        Ok(Self {
            frame_bitmap: Bitmap::new(config.num_phys_pages),
            virtual_bitmap: Bitmap::new(num_virt),
            page_table: (0..num_virt).map(TranslationEntry::new).collect(),
            main_memory: vec![0u8; config.num_phys_pages * config.page_size],
            swap,
            config,
        })
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    pub fn num_phys_pages(&self) -> usize {
        self.config.num_phys_pages
    }

    pub fn num_virt_pages(&self) -> usize {
        self.config.num_virt_pages()
    }

    pub fn page_table(&self) -> &[TranslationEntry] {
        &self.page_table
    }

    /// Whether the frame bitmap bit for `frame` is set.
    pub fn frame_is_reserved(&self, frame: usize) -> bool {
        self.frame_bitmap.is_set(frame)
    }

    /// Whether the virtual-page bitmap bit for `v` is set.
    pub fn virtual_page_is_occupied(&self, v: usize) -> bool {
        self.virtual_bitmap.is_set(v)
    }

    pub fn frames_in_use(&self) -> usize {
        self.frame_bitmap.count_set()
    }

    pub fn virtual_pages_in_use(&self) -> usize {
        self.virtual_bitmap.count_set()
    }

    fn alloc(&mut self, frame: usize) {
        self.frame_bitmap.set(frame);
    }

    fn free(&mut self, frame: usize) {
        self.frame_bitmap.clear(frame);
    }

    /// Lowest-index frame whose bitmap bit is clear, or `num_phys_pages()`
    /// if all are reserved.
    pub fn find_free_frame(&self) -> usize {
        self.frame_bitmap.find_first_clear()
    }

    /// Scans the virtual-page bitmap in ascending order and collects the
    /// first `page_num` unset entries into a process page table. Returns
    /// `None`, performing no state change, if fewer than `page_num` virtual
    /// pages are free.
    pub fn start_vir_load(&mut self, page_num: usize) -> Option<Vec<usize>> {
        assert!(
            page_num <= self.num_virt_pages(),
            "page_num {} exceeds NumVirtPages {}",
            page_num,
            self.num_virt_pages()
        );

        let mut collected = Vec::with_capacity(page_num);
        for v in 0..self.num_virt_pages() {
            if collected.len() == page_num {
                break;
            }
            if !self.virtual_bitmap.is_set(v) {
                collected.push(v);
            }
        }

        if collected.len() != page_num {
            return None;
        }
        for &v in &collected {
            self.virtual_bitmap.set(v);
        }
        Some(collected)
    }

    /// Copies `num_bytes` bytes from `file` at `position` into the process's
    /// virtual image, starting at logical byte offset `prc_addr`. Writes go
    /// to the swap file, never to a physical frame: the swap file is the
    /// home of virtual pages, and `vir_load` only ever populates that home.
    ///
    /// Tolerates `prc_addr` not being page-aligned. A running `loaded` byte
    /// counter tracks progress through the three phases (ragged prefix,
    /// four-page-staged bulk transfer, ragged tail) instead of reusing a
    /// loop induction variable across phase boundaries.
    pub fn vir_load(
        &mut self,
        prc_pt: &[usize],
        prc_addr: usize,
        file: &dyn RandomAccessStore,
        num_bytes: usize,
        position: usize,
    ) {
        let page_size = self.page_size();
        let mut prc_page = prc_addr / page_size;
        let offset_in_page = prc_addr % page_size;
        let mut loaded = 0usize;

        // Phase 1: prefix up to the end of the first, possibly unaligned, page.
        let prefix_len = num_bytes.min(page_size - offset_in_page);
        if prefix_len > 0 {
            let mut buf = vec![0u8; prefix_len];
            file.read_at(&mut buf, position).expect("short read loading process image");
            let dest = prc_pt[prc_page] * page_size + offset_in_page;
            self.swap.write_at(&buf, dest).expect("short write to swap file");
        }
        loaded += prefix_len;
        if offset_in_page + prefix_len == page_size {
            prc_page += 1;
        }

        // Phase 2: bulk transfers staged through a four-page buffer.
        let stage_len = 4 * page_size;
        while loaded + stage_len <= num_bytes {
            let mut stage = vec![0u8; stage_len];
            file.read_at(&mut stage, position + loaded).expect("short read loading process image");
            for chunk in stage.chunks(page_size) {
                let dest = prc_pt[prc_page] * page_size;
                self.swap.write_at(chunk, dest).expect("short write to swap file");
                prc_page += 1;
            }
            loaded += stage_len;
        }

        // Phase 3: ragged tail -- whole pages, then a final partial page.
        if loaded < num_bytes {
            let remaining = num_bytes - loaded;
            let mut stage = vec![0u8; remaining];
            file.read_at(&mut stage, position + loaded).expect("short read loading process image");
            let mut tail_offset = 0usize;
            while remaining - tail_offset >= page_size {
                let dest = prc_pt[prc_page] * page_size;
                self.swap
                    .write_at(&stage[tail_offset..tail_offset + page_size], dest)
                    .expect("short write to swap file");
                prc_page += 1;
                tail_offset += page_size;
            }
            if tail_offset < remaining {
                let dest = prc_pt[prc_page] * page_size;
                self.swap.write_at(&stage[tail_offset..], dest).expect("short write to swap file");
            }
        }
    }

    /// Brings `num` consecutive process pages starting at `start_prc_page`
    /// into physical frames, running replacement when none are free.
    /// Returns the count actually loaded (`min(num, num_phys_pages())`).
    pub fn load(&mut self, start_prc_page: usize, prc_pt: &[usize], num: usize) -> usize {
        let limit = num.min(self.num_phys_pages());
        for i in 0..limit {
            let v = prc_pt[start_prc_page + i];
            let frame = self.find_free_frame();
            let frame = if frame != self.num_phys_pages() { frame } else { self.replace_frame() };
            self.load_into_frame(frame, v);
        }
        limit
    }

    fn load_into_frame(&mut self, frame: usize, page: usize) {
        self.alloc(frame);
        let page_size = self.page_size();
        let src = page * page_size;
        let mut buf = vec![0u8; page_size];
        self.swap.read_at(&mut buf, src).expect("short read from swap file");
        let dst = frame * page_size;
        self.main_memory[dst..dst + page_size].copy_from_slice(&buf);

        let read_only = self.page_table[page].read_only();
        let mut entry = TranslationEntry::new(page);
        entry.physical_page = frame;
        entry.set(PageFlags::VALID, true);
        entry.set(PageFlags::READ_ONLY, read_only);
        self.page_table[page] = entry;
        klog!("loaded virtual page {} into frame {}", page, frame);
    }

    fn write_back(&mut self, frame: usize, page: usize) {
        let page_size = self.page_size();
        let src = frame * page_size;
        let buf = self.main_memory[src..src + page_size].to_vec();
        let dest = page * page_size;
        self.swap.write_at(&buf, dest).expect("short write to swap file");
        self.page_table[page].set(PageFlags::DIRTY, false);
        klog!("wrote back virtual page {} from frame {}", page, frame);
    }

    /// Clock-with-write-back replacement. Pass A looks for a clean, unused
    /// resident page and claims its frame with no I/O. Failing that, pass B
    /// clears reference bits as it goes and evicts the first unused entry it
    /// finds, writing it back first. If pass B also comes up empty -- every
    /// valid entry had `use_bit` set and all are now cleared -- the outer
    /// loop retries pass A, which is now guaranteed to find a victim.
    ///
    /// `valid` is cleared before any I/O begins and before the frame bitmap
    /// bit is touched, so the victim frame is invisible to both
    /// `find_free_frame` (bitmap still set) and a concurrent `replace_frame`
    /// (valid bit clear) for the duration of the write-back.
    pub fn replace_frame(&mut self) -> usize {
        loop {
            if let Some(v) = (0..self.num_virt_pages())
                .find(|&v| self.page_table[v].valid() && !self.page_table[v].use_bit() && !self.page_table[v].dirty())
            {
                let frame = self.page_table[v].physical_page;
                self.page_table[v].set(PageFlags::VALID, false);
                klog!("evicted clean virtual page {} from frame {}", v, frame);
                return frame;
            }

            for v in 0..self.num_virt_pages() {
                if !self.page_table[v].valid() {
                    continue;
                }
                if !self.page_table[v].use_bit() {
                    let frame = self.page_table[v].physical_page;
                    self.page_table[v].set(PageFlags::VALID, false);
                    self.write_back(frame, v);
                    return frame;
                }
                self.page_table[v].set(PageFlags::USE, false);
            }
        }
    }

    /// For each `v` in `prc_pt[0..length)`, releases its frame if resident
    /// and unconditionally clears its virtual-page bitmap bit. Consumes
    /// `prc_pt`, since its owning process page table is destroyed.
    pub fn vir_release(&mut self, prc_pt: Vec<usize>, length: usize) {
        for &v in prc_pt.iter().take(length) {
            if self.page_table[v].valid() {
                self.page_table[v].set(PageFlags::VALID, false);
                let frame = self.page_table[v].physical_page;
                self.free(frame);
            }
            self.virtual_bitmap.clear(v);
        }
    }

    /// The resident frame contents for `v`, or `None` if not currently valid.
    pub fn read_resident_page(&self, v: usize) -> Option<&[u8]> {
        let entry = &self.page_table[v];
        if !entry.valid() {
            return None;
        }
        let page_size = self.page_size();
        let start = entry.physical_page * page_size;
        Some(&self.main_memory[start..start + page_size])
    }

    /// Simulates the machine storing `data` into resident virtual page `v`
    /// at `offset`, setting `use_bit` and `dirty` the way the simulator
    /// would on a real store instruction.
    pub fn simulate_store(&mut self, v: usize, offset: usize, data: &[u8]) {
        let entry = self.page_table[v];
        assert!(entry.valid(), "simulated store to non-resident virtual page {v}");
        let page_size = self.page_size();
        let start = entry.physical_page * page_size + offset;
        self.main_memory[start..start + data.len()].copy_from_slice(data);
        self.page_table[v].set(PageFlags::USE, true);
        self.page_table[v].set(PageFlags::DIRTY, true);
    }

    /// Simulates the machine reading from resident virtual page `v`,
    /// setting `use_bit` the way the simulator would on a real access.
    pub fn simulate_load(&mut self, v: usize, offset: usize, len: usize) -> Vec<u8> {
        let entry = self.page_table[v];
        assert!(entry.valid(), "simulated load from non-resident virtual page {v}");
        let page_size = self.page_size();
        let start = entry.physical_page * page_size + offset;
        let data = self.main_memory[start..start + len].to_vec();
        self.page_table[v].set(PageFlags::USE, true);
        data
    }
}
