// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

/// A random-access byte store: the swap file's home for virtual pages, and
/// the executable image `vir_load` copies from. The underlying file system
/// is treated as an external collaborator; this crate only needs it to
/// behave like "a random-access byte store."
///
/// Implementations take `&self` rather than `&mut self` so a
/// [`MemoryManager`](super::MemoryManager) can hold one behind a shared
/// reference; the single point of mutual exclusion is the caller's own
/// critical section (see `sync::InterruptController`), since the swap file
/// is single-writer under that section.
pub trait RandomAccessStore: Send + Sync {
    /// Reads exactly `buf.len()` bytes starting at `offset`. A short read is
    /// an I/O assertion failure: it is not this trait's job to partially
    /// fill `buf`.
    fn read_at(&self, buf: &mut [u8], offset: usize) -> io::Result<()>;

    /// Writes exactly `buf.len()` bytes starting at `offset`.
    fn write_at(&self, buf: &[u8], offset: usize) -> io::Result<()>;

    /// Total addressable length in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An in-memory byte store, for tests and for embedders that don't want a
/// real file backing the swap space.
pub struct InMemoryStore {
    data: Mutex<Vec<u8>>,
}

impl InMemoryStore {
    pub fn new(size: usize) -> Self {
        Self { data: Mutex::new(vec![0u8; size]) }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { data: Mutex::new(bytes) }
    }
}

impl RandomAccessStore for InMemoryStore {
    fn read_at(&self, buf: &mut [u8], offset: usize) -> io::Result<()> {
        let data = self.data.lock().unwrap_or_else(|p| p.into_inner());
        let end = offset
            .checked_add(buf.len())
            .filter(|&end| end <= data.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "short read"))?;
        buf.copy_from_slice(&data[offset..end]);
        Ok(())
    }

    fn write_at(&self, buf: &[u8], offset: usize) -> io::Result<()> {
        let mut data = self.data.lock().unwrap_or_else(|p| p.into_inner());
        let end = offset
            .checked_add(buf.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "short write"))?;
        if end > data.len() {
            data.resize(end, 0);
        }
        data[offset..end].copy_from_slice(buf);
        Ok(())
    }

    fn len(&self) -> usize {
        self.data.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

/// A real-file-backed byte store, used when the swap file or the image file
/// being loaded from is an actual file on disk.
pub struct FileBackedStore {
    file: Mutex<File>,
    len: usize,
}

impl FileBackedStore {
    pub fn new(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len() as usize;
        Ok(Self { file: Mutex::new(file), len })
    }
}

impl RandomAccessStore for FileBackedStore {
    fn read_at(&self, buf: &mut [u8], offset: usize) -> io::Result<()> {
        let mut file = self.file.lock().unwrap_or_else(|p| p.into_inner());
        file.seek(SeekFrom::Start(offset as u64))?;
        file.read_exact(buf)
    }

    fn write_at(&self, buf: &[u8], offset: usize) -> io::Result<()> {
        let mut file = self.file.lock().unwrap_or_else(|p| p.into_inner());
        file.seek(SeekFrom::Start(offset as u64))?;
        file.write_all(buf)
    }

    fn len(&self) -> usize {
        self.len
    }
}
