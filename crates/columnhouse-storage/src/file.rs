//! File Abstractions
//!
//! The segment writer only ever appends, and the reader only ever does positioned
//! reads. These two traits are the whole contract with the file system:
//!
//! - [`WritableFile`]: `append` / `appendv` / `current_size` / `sync`
//! - [`ReadableFile`]: `read_at` / `size`, shareable across threads
//!
//! ## Implementations
//! - [`LocalWritableFile`]: buffered `std::fs::File`, created with create-new semantics
//! - [`LocalReadableFile`]: `std::fs::File` with positioned reads (no shared cursor)
//! - [`InMemoryFile`]: growable buffer, handy for tests and for building a segment in memory
//! - `bytes::Bytes`: a finished segment held in memory is directly readable

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use columnhouse_core::{Error, Result};

/// Sequential-append output file
pub trait WritableFile: Send {
    fn append(&mut self, data: &[u8]) -> Result<()>;

    /// Append several slices back to back
    fn appendv(&mut self, slices: &[&[u8]]) -> Result<()> {
        for slice in slices {
            self.append(slice)?;
        }
        Ok(())
    }

    /// Bytes appended so far
    fn current_size(&self) -> u64;

    fn sync(&mut self) -> Result<()>;
}

/// Positioned random-access input file
pub trait ReadableFile: Send + Sync {
    /// Read exactly `len` bytes starting at `offset`
    fn read_at(&self, offset: u64, len: usize) -> Result<Bytes>;

    fn size(&self) -> u64;
}

fn check_range(offset: u64, len: usize, size: u64) -> Result<()> {
    match offset.checked_add(len as u64) {
        Some(end) if end <= size => Ok(()),
        _ => Err(Error::corruption(format!(
            "read of {} bytes at offset {} past end of {}-byte file",
            len, offset, size
        ))),
    }
}

/// Local file opened for exclusive appending
pub struct LocalWritableFile {
    inner: BufWriter<File>,
    size: u64,
}

impl LocalWritableFile {
    /// Create `path`; fails if it already exists
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;
        Ok(Self {
            inner: BufWriter::new(file),
            size: 0,
        })
    }
}

impl WritableFile for LocalWritableFile {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;
        self.size += data.len() as u64;
        Ok(())
    }

    fn current_size(&self) -> u64 {
        self.size
    }

    fn sync(&mut self) -> Result<()> {
        self.inner.flush()?;
        self.inner.get_ref().sync_all()?;
        Ok(())
    }
}

/// Local file opened for positioned reads
pub struct LocalReadableFile {
    file: File,
    size: u64,
}

impl LocalReadableFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }
}

impl ReadableFile for LocalReadableFile {
    fn read_at(&self, offset: u64, len: usize) -> Result<Bytes> {
        check_range(offset, len, self.size)?;
        let mut buf = vec![0u8; len];
        read_exact_at(&self.file, &mut buf, offset)?;
        Ok(Bytes::from(buf))
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// In-memory append-only file.
///
/// Clones share the same buffer, so a caller can hand one clone to a writer and
/// read the finished bytes back through another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFile {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl InMemoryFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far
    pub fn to_bytes(&self) -> Bytes {
        let guard = self.buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Bytes::copy_from_slice(&guard)
    }
}

impl WritableFile for InMemoryFile {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        let mut guard = self.buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.extend_from_slice(data);
        Ok(())
    }

    fn current_size(&self) -> u64 {
        let guard = self.buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.len() as u64
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

impl ReadableFile for Bytes {
    fn read_at(&self, offset: u64, len: usize) -> Result<Bytes> {
        check_range(offset, len, self.len() as u64)?;
        let start = offset as usize;
        Ok(self.slice(start..start + len))
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}
