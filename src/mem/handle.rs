//! Open handles.

use std::cmp;
use std::collections::VecDeque;
use std::fmt;
use std::io::{Read, Result, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::trace;

use super::node::{Node, NodeState};
use super::volume::Shared;
use crate::errors::*;
use crate::flags::OpenFlags;
use crate::fs::GenFile;
use crate::info::Info;
use crate::TRACING_TARGET;

/// An open file or directory on a [`Volume`].
///
/// A handle keeps its file alive: removing or renaming the path does not affect reads and writes
/// through it. The flags it was opened with are fixed; later `chmod`s do not revoke access.
///
/// [`Volume`]: struct.Volume.html
pub struct Handle {
    node: Arc<Node>,
    shared: Arc<Shared>,
    flags: OpenFlags,
    cursor: i64,
    valid: bool,
    // listing is the rest of the directory snapshot taken by the first read_dir. Some but empty
    // means the listing is exhausted.
    listing: Option<VecDeque<Info>>,
}

impl Handle {
    pub(crate) fn new(node: Arc<Node>, shared: Arc<Shared>, flags: OpenFlags) -> Handle {
        Handle {
            node,
            shared,
            flags,
            cursor: 0,
            valid: true,
            listing: None,
        }
    }

    /// The flags this handle was opened with.
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    fn check(&self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(EBADF())
        }
    }

    fn check_read(&self) -> Result<()> {
        if !self.flags.can_read() {
            return Err(EBADF());
        }
        if self.node.is_dir() {
            return Err(EISDIR());
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if !self.flags.can_write() {
            return Err(EBADF());
        }
        if self.node.is_dir() {
            return Err(EISDIR());
        }
        Ok(())
    }

    // pread is a single bounded read at `at`. Zero means end of data unless `buf` is empty.
    fn pread(&self, buf: &mut [u8], at: i64) -> Result<usize> {
        self.check()?;
        if at < 0 {
            return Err(invalid_input("negative offset"));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        self.check_read()?;
        Ok(self.node.lock().read_at(buf, at as u64))
    }

    fn write_locked(&self, state: &mut NodeState, data: &[u8], at: u64) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        state.write_at(
            data,
            at,
            self.shared.max_file_size(),
            self.shared.tracking(),
        )
    }

    fn pwrite(&self, data: &[u8], at: i64) -> Result<usize> {
        self.check()?;
        if at < 0 {
            return Err(invalid_input("negative offset"));
        }
        self.check_write()?;
        let mut state = self.node.lock();
        self.write_locked(&mut state, data, at as u64)
    }
}

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.pread(buf, self.cursor)?;
        self.cursor += n as i64;
        Ok(n)
    }
}

impl Write for Handle {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.check()?;
        self.check_write()?;
        let mut state = self.node.lock();
        let at = if self.flags.append() {
            state.len() as i64
        } else {
            self.cursor
        };
        let n = self.write_locked(&mut state, data, at as u64)?;
        self.cursor = at + n as i64;
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        self.check()
    }
}

impl Seek for Handle {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.check()?;
        let target = match pos {
            SeekFrom::Start(off) => i64::try_from(off).ok(),
            SeekFrom::Current(off) => self.cursor.checked_add(off),
            SeekFrom::End(off) => (self.node.lock().len() as i64).checked_add(off),
        };
        match target {
            Some(cursor) if cursor >= 0 => {
                self.cursor = cursor;
                Ok(cursor as u64)
            }
            _ => Err(EINVAL()),
        }
    }
}

impl GenFile for Handle {
    fn name(&self) -> PathBuf {
        self.node.path()
    }

    fn read_at(&self, buf: &mut [u8], offset: i64) -> Result<usize> {
        self.check()?;
        if offset < 0 {
            return Err(invalid_input("negative offset"));
        }
        let mut n = 0;
        while n < buf.len() {
            match self.pread(&mut buf[n..], offset + n as i64)? {
                0 => break,
                m => n += m,
            }
        }
        Ok(n)
    }

    fn write_at(&self, data: &[u8], offset: i64) -> Result<usize> {
        self.check()?;
        if offset < 0 {
            return Err(invalid_input("negative offset"));
        }
        if self.flags.append() {
            return Err(invalid_input("write_at on a file opened for appending"));
        }
        let mut n = 0;
        while n < data.len() {
            match self.pwrite(&data[n..], offset + n as i64)? {
                0 => break,
                m => n += m,
            }
        }
        Ok(n)
    }

    fn read_dir(&mut self, n: isize) -> Result<Vec<Info>> {
        self.check()?;
        if !self.node.is_dir() {
            return Err(ENOTDIR());
        }
        let (node, shared) = (&self.node, &self.shared);
        let listing = self.listing.get_or_insert_with(|| {
            let entries = shared.table().snapshot(node.id());
            trace!(target: TRACING_TARGET, path = ?node.path(), entries = entries.len(), "snapshot");
            entries.into()
        });
        let take = if n > 0 {
            cmp::min(n as usize, listing.len())
        } else {
            listing.len()
        };
        Ok(listing.drain(..take).collect())
    }

    fn stat(&self) -> Result<Info> {
        self.check()?;
        Ok(self.node.info())
    }

    fn sync(&self) -> Result<()> {
        self.check()?;
        self.node.lock().dirty.clear();
        Ok(())
    }

    fn truncate(&self, size: i64) -> Result<()> {
        self.check()?;
        if size < 0 || !self.flags.can_write() {
            return Err(EINVAL());
        }
        self.node.lock().resize(size as u64, self.shared.max_file_size())
    }

    fn chmod(&self, mode: u32) -> Result<()> {
        self.check()?;
        self.node.lock().mode = mode & 0o777;
        Ok(())
    }

    fn chdir(&self) -> Result<()> {
        self.check()?;
        if !self.node.is_dir() {
            return Err(ENOTDIR());
        }
        let path = self.node.path();
        let mut table = self.shared.table();
        // A removed directory cannot become the working directory.
        if !matches!(table.nodes.get(&path), Some(node) if Arc::ptr_eq(node, &self.node)) {
            return Err(ENOENT());
        }
        table.cwd = path;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.check()?;
        self.valid = false;
        self.listing = None;
        Ok(())
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Handle")
            .field("path", &self.node.path())
            .field("flags", &self.flags)
            .field("cursor", &self.cursor)
            .field("valid", &self.valid)
            .finish()
    }
}
