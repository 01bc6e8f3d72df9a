//! A thin wrapper around [`std::fs`].
//!
//! The [`Disk`] struct is an empty struct. All methods on it use `std::fs` functions. The intent
//! of this module is to use `memvol::disk::Disk` in `main.rs` and [`memvol::mem::Volume`] in tests,
//! or to pick one at runtime through the [`Fs`] façade.
//!
//! Where the host is looser or stricter than the in-memory engine about argument checking, the
//! wrapper adds the engine's checks in front of the system call: closed handles fail with `EBADF`,
//! zero-length reads succeed, negative offsets and positional writes to append-only files are
//! rejected, and positional I/O retries short transfers.
//!
//! [`std::fs`]: https://doc.rust-lang.org/std/fs/
//! [`Disk`]: struct.Disk.html
//! [`memvol::mem::Volume`]: ../mem/struct.Volume.html
//! [`Fs`]: ../enum.Fs.html
//!
//! # Examples
//!
//! ```
//! use memvol::*;
//!
//! let fs = memvol::disk::Disk;
//!
//! let info = fs.stat("/").unwrap();
//! assert!(info.is_dir());
//! ```

use std::collections::VecDeque;
use std::fs as rs_fs;
use std::io::{ErrorKind, Read, Result, Seek, SeekFrom, Write};
use std::os::unix::fs::{DirBuilderExt, FileExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::errors::*;
use crate::flags::OpenFlags;
use crate::fs::{GenFile, GenFs};
use crate::info::Info;
use crate::path_parts::base_name;
use crate::temp;

/// An open file on the host.
///
/// # Examples
///
/// ```
/// # use memvol::*;
/// # use std::io::Write;
/// # fn foo() -> std::io::Result<()> {
/// let fs = memvol::disk::Disk;
/// let mut f = fs.create("f")?;
/// assert_eq!(f.write(&[1, 2, 3])?, 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct File {
    // file is None once closed.
    file: Option<rs_fs::File>,
    path: PathBuf,
    flags: OpenFlags,
    listing: Option<VecDeque<Info>>,
}

impl File {
    fn inner(&self) -> Result<&rs_fs::File> {
        self.file.as_ref().ok_or_else(EBADF)
    }

    fn inner_mut(&mut self) -> Result<&mut rs_fs::File> {
        self.file.as_mut().ok_or_else(EBADF)
    }

    // snapshot lists the directory the handle was opened at, sorted by name.
    fn snapshot(&self) -> Result<VecDeque<Info>> {
        let mut infos = Vec::new();
        for entry in rs_fs::read_dir(&self.path)? {
            let entry = entry?;
            infos.push(Info::from_metadata(&entry.file_name(), &entry.metadata()?));
        }
        infos.sort_by(|l, r| l.name().cmp(r.name()));
        Ok(infos.into())
    }
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let file = self.inner_mut()?;
        if buf.is_empty() {
            return Ok(0);
        }
        file.read(buf)
    }
}

impl Write for File {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.inner_mut()?.write(buf)
    }
    fn flush(&mut self) -> Result<()> {
        self.inner().map(|_| ())
    }
}

impl Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.inner_mut()?.seek(pos)
    }
}

impl GenFile for File {
    fn name(&self) -> PathBuf {
        self.path.clone()
    }

    fn read_at(&self, buf: &mut [u8], offset: i64) -> Result<usize> {
        let file = self.inner()?;
        if offset < 0 {
            return Err(invalid_input("negative offset"));
        }
        let mut n = 0;
        while n < buf.len() {
            match file.read_at(&mut buf[n..], offset as u64 + n as u64) {
                Ok(0) => break,
                Ok(m) => n += m,
                Err(ref err) if err.kind() == ErrorKind::Interrupted => (),
                Err(err) => return Err(err),
            }
        }
        Ok(n)
    }

    fn write_at(&self, buf: &[u8], offset: i64) -> Result<usize> {
        let file = self.inner()?;
        if offset < 0 {
            return Err(invalid_input("negative offset"));
        }
        // Linux ignores the offset of a positional write to an append-only file.
        if self.flags.append() {
            return Err(invalid_input("write_at on a file opened for appending"));
        }
        let mut n = 0;
        while n < buf.len() {
            match file.write_at(&buf[n..], offset as u64 + n as u64) {
                Ok(0) => break,
                Ok(m) => n += m,
                Err(ref err) if err.kind() == ErrorKind::Interrupted => (),
                Err(err) => return Err(err),
            }
        }
        Ok(n)
    }

    /// Lists the directory at the path this file was opened with. The listing is taken on the
    /// first call, so it reflects a rename of the directory only if that happened before.
    fn read_dir(&mut self, n: isize) -> Result<Vec<Info>> {
        self.inner()?;
        if self.listing.is_none() {
            self.listing = Some(self.snapshot()?);
        }
        let listing = match self.listing.as_mut() {
            Some(listing) => listing,
            None => return Ok(Vec::new()),
        };
        let take = if n > 0 {
            std::cmp::min(n as usize, listing.len())
        } else {
            listing.len()
        };
        Ok(listing.drain(..take).collect())
    }

    fn stat(&self) -> Result<Info> {
        let meta = self.inner()?.metadata()?;
        Ok(Info::from_metadata(base_name(&self.path), &meta))
    }

    fn sync(&self) -> Result<()> {
        self.inner()?.sync_all()
    }

    fn truncate(&self, size: i64) -> Result<()> {
        let file = self.inner()?;
        if size < 0 || !self.flags.can_write() {
            return Err(EINVAL());
        }
        file.set_len(size as u64)
    }

    fn chmod(&self, mode: u32) -> Result<()> {
        self.inner()?
            .set_permissions(rs_fs::Permissions::from_mode(mode & 0o777))
    }

    fn chdir(&self) -> Result<()> {
        if !self.inner()?.metadata()?.is_dir() {
            return Err(ENOTDIR());
        }
        std::env::set_current_dir(&self.path)
    }

    fn close(&mut self) -> Result<()> {
        self.file.take().ok_or_else(EBADF)?;
        self.listing = None;
        Ok(())
    }
}

/// An empty struct that satisfies [`GenFs`] by calling [`std::fs`] functions.
///
/// [`GenFs`]: ../trait.GenFs.html
/// [`std::fs`]: https://doc.rust-lang.org/std/fs/
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Disk;

impl GenFs for Disk {
    type File = File;

    fn open_file<P: AsRef<Path>>(&self, path: P, flags: OpenFlags, mode: u32) -> Result<File> {
        // The status bits pass through unchanged, including create/truncate on a read-only open,
        // which std::fs::OpenOptions would refuse on its own.
        let file = rs_fs::OpenOptions::new()
            .read(flags.can_read())
            .write(flags.can_write())
            .custom_flags(flags.status_bits())
            .mode(mode)
            .open(path.as_ref())?;
        Ok(File {
            file: Some(file),
            path: path.as_ref().to_path_buf(),
            flags,
            listing: None,
        })
    }

    fn create_temp<P: AsRef<Path>>(&self, dir: P, pattern: &str) -> Result<File> {
        let dir = match dir.as_ref() {
            dir if dir.as_os_str().is_empty() => self.temp_dir(),
            dir => dir.to_path_buf(),
        };
        temp::create_unique(&dir, pattern, |candidate| {
            self.open_file(
                candidate,
                OpenFlags::RDWR | OpenFlags::CREATE | OpenFlags::EXCL,
                0o600,
            )
        })
    }

    fn chdir<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::env::set_current_dir(path)
    }

    fn chmod<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()> {
        rs_fs::set_permissions(path, rs_fs::Permissions::from_mode(mode & 0o777))
    }

    fn chown<P: AsRef<Path>>(&self, path: P, uid: u32, gid: u32) -> Result<()> {
        std::os::unix::fs::chown(path, Some(uid), Some(gid))
    }

    fn mkdir<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()> {
        rs_fs::DirBuilder::new().mode(mode).create(path)
    }

    fn mkdir_all<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()> {
        match rs_fs::metadata(path.as_ref()) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ENOTDIR()),
            Err(_) => rs_fs::DirBuilder::new()
                .recursive(true)
                .mode(mode)
                .create(path),
        }
    }

    fn mkdir_temp<P: AsRef<Path>>(&self, dir: P, pattern: &str) -> Result<PathBuf> {
        let dir = match dir.as_ref() {
            dir if dir.as_os_str().is_empty() => self.temp_dir(),
            dir => dir.to_path_buf(),
        };
        temp::create_unique(&dir, pattern, |candidate| {
            self.mkdir(candidate, 0o700).map(|()| candidate.to_path_buf())
        })
    }

    fn read_link<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        rs_fs::read_link(path)
    }

    fn remove<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if rs_fs::symlink_metadata(path.as_ref())?.is_dir() {
            rs_fs::remove_dir(path)
        } else {
            rs_fs::remove_file(path)
        }
    }

    fn remove_all<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        match rs_fs::symlink_metadata(path.as_ref()) {
            Err(ref err) if is_not_found(err) => Ok(()),
            Err(err) => Err(err),
            Ok(meta) if meta.is_dir() => rs_fs::remove_dir_all(path),
            Ok(_) => rs_fs::remove_file(path),
        }
    }

    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&self, from: P, to: Q) -> Result<()> {
        rs_fs::rename(from, to)
    }

    fn truncate<P: AsRef<Path>>(&self, path: P, size: i64) -> Result<()> {
        if size < 0 {
            return Err(EINVAL());
        }
        rs_fs::OpenOptions::new()
            .write(true)
            .open(path)?
            .set_len(size as u64)
    }

    fn stat<P: AsRef<Path>>(&self, path: P) -> Result<Info> {
        let meta = rs_fs::metadata(path.as_ref())?;
        Ok(Info::from_metadata(base_name(path.as_ref()), &meta))
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }
}
