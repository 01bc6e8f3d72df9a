//! A filesystem chosen at runtime.
//!
//! Code generic over [`GenFs`] picks its backend at compile time. When the choice comes from
//! configuration instead, [`Fs`] holds either backend and forwards every call to it; the files it
//! opens are [`File`]s of the matching kind.
//!
//! [`GenFs`]: ../trait.GenFs.html
//! [`Fs`]: enum.Fs.html
//! [`File`]: enum.File.html
//!
//! # Examples
//!
//! ```
//! use std::io::Write;
//! use memvol::*;
//!
//! fn save(fs: &Fs) -> std::io::Result<()> {
//!     let mut f = fs.create("/state")?;
//!     f.write_all(b"v1")?;
//!     f.sync()
//! }
//!
//! let fs = Fs::memory();
//! save(&fs).unwrap();
//! assert_eq!(fs.read_file("/state").unwrap(), b"v1");
//! ```

use std::io::{Read, Result, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::disk::{self, Disk};
use crate::flags::OpenFlags;
use crate::fs::{GenFile, GenFs};
use crate::info::Info;
use crate::mem::{Handle, Volume};

// Forwards a call to whichever backend `$self` holds.
macro_rules! dispatch {
    ($self:expr, $inner:ident => $call:expr) => {
        match $self {
            Self::Disk($inner) => $call,
            Self::Mem($inner) => $call,
        }
    };
}

/// Either the host filesystem or an in-memory [`Volume`].
///
/// [`Volume`]: ../mem/struct.Volume.html
#[derive(Clone, Debug)]
pub enum Fs {
    Disk(Disk),
    Mem(Volume),
}

impl Fs {
    /// Returns a filesystem backed by the host.
    pub fn disk() -> Fs {
        Fs::Disk(Disk)
    }

    /// Returns a filesystem backed by a fresh, single-threaded [`Volume`].
    ///
    /// [`Volume`]: ../mem/struct.Volume.html
    pub fn memory() -> Fs {
        Fs::Mem(Volume::new())
    }

    /// Returns the in-memory volume, if this is one.
    pub fn volume(&self) -> Option<&Volume> {
        match self {
            Fs::Mem(volume) => Some(volume),
            Fs::Disk(_) => None,
        }
    }
}

impl From<Disk> for Fs {
    fn from(disk: Disk) -> Fs {
        Fs::Disk(disk)
    }
}

impl From<Volume> for Fs {
    fn from(volume: Volume) -> Fs {
        Fs::Mem(volume)
    }
}

/// A file opened through [`Fs`].
///
/// [`Fs`]: enum.Fs.html
#[derive(Debug)]
pub enum File {
    Disk(disk::File),
    Mem(Handle),
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        dispatch!(self, f => f.read(buf))
    }
}

impl Write for File {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        dispatch!(self, f => f.write(buf))
    }
    fn flush(&mut self) -> Result<()> {
        dispatch!(self, f => f.flush())
    }
}

impl Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        dispatch!(self, f => f.seek(pos))
    }
}

impl GenFile for File {
    fn name(&self) -> PathBuf {
        dispatch!(self, f => f.name())
    }
    fn read_at(&self, buf: &mut [u8], offset: i64) -> Result<usize> {
        dispatch!(self, f => f.read_at(buf, offset))
    }
    fn write_at(&self, buf: &[u8], offset: i64) -> Result<usize> {
        dispatch!(self, f => f.write_at(buf, offset))
    }
    fn read_dir(&mut self, n: isize) -> Result<Vec<Info>> {
        dispatch!(self, f => f.read_dir(n))
    }
    fn stat(&self) -> Result<Info> {
        dispatch!(self, f => f.stat())
    }
    fn sync(&self) -> Result<()> {
        dispatch!(self, f => f.sync())
    }
    fn truncate(&self, size: i64) -> Result<()> {
        dispatch!(self, f => f.truncate(size))
    }
    fn chmod(&self, mode: u32) -> Result<()> {
        dispatch!(self, f => f.chmod(mode))
    }
    fn chdir(&self) -> Result<()> {
        dispatch!(self, f => f.chdir())
    }
    fn close(&mut self) -> Result<()> {
        dispatch!(self, f => f.close())
    }
}

impl GenFs for Fs {
    type File = File;

    fn open_file<P: AsRef<Path>>(&self, path: P, flags: OpenFlags, mode: u32) -> Result<File> {
        match self {
            Fs::Disk(fs) => fs.open_file(path, flags, mode).map(File::Disk),
            Fs::Mem(fs) => fs.open_file(path, flags, mode).map(File::Mem),
        }
    }

    fn create_temp<P: AsRef<Path>>(&self, dir: P, pattern: &str) -> Result<File> {
        match self {
            Fs::Disk(fs) => fs.create_temp(dir, pattern).map(File::Disk),
            Fs::Mem(fs) => fs.create_temp(dir, pattern).map(File::Mem),
        }
    }

    fn chdir<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        dispatch!(self, fs => fs.chdir(path))
    }
    fn chmod<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()> {
        dispatch!(self, fs => fs.chmod(path, mode))
    }
    fn chown<P: AsRef<Path>>(&self, path: P, uid: u32, gid: u32) -> Result<()> {
        dispatch!(self, fs => fs.chown(path, uid, gid))
    }
    fn mkdir<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()> {
        dispatch!(self, fs => fs.mkdir(path, mode))
    }
    fn mkdir_all<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()> {
        dispatch!(self, fs => fs.mkdir_all(path, mode))
    }
    fn mkdir_temp<P: AsRef<Path>>(&self, dir: P, pattern: &str) -> Result<PathBuf> {
        dispatch!(self, fs => fs.mkdir_temp(dir, pattern))
    }
    fn read_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        dispatch!(self, fs => fs.read_file(path))
    }
    fn write_file<P: AsRef<Path>>(&self, path: P, data: &[u8], mode: u32) -> Result<()> {
        dispatch!(self, fs => fs.write_file(path, data, mode))
    }
    fn read_link<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        dispatch!(self, fs => fs.read_link(path))
    }
    fn read_dir<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Info>> {
        dispatch!(self, fs => fs.read_dir(path))
    }
    fn remove<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        dispatch!(self, fs => fs.remove(path))
    }
    fn remove_all<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        dispatch!(self, fs => fs.remove_all(path))
    }
    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&self, from: P, to: Q) -> Result<()> {
        dispatch!(self, fs => fs.rename(from, to))
    }
    fn truncate<P: AsRef<Path>>(&self, path: P, size: i64) -> Result<()> {
        dispatch!(self, fs => fs.truncate(path, size))
    }
    fn stat<P: AsRef<Path>>(&self, path: P) -> Result<Info> {
        dispatch!(self, fs => fs.stat(path))
    }
    fn temp_dir(&self) -> PathBuf {
        dispatch!(self, fs => fs.temp_dir())
    }
}
