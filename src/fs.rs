//! This module provides the generic capability traits shared by every backend.
//!
//! [`GenFs`] covers path-based operations and [`GenFile`] covers operations on an open file.
//! Both the real-OS backend ([`disk`]) and the in-memory engine ([`mem`]) implement them with the
//! same observable results: the same bytes, the same error classification.
//!
//! [`GenFs`]: trait.GenFs.html
//! [`GenFile`]: trait.GenFile.html
//! [`disk`]: disk/index.html
//! [`mem`]: mem/index.html

use std::fmt::Debug;
use std::io::{Read, Result, Seek, Write};
use std::path::{Path, PathBuf};

use crate::flags::OpenFlags;
use crate::info::Info;

/// An open file or directory.
///
/// A `GenFile` can be read or written to depending on the flags it was opened with. It implements
/// `Seek` to move its logical cursor, and positional I/O that leaves the cursor alone.
///
/// Files are not flushed when closed. Call [`sync`] for durability.
///
/// [`sync`]: #tymethod.sync
pub trait GenFile: Debug + Read + Seek + Write {
    /// Returns the current absolute path of the file.
    fn name(&self) -> PathBuf;

    /// Reads at `offset` without moving the cursor.
    ///
    /// Short reads are retried until `buf` is full, so a return value smaller than `buf.len()`
    /// means the end of the file was reached. A negative offset fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use memvol::*;
    /// use memvol::mem::Volume;
    /// # fn foo() -> std::io::Result<()> {
    /// let fs = Volume::new();
    /// fs.write_file("/f", b"hello", 0o644)?;
    ///
    /// let f = fs.open("/f")?;
    /// let mut buf = [0u8; 8];
    /// assert_eq!(f.read_at(&mut buf, 1)?, 4);
    /// assert_eq!(&buf[..4], b"ello");
    /// assert_eq!(f.read_at(&mut buf, 5)?, 0);
    /// # Ok(())
    /// # }
    /// # foo().unwrap();
    /// ```
    fn read_at(&self, buf: &mut [u8], offset: i64) -> Result<usize>;

    /// Writes at `offset` without moving the cursor, zero-filling any gap past the end of the
    /// file. Fails on a file opened for appending, and on a negative offset.
    fn write_at(&self, buf: &[u8], offset: i64) -> Result<usize>;

    /// Lists the directory this handle refers to.
    ///
    /// The first call snapshots the directory. Each call consumes up to `n` entries of that
    /// snapshot, or all of the remaining entries if `n <= 0`. Once the snapshot is exhausted,
    /// calls return an empty list and no error.
    fn read_dir(&mut self, n: isize) -> Result<Vec<Info>>;

    /// Like [`read_dir`], but only returns the names.
    ///
    /// [`read_dir`]: #tymethod.read_dir
    fn read_dir_names(&mut self, n: isize) -> Result<Vec<String>> {
        Ok(self
            .read_dir(n)?
            .iter()
            .map(|info| info.name().to_string_lossy().into_owned())
            .collect())
    }

    /// Queries metadata about the underlying file.
    fn stat(&self) -> Result<Info>;

    /// Acknowledges everything written so far as durable.
    fn sync(&self) -> Result<()>;

    /// Truncates or zero-extends the file to `size` bytes. The file must be open for writing.
    fn truncate(&self, size: i64) -> Result<()>;

    /// Changes the permission bits of the underlying file.
    fn chmod(&self, mode: u32) -> Result<()>;

    /// Makes this directory the working directory.
    fn chdir(&self) -> Result<()>;

    /// Closes the handle. Every later operation fails with `EBADF`.
    fn close(&mut self) -> Result<()>;
}

/// A filesystem.
///
/// The documentation of each method mirrors the operating system call it stands in for.
///
/// # Examples
///
/// ```
/// use memvol::*;
/// use memvol::mem::Volume;
/// use std::io::{Read, Write};
/// # fn foo() -> std::io::Result<()> {
/// let fs = Volume::new();
/// fs.mkdir_all("/a/b", 0o755)?;
///
/// let mut f = fs.create("/a/b/f")?;
/// f.write_all(b"hello")?;
///
/// assert_eq!(fs.read_file("/a/b/f")?, b"hello");
/// assert_eq!(fs.stat("/a/b/f")?.len(), 5);
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
pub trait GenFs {
    /// The open file type of this filesystem.
    type File: GenFile;

    /// Opens `path` with the given flags, creating it with `mode` if `CREATE` is set and it does
    /// not exist.
    fn open_file<P: AsRef<Path>>(&self, path: P, flags: OpenFlags, mode: u32)
        -> Result<Self::File>;

    /// Opens `path` read-only.
    fn open<P: AsRef<Path>>(&self, path: P) -> Result<Self::File> {
        self.open_file(path, OpenFlags::RDONLY, 0)
    }

    /// Opens `path` for reading and writing, creating it with mode `0o666` or truncating it.
    fn create<P: AsRef<Path>>(&self, path: P) -> Result<Self::File> {
        self.open_file(
            path,
            OpenFlags::RDWR | OpenFlags::CREATE | OpenFlags::TRUNC,
            0o666,
        )
    }

    /// Creates a new file with a unique name in `dir` (the temp dir if empty), named after
    /// `pattern` with its last `*` replaced by random digits.
    fn create_temp<P: AsRef<Path>>(&self, dir: P, pattern: &str) -> Result<Self::File>;

    /// Changes the working directory.
    fn chdir<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Changes the permission bits of `path`.
    fn chmod<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()>;

    /// Changes the owner of `path`.
    fn chown<P: AsRef<Path>>(&self, path: P, uid: u32, gid: u32) -> Result<()>;

    /// Creates a directory. Its parent must exist and it must not.
    fn mkdir<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()>;

    /// Creates a directory and any missing parents. An existing directory is fine.
    fn mkdir_all<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()>;

    /// Creates a new directory with a unique name, see [`create_temp`], and returns its path.
    ///
    /// [`create_temp`]: #tymethod.create_temp
    fn mkdir_temp<P: AsRef<Path>>(&self, dir: P, pattern: &str) -> Result<PathBuf>;

    /// Reads the entire contents of a file.
    fn read_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let mut f = self.open(path)?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)?;
        f.close()?;
        Ok(buf)
    }

    /// Writes `data` to a file, creating it with `mode` or truncating it.
    fn write_file<P: AsRef<Path>>(&self, path: P, data: &[u8], mode: u32) -> Result<()> {
        let mut f = self.open_file(
            path,
            OpenFlags::WRONLY | OpenFlags::CREATE | OpenFlags::TRUNC,
            mode,
        )?;
        let res = f.write_all(data);
        let closed = f.close();
        res.and(closed)
    }

    /// Returns the target of a symbolic link.
    fn read_link<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf>;

    /// Lists a directory, sorted by name.
    fn read_dir<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Info>> {
        let mut f = self.open(path)?;
        let mut entries = f.read_dir(0)?;
        f.close()?;
        entries.sort_by(|l, r| l.name().cmp(r.name()));
        Ok(entries)
    }

    /// Removes a file or an empty directory.
    fn remove<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Removes `path` and everything beneath it. A missing path is not an error.
    fn remove_all<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Moves `from` to `to`.
    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&self, from: P, to: Q) -> Result<()>;

    /// Truncates or zero-extends the file at `path` to `size` bytes.
    fn truncate<P: AsRef<Path>>(&self, path: P, size: i64) -> Result<()>;

    /// Queries metadata about `path`.
    fn stat<P: AsRef<Path>>(&self, path: P) -> Result<Info>;

    /// Returns the default directory for temporary files.
    fn temp_dir(&self) -> PathBuf;
}
