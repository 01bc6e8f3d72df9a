//! Metadata snapshots.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::time::SystemTime;

// DIRLEN is the length reported for a directory. This is pulled from the initial size that Unix
// uses for a directory sector; it does not grow with the number of children.
pub(crate) const DIRLEN: u64 = 4096;

/// Metadata about a file or directory, copied at a single instant.
///
/// `Info` is what [`stat`] returns and what directory listings are made of. It never changes
/// after it is created, no matter what happens to the file it describes.
///
/// [`stat`]: trait.GenFs.html#tymethod.stat
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Info {
    name: OsString,
    len: u64,
    mode: u32,
    dir: bool,
    modified: SystemTime,
}

impl Info {
    pub(crate) fn new(name: &OsStr, len: u64, mode: u32, dir: bool, modified: SystemTime) -> Info {
        Info {
            name: name.to_os_string(),
            len: if dir { DIRLEN } else { len },
            mode,
            dir,
            modified,
        }
    }

    // from_metadata converts what the host reports. Directory sizes vary between host
    // filesystems, so they are normalized like in-memory ones.
    pub(crate) fn from_metadata(name: &OsStr, meta: &fs::Metadata) -> Info {
        Info::new(
            name,
            meta.len(),
            meta.permissions().mode() & 0o777,
            meta.is_dir(),
            meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        )
    }

    /// The base name of the file or directory.
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// The size in bytes. Directories report 4096.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The permission bits (`0o777` mask).
    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn is_dir(&self) -> bool {
        self.dir
    }

    pub fn is_file(&self) -> bool {
        !self.dir
    }

    /// The last modification time. This is best effort and should not be relied upon for
    /// ordering.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }
}
