//! Open-mode flags.
//!
//! [`OpenFlags`] is the opaque bitmask passed to [`GenFs::open_file`]. The bit values are the
//! host's `O_*` values, so the same mask means the same thing to the in-memory engine and to the
//! real OS. The engine never tests bits directly; it only asks the predicates below.
//!
//! [`OpenFlags`]: struct.OpenFlags.html
//! [`GenFs::open_file`]: ../trait.GenFs.html#tymethod.open_file

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// An open-mode bitmask: one access mode plus any creation and status flags.
///
/// # Examples
///
/// ```
/// use memvol::OpenFlags;
///
/// let flags = OpenFlags::RDWR | OpenFlags::CREATE | OpenFlags::EXCL;
/// assert!(flags.read_write());
/// assert!(flags.can_read() && flags.can_write());
/// assert!(flags.create() && flags.exclusive());
/// assert!(!flags.append());
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct OpenFlags(i32);

impl OpenFlags {
    /// Open for reading only. This is the absence of both access bits.
    pub const RDONLY: OpenFlags = OpenFlags(libc::O_RDONLY);
    /// Open for writing only.
    pub const WRONLY: OpenFlags = OpenFlags(libc::O_WRONLY);
    /// Open for reading and writing.
    pub const RDWR: OpenFlags = OpenFlags(libc::O_RDWR);
    /// Every write goes to the current end of the file.
    pub const APPEND: OpenFlags = OpenFlags(libc::O_APPEND);
    /// Create the file if it does not exist.
    pub const CREATE: OpenFlags = OpenFlags(libc::O_CREAT);
    /// Together with `CREATE`, fail if the file already exists.
    pub const EXCL: OpenFlags = OpenFlags(libc::O_EXCL);
    /// Truncate an existing file to zero length on open.
    pub const TRUNC: OpenFlags = OpenFlags(libc::O_TRUNC);

    const ACCMODE: i32 = libc::O_ACCMODE;

    /// Wraps a raw bitmask.
    pub const fn from_bits(bits: i32) -> OpenFlags {
        OpenFlags(bits)
    }

    /// Returns the raw bitmask.
    pub const fn bits(self) -> i32 {
        self.0
    }

    /// Returns the non-access bits (append, create, exclusive, truncate, ...).
    pub(crate) fn status_bits(self) -> i32 {
        self.0 & !Self::ACCMODE
    }

    /// The access mode is read-only.
    pub fn read_only(self) -> bool {
        self.0 & Self::ACCMODE == libc::O_RDONLY
    }

    /// The access mode is write-only.
    pub fn write_only(self) -> bool {
        self.0 & Self::ACCMODE == libc::O_WRONLY
    }

    /// The access mode is read-write.
    pub fn read_write(self) -> bool {
        self.0 & Self::ACCMODE == libc::O_RDWR
    }

    pub fn append(self) -> bool {
        self.0 & libc::O_APPEND != 0
    }

    pub fn create(self) -> bool {
        self.0 & libc::O_CREAT != 0
    }

    pub fn exclusive(self) -> bool {
        self.0 & libc::O_EXCL != 0
    }

    pub fn truncate(self) -> bool {
        self.0 & libc::O_TRUNC != 0
    }

    /// Reads are permitted through a handle opened with these flags.
    pub fn can_read(self) -> bool {
        self.read_only() || self.read_write()
    }

    /// Writes are permitted through a handle opened with these flags.
    pub fn can_write(self) -> bool {
        self.write_only() || self.read_write()
    }
}

impl BitOr for OpenFlags {
    type Output = OpenFlags;

    fn bitor(self, rhs: OpenFlags) -> OpenFlags {
        OpenFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for OpenFlags {
    fn bitor_assign(&mut self, rhs: OpenFlags) {
        self.0 |= rhs.0;
    }
}

impl From<i32> for OpenFlags {
    fn from(bits: i32) -> OpenFlags {
        OpenFlags(bits)
    }
}

impl fmt::Debug for OpenFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names = vec![if self.read_write() {
            "RDWR"
        } else if self.write_only() {
            "WRONLY"
        } else {
            "RDONLY"
        }];
        let named = [
            (self.append(), "APPEND"),
            (self.create(), "CREATE"),
            (self.exclusive(), "EXCL"),
            (self.truncate(), "TRUNC"),
        ];
        names.extend(named.iter().filter(|(set, _)| *set).map(|(_, name)| *name));
        write!(f, "OpenFlags({})", names.join("|"))
    }
}
