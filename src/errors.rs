//! Common filesystem errors.
//!
//! This module provides convenience functions for generating [`io::Error`]s from OS error codes.
//! These are the only errors the [`mem`] engine returns for failures the host OS would also
//! report, which means code written against [`io::ErrorKind`] or raw OS codes behaves the same
//! against the engine as it does against the real disk.
//!
//! [`classify`] collapses any error, from either backend, into the four classes generic error
//! handling cares about.
//!
//! [`io::Error`]: https://doc.rust-lang.org/std/io/struct.Error.html
//! [`io::ErrorKind`]: https://doc.rust-lang.org/std/io/enum.ErrorKind.html
//! [`mem`]: ../mem/index.html
//! [`classify`]: fn.classify.html

use std::io::{Error, ErrorKind};

/// Used when a file or directory does not exist.
#[allow(non_snake_case)]
pub fn ENOENT() -> Error {
    Error::from_raw_os_error(libc::ENOENT)
}

/// Used when operating on a closed handle, or when reading (writing) through a handle that was
/// not opened for reading (writing).
#[allow(non_snake_case)]
pub fn EBADF() -> Error {
    Error::from_raw_os_error(libc::EBADF)
}

/// Used when a file's mode does not allow the requested access.
#[allow(non_snake_case)]
pub fn EACCES() -> Error {
    Error::from_raw_os_error(libc::EACCES)
}

/// Used when a file or directory already exists.
#[allow(non_snake_case)]
pub fn EEXIST() -> Error {
    Error::from_raw_os_error(libc::EEXIST)
}

/// Used when attempting to perform a directory operation on a file.
#[allow(non_snake_case)]
pub fn ENOTDIR() -> Error {
    Error::from_raw_os_error(libc::ENOTDIR)
}

/// Used when attempting to perform a file operation on a directory.
#[allow(non_snake_case)]
pub fn EISDIR() -> Error {
    Error::from_raw_os_error(libc::EISDIR)
}

/// Used for invalid arguments: negative sizes, offsets out of range, truncating a handle that
/// cannot write.
#[allow(non_snake_case)]
pub fn EINVAL() -> Error {
    Error::from_raw_os_error(libc::EINVAL)
}

/// Used when a write would grow a file past the volume's maximum file size.
#[allow(non_snake_case)]
pub fn EFBIG() -> Error {
    Error::from_raw_os_error(libc::EFBIG)
}

/// Used when an operation needs an empty directory and is performed on a non-empty directory.
#[allow(non_snake_case)]
pub fn ENOTEMPTY() -> Error {
    Error::from_raw_os_error(libc::ENOTEMPTY)
}

/// An error with a message that is not backed by an OS code. These always classify as
/// [`Class::Other`].
///
/// [`Class::Other`]: enum.Class.html#variant.Other
pub fn invalid_input(msg: &'static str) -> Error {
    Error::new(ErrorKind::InvalidInput, msg)
}

/// The operation-independent classification of a filesystem error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Class {
    /// The path, or a directory along it, does not exist.
    NotFound,
    /// An exclusive create or a mkdir collided with an existing entry.
    AlreadyExists,
    /// A mode or open flag did not allow the operation.
    PermissionDenied,
    /// Anything else.
    Other,
}

/// Classifies an error the same way for both the in-memory engine and the real OS.
///
/// # Examples
///
/// ```
/// use memvol::errors::{self, Class};
///
/// assert_eq!(errors::classify(&errors::ENOENT()), Class::NotFound);
/// assert_eq!(errors::classify(&errors::ENOTEMPTY()), Class::Other);
/// ```
pub fn classify(err: &Error) -> Class {
    match err.kind() {
        ErrorKind::NotFound => Class::NotFound,
        ErrorKind::AlreadyExists => Class::AlreadyExists,
        ErrorKind::PermissionDenied => Class::PermissionDenied,
        _ => Class::Other,
    }
}

/// Returns whether `err` reports a missing path.
pub fn is_not_found(err: &Error) -> bool {
    classify(err) == Class::NotFound
}

/// Returns whether `err` reports a collision with an existing path.
pub fn is_already_exists(err: &Error) -> bool {
    classify(err) == Class::AlreadyExists
}

/// Returns whether `err` reports insufficient permissions.
pub fn is_permission_denied(err: &Error) -> bool {
    classify(err) == Class::PermissionDenied
}
