//! Convenience functions for working with [`std::path::Path`].
//!
//! The in-memory engine keys every node by a clean absolute path. [`absolute`] produces that key
//! from whatever the caller passed, purely lexically: nothing is looked up, and symlinks do not
//! exist.
//!
//! This module deliberately ignores Windows prefixes.
//!
//! [`std::path::Path`]: https://doc.rust-lang.org/std/path/struct.Path.html
//! [`absolute`]: fn.absolute.html

use std::ffi::{OsStr, OsString};
use std::io::Result;
use std::path::{Component, Path, PathBuf};

use crate::errors::*;

// Part is a simplified std::path::Component.
#[derive(Debug, PartialEq)]
enum Part {
    // A `..` that could not be normalized away.
    ParentDir,
    Normal(OsString),
}

// Parts is a lexically cleaned path.
#[derive(Debug)]
struct Parts {
    at_root: bool,
    // parts contains all normal parts of a path and, if not at root, may begin with a few
    // parent directories.
    parts: Vec<Part>,
}

impl Parts {
    fn to_path_buf(&self) -> PathBuf {
        let mut path = if self.at_root { PathBuf::from("/") } else { PathBuf::new() };
        for part in &self.parts {
            match part {
                Part::ParentDir => path.push(".."),
                Part::Normal(name) => path.push(name),
            }
        }
        path
    }
}

// normalize returns the shortest path equivalent to `path` by lexical parsing alone: repeated
// separators collapse, `.` disappears, `..` cancels the name before it and is dropped directly
// under the root.
fn normalize<P: AsRef<Path>>(path: P) -> Parts {
    let mut ps = Parts {
        at_root: false,
        parts: Vec::new(),
    };
    for comp in path.as_ref().components() {
        match comp {
            Component::RootDir => ps.at_root = true,
            Component::ParentDir => {
                if ps.at_root || ps.parts.last().map_or(false, |last| *last != Part::ParentDir) {
                    ps.parts.pop();
                } else {
                    ps.parts.push(Part::ParentDir);
                }
            }
            Component::Normal(p) => {
                ps.parts.push(Part::Normal(p.to_os_string()));
            }
            _ => (),
        }
    }
    ps
}

/// Cleans `path` and, if it is relative, resolves it against `cwd` (which must be absolute).
///
/// An empty path names nothing and fails with `ENOENT`, as it does for the OS.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use memvol::path_parts::absolute;
///
/// let cwd = Path::new("/a/b");
/// assert_eq!(absolute(cwd, "c//d/./e").unwrap(), PathBuf::from("/a/b/c/d/e"));
/// assert_eq!(absolute(cwd, "../../../x").unwrap(), PathBuf::from("/x"));
/// assert_eq!(absolute(cwd, "/y/../z/").unwrap(), PathBuf::from("/z"));
/// assert!(absolute(cwd, "").is_err());
/// ```
pub fn absolute<C: AsRef<Path>, P: AsRef<Path>>(cwd: C, path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ENOENT());
    }
    if path.has_root() {
        return Ok(normalize(path).to_path_buf());
    }
    Ok(normalize(cwd.as_ref().join(path)).to_path_buf())
}

/// Returns the directory containing a clean absolute `path`; the root is its own parent.
pub fn parent(path: &Path) -> &Path {
    path.parent().unwrap_or(path)
}

/// Returns the final component of `path`, or the whole path when it has none, as for the root.
pub fn base_name(path: &Path) -> &OsStr {
    path.file_name().unwrap_or_else(|| path.as_os_str())
}

/// Returns whether `path` is `ancestor` or lies somewhere beneath it.
pub fn within(path: &Path, ancestor: &Path) -> bool {
    path.starts_with(ancestor)
}
