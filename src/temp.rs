//! Temporary name generation shared by both backends.
//!
//! A pattern such as `"log-*.txt"` is split on its last `*` into a prefix and suffix, and
//! candidate names are `prefix + random digits + suffix`. Each candidate is handed to an attempt
//! closure that performs an exclusive create; collisions are retried a bounded number of times.

use std::io::Result;
use std::path::{is_separator, Path, PathBuf};

use rand::Rng;
use tracing::trace;

use crate::errors::*;
use crate::TRACING_TARGET;

/// How many colliding names are tried before giving up with `EEXIST`.
pub const MAX_ATTEMPTS: usize = 10_000;

/// Splits `pattern` on its last `*`. Without a `*` the whole pattern is the prefix.
///
/// Patterns may not contain a path separator.
///
/// # Examples
///
/// ```
/// use memvol::temp::prefix_and_suffix;
///
/// assert_eq!(prefix_and_suffix("a*b*c").unwrap(), ("a*b", "c"));
/// assert_eq!(prefix_and_suffix("tmp").unwrap(), ("tmp", ""));
/// assert!(prefix_and_suffix("a/b*").is_err());
/// ```
pub fn prefix_and_suffix(pattern: &str) -> Result<(&str, &str)> {
    if pattern.chars().any(is_separator) {
        return Err(invalid_input("pattern contains path separator"));
    }
    Ok(match pattern.rfind('*') {
        Some(pos) => (&pattern[..pos], &pattern[pos + 1..]),
        None => (pattern, ""),
    })
}

/// Repeatedly calls `attempt` with fresh candidate paths inside `dir` until it succeeds, fails
/// with anything other than `AlreadyExists`, or [`MAX_ATTEMPTS`] names have collided.
///
/// [`MAX_ATTEMPTS`]: constant.MAX_ATTEMPTS.html
pub fn create_unique<T, F>(dir: &Path, pattern: &str, mut attempt: F) -> Result<T>
where
    F: FnMut(&Path) -> Result<T>,
{
    let (prefix, suffix) = prefix_and_suffix(pattern)?;
    let mut rng = rand::rng();
    for _ in 0..MAX_ATTEMPTS {
        let random: u32 = rng.random_range(0..1 << 31);
        let candidate: PathBuf = dir.join(format!("{}{}{}", prefix, random, suffix));
        match attempt(&candidate) {
            Err(ref err) if is_already_exists(err) => {
                trace!(target: TRACING_TARGET, path = ?candidate, "temp name collision");
            }
            res => return res,
        }
    }
    Err(EEXIST())
}
