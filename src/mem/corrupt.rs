//! Fault injection: damaging bytes a crash could have lost.
//!
//! With dirty tracking on, every write records the interval it touched until the file is synced.
//! [`Volume::corrupt_dirty_intervals`] flips one random byte in each of those intervals, modeling
//! a crash that tears recently written, unflushed data. [`Volume::corrupt_file`] flips a byte at a
//! chosen offset regardless of sync state.
//!
//! [`Volume::corrupt_dirty_intervals`]: ../struct.Volume.html#method.corrupt_dirty_intervals
//! [`Volume::corrupt_file`]: ../struct.Volume.html#method.corrupt_file

use std::cmp;
use std::collections::BTreeSet;
use std::io::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use super::node::Node;
use super::volume::Volume;
use crate::errors::*;
use crate::TRACING_TARGET;

/// A byte that was flipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Corruption {
    /// Path of the file at the time of corruption.
    pub path: PathBuf,
    /// Offset of the flipped byte.
    pub offset: u64,
}

impl Volume {
    /// Inverts every bit of the byte at `offset` in the file at `path`.
    ///
    /// The offset must lie within the file: `EINVAL` otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use memvol::*;
    /// use memvol::mem::Volume;
    ///
    /// let fs = Volume::new();
    /// fs.write_file("/f", &[0x0f, 0x00], 0o644).unwrap();
    /// fs.corrupt_file("/f", 0).unwrap();
    /// assert_eq!(fs.read_file("/f").unwrap(), [0xf0, 0x00]);
    /// assert!(fs.corrupt_file("/f", 2).is_err());
    /// ```
    pub fn corrupt_file<P: AsRef<Path>>(&self, path: P, offset: u64) -> Result<()> {
        let table = self.shared().table();
        let node = table.get(&table.resolve(path)?)?;
        if node.is_dir() {
            return Err(EISDIR());
        }
        let mut state = node.lock();
        if offset >= state.len() {
            return Err(EINVAL());
        }
        let byte = &mut state.buf[offset as usize];
        *byte = !*byte;
        debug!(target: TRACING_TARGET, path = ?state.path, offset, "corrupt");
        Ok(())
    }

    /// Flips one uniformly chosen byte inside every dirty interval of every file and returns what
    /// was flipped.
    ///
    /// Draws are limited to the part of an interval that a later truncate left in the file, and
    /// intervals cut off entirely are skipped. Overlapping intervals that pick the same offset flip
    /// it once, so every returned record is a byte that now differs. The dirty intervals themselves
    /// are left in place; only [`sync`] clears them, after which this is a no-op for that file.
    /// Files are visited in path order so a seeded `rng` reproduces the same damage.
    ///
    /// [`sync`]: ../trait.GenFile.html#tymethod.sync
    pub fn corrupt_dirty_intervals<R: Rng>(&self, rng: &mut R) -> Vec<Corruption> {
        let table = self.shared().table();
        let mut nodes: Vec<(&PathBuf, &Arc<Node>)> = table.nodes.iter().collect();
        nodes.sort_by(|l, r| l.0.cmp(r.0));

        let mut flipped = Vec::new();
        for (path, node) in nodes {
            let mut state = node.lock();
            let len = state.len();
            let offsets: BTreeSet<u64> = state
                .dirty
                .iter()
                .map(|interval| interval.start..cmp::min(interval.end, len))
                .filter(|live| !live.is_empty())
                .map(|live| rng.random_range(live))
                .collect();
            for offset in offsets {
                let byte = &mut state.buf[offset as usize];
                *byte = !*byte;
                debug!(target: TRACING_TARGET, ?path, offset, "corrupt");
                flipped.push(Corruption {
                    path: path.clone(),
                    offset,
                });
            }
        }
        flipped
    }
}
