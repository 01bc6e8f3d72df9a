//! Volume configuration.

use std::sync::Arc;

use super::pool::BufferPool;
use super::volume::Volume;

/// Largest size a file may grow to unless configured otherwise: 1 GiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1 << 30;

/// Configuration for a [`Volume`].
///
/// # Examples
///
/// ```
/// use memvol::mem::Config;
///
/// let vol = Config::new()
///     .thread_safe(true)
///     .track_dirty(true)
///     .max_file_size(1 << 20)
///     .build();
/// # drop(vol);
/// ```
///
/// [`Volume`]: struct.Volume.html
#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) thread_safe: bool,
    pub(crate) track_dirty: bool,
    pub(crate) root_mode: u32,
    pub(crate) max_file_size: u64,
    pub(crate) pool: Option<Arc<BufferPool>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thread_safe: false,
            track_dirty: false,
            root_mode: 0o777,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            pool: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard the table and every node with blocking locks so the volume can be shared between
    /// threads.
    ///
    /// Default: false. A single-threaded volume still checks its locks, but only tries them:
    /// overlapping calls from two threads panic instead of corrupting state.
    pub fn thread_safe(&mut self, value: bool) -> &mut Self {
        self.thread_safe = value;
        self
    }

    /// Record the byte interval of every write until the file is synced.
    ///
    /// Default: false. The intervals are what
    /// [`corrupt_dirty_intervals`](struct.Volume.html#method.corrupt_dirty_intervals) damages.
    pub fn track_dirty(&mut self, value: bool) -> &mut Self {
        self.track_dirty = value;
        self
    }

    /// Permission bits of `/`.
    ///
    /// Default: `0o777`.
    pub fn root_mode(&mut self, mode: u32) -> &mut Self {
        self.root_mode = mode & 0o777;
        self
    }

    /// Writes and truncates that would grow a file past this size fail with `EFBIG`.
    ///
    /// Default: 1 GiB.
    pub fn max_file_size(&mut self, bytes: u64) -> &mut Self {
        self.max_file_size = bytes;
        self
    }

    /// Use `pool` for file buffers instead of a pool private to the volume.
    pub fn pool(&mut self, pool: Arc<BufferPool>) -> &mut Self {
        self.pool = Some(pool);
        self
    }

    /// Creates an empty volume with this configuration.
    pub fn build(&self) -> Volume {
        Volume::with_config(self.clone())
    }
}
