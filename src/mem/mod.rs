//! An in-memory filesystem.
//!
//! A [`Volume`] reproduces the observable behavior of the host's file API: the same bytes come
//! back from the same calls, and failures carry the same OS error codes. Files and directories
//! live in a table keyed by clean absolute path; [`Handle`]s refer to them directly, so a handle
//! keeps working across renames and removals the way a file descriptor does.
//!
//! On top of that the volume can track which byte ranges were written since the last `sync` and
//! corrupt them on demand, to test how code copes with a crash that lost unflushed data.
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//! use rand::SeedableRng;
//!
//! use memvol::*;
//! use memvol::mem::Config;
//!
//! let fs = Config::new().track_dirty(true).build();
//! fs.mkdir_all("/db", 0o755).unwrap();
//!
//! let mut f = fs.create("/db/log").unwrap();
//! f.write_all(b"committed").unwrap();
//! f.sync().unwrap();
//! f.write_all(b" pending").unwrap();
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let damage = fs.corrupt_dirty_intervals(&mut rng);
//! assert_eq!(damage.len(), 1);
//! assert!(damage[0].offset >= 9);
//!
//! let data = fs.read_file("/db/log").unwrap();
//! assert_eq!(&data[..9], b"committed");
//! ```
//!
//! [`Volume`]: struct.Volume.html
//! [`Handle`]: struct.Handle.html

mod config;
mod corrupt;
mod handle;
mod node;
mod pool;
mod volume;

pub use self::config::{Config, DEFAULT_MAX_FILE_SIZE};
pub use self::corrupt::Corruption;
pub use self::handle::Handle;
pub use self::pool::{BufferPool, DEFAULT_CAPACITY, DEFAULT_RETAINED};
pub use self::volume::{Volume, TEMP_DIR};
