//! A generic filesystem with a real (disk) and an in-memory implementation.
//!
//! Code that uses [`std::fs`] directly is hard to test against failures: you are rarely running
//! on an already broken machine, and a crash that loses unflushed writes is harder still to
//! reproduce. This crate puts the filesystem behind two traits, [`GenFs`] for path operations and
//! [`GenFile`] for open files. Your main can use [`disk::Disk`] to get plain [`std::fs`] behavior,
//! while your tests use a [`mem::Volume`]: an in-memory filesystem that returns the same bytes and
//! the same OS error codes, and that can corrupt data written since the last `sync`.
//!
//! When the backend is only known at runtime, [`Fs`] wraps either one.
//!
//! The implementations follow Unix semantics; errors carry raw `errno` values so
//! [`errors::classify`] sorts them the same way whichever backend produced them.
//!
//! [`std::fs`]: https://doc.rust-lang.org/std/fs/
//! [`GenFs`]: trait.GenFs.html
//! [`GenFile`]: trait.GenFile.html
//! [`disk::Disk`]: disk/struct.Disk.html
//! [`mem::Volume`]: mem/struct.Volume.html
//! [`Fs`]: enum.Fs.html
//! [`errors::classify`]: errors/fn.classify.html

mod fs;
mod info;

pub mod disk;
pub mod errors;
pub mod facade;
pub mod flags;
pub mod mem;
pub mod path_parts;
pub mod temp;

pub use facade::{File, Fs};
pub use flags::OpenFlags;
pub use fs::{GenFile, GenFs};
pub use info::Info;

/// Target used by every log event this crate emits.
pub const TRACING_TARGET: &str = "memvol";
