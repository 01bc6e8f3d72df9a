//! Nodes: the bytes and metadata of one file or directory.
//!
//! A `Node` is owned by its volume's table and shared with every handle opened on it. Its parent
//! is recorded as a `NodeId`, never as a reference, so a node never keeps its directory alive and
//! a rename only has to touch the moved nodes.

use std::cmp;
use std::io::Result;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, MutexGuard};

use super::pool::BufferPool;
use crate::errors::*;
use crate::info::Info;
use crate::path_parts;

/// A stable identifier for a node. Ids are never reused within a volume.
pub(crate) type NodeId = u64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Kind {
    File,
    Dir,
}

/// Locks `lock`. A volume that is not thread safe only tries the lock, and overlapping use from
/// two threads panics like a double `RefCell` borrow.
pub(crate) fn guard<T>(lock: &Mutex<T>, thread_safe: bool) -> MutexGuard<'_, T> {
    if thread_safe {
        return lock.lock();
    }
    match lock.try_lock() {
        Some(guard) => guard,
        None => panic!("memvol: volume used from several threads without Config::thread_safe"),
    }
}

#[derive(Debug)]
pub(crate) struct NodeState {
    // path is the absolute path of the node and is always identical to its table key.
    pub path: PathBuf,
    // parent is None only for the root.
    pub parent: Option<NodeId>,
    pub buf: Vec<u8>,
    pub mode: u32,
    // dirty holds every interval written since the last sync, oldest first.
    pub dirty: Vec<Range<u64>>,
    pub modified: SystemTime,
}

impl NodeState {
    pub fn readable(&self) -> bool {
        self.mode & 0o444 != 0
    }

    pub fn writable(&self) -> bool {
        self.mode & 0o222 != 0
    }

    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    // read_at copies as much as is available at `at` into `buf`. Past the end nothing is copied.
    pub fn read_at(&self, buf: &mut [u8], at: u64) -> usize {
        if at >= self.len() {
            return 0;
        }
        let data = &self.buf[at as usize..];
        let n = cmp::min(data.len(), buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        n
    }

    // write_at copies `data` to `at`, zero-filling any gap between the current end and `at`.
    pub fn write_at(&mut self, data: &[u8], at: u64, max: u64, track: bool) -> Result<usize> {
        let end = at.checked_add(data.len() as u64).ok_or_else(EFBIG)?;
        if end > self.len() {
            self.resize(end, max)?;
        }
        self.buf[at as usize..end as usize].copy_from_slice(data);
        if track {
            self.mark_dirty(at..end);
        }
        self.modified = SystemTime::now();
        Ok(data.len())
    }

    // mark_dirty records a written interval, folding it into the previous one when they touch.
    fn mark_dirty(&mut self, range: Range<u64>) {
        match self.dirty.last_mut() {
            Some(last) if range.start <= last.end && last.start <= range.end => {
                last.start = cmp::min(last.start, range.start);
                last.end = cmp::max(last.end, range.end);
            }
            _ => self.dirty.push(range),
        }
    }

    // resize truncates or zero-extends the buffer. Capacity is never released.
    pub fn resize(&mut self, size: u64, max: u64) -> Result<()> {
        if size > max || size > usize::MAX as u64 {
            return Err(EFBIG());
        }
        self.buf.resize(size as usize, 0);
        self.modified = SystemTime::now();
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    id: NodeId,
    kind: Kind,
    thread_safe: bool,
    state: Mutex<NodeState>,
    pool: Arc<BufferPool>,
}

impl Node {
    pub fn new(
        id: NodeId,
        kind: Kind,
        path: PathBuf,
        parent: Option<NodeId>,
        mode: u32,
        pool: Arc<BufferPool>,
        thread_safe: bool,
    ) -> Node {
        let buf = match kind {
            Kind::File => pool.get(),
            Kind::Dir => Vec::new(),
        };
        Node {
            id,
            kind,
            thread_safe,
            state: Mutex::new(NodeState {
                path,
                parent,
                buf,
                mode: mode & 0o777,
                dirty: Vec::new(),
                modified: SystemTime::now(),
            }),
            pool,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_dir(&self) -> bool {
        self.kind == Kind::Dir
    }

    pub fn lock(&self) -> MutexGuard<'_, NodeState> {
        guard(&self.state, self.thread_safe)
    }

    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.lock().parent
    }

    pub fn info(&self) -> Info {
        let state = self.lock();
        self.info_locked(&state)
    }

    pub fn info_locked(&self, state: &NodeState) -> Info {
        Info::new(
            path_parts::base_name(&state.path),
            state.len(),
            state.mode,
            self.is_dir(),
            state.modified,
        )
    }

    // rekey moves the node from `from` to `to`, where `from` must be a prefix of its path.
    pub fn rekey(&self, from: &Path, to: &Path) {
        let mut state = self.lock();
        if let Ok(rest) = state.path.strip_prefix(from) {
            state.path = if rest.as_os_str().is_empty() {
                to.to_path_buf()
            } else {
                to.join(rest)
            };
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.state.get_mut().buf);
        if buf.capacity() > 0 {
            self.pool.put(buf);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn file(pool: &Arc<BufferPool>) -> Node {
        Node::new(
            1,
            Kind::File,
            PathBuf::from("/f"),
            Some(0),
            0o644,
            pool.clone(),
            false,
        )
    }

    #[test]
    fn write_zero_fills_gap() {
        let pool = Arc::new(BufferPool::default());
        let node = file(&pool);
        let mut state = node.lock();
        assert_eq!(state.write_at(b"ab", 3, 1 << 20, true).unwrap(), 2);
        assert_eq!(state.buf, vec![0, 0, 0, b'a', b'b']);
        assert_eq!(state.dirty, vec![3..5]);

        let mut buf = [9u8; 8];
        assert_eq!(state.read_at(&mut buf, 1), 4);
        assert_eq!(&buf[..4], &[0, 0, b'a', b'b']);
        assert_eq!(state.read_at(&mut buf, 5), 0);
        assert_eq!(state.read_at(&mut buf, 100), 0);
    }

    #[test]
    fn adjacent_writes_share_an_interval() {
        let pool = Arc::new(BufferPool::default());
        let node = file(&pool);
        let mut state = node.lock();
        for i in 0..100u64 {
            state.write_at(b"x", i, 1 << 20, true).unwrap();
        }
        assert_eq!(state.dirty, vec![0..100]);

        state.write_at(b"yy", 50, 1 << 20, true).unwrap();
        assert_eq!(state.dirty, vec![0..100]);
        state.write_at(b"z", 200, 1 << 20, true).unwrap();
        state.write_at(b"zz", 199, 1 << 20, true).unwrap();
        assert_eq!(state.dirty, vec![0..100, 199..201]);
    }

    #[test]
    fn growth_is_bounded() {
        let pool = Arc::new(BufferPool::default());
        let node = file(&pool);
        let mut state = node.lock();
        let err = state.write_at(b"x", 10, 10, false).unwrap_err();
        assert_eq!(err.raw_os_error(), EFBIG().raw_os_error());
        assert_eq!(state.write_at(b"x", 9, 10, false).unwrap(), 1);
        assert!(state.dirty.is_empty());
        assert_eq!(
            state.resize(11, 10).unwrap_err().raw_os_error(),
            EFBIG().raw_os_error()
        );
    }

    #[test]
    fn permission_bits() {
        let pool = Arc::new(BufferPool::default());
        let node = file(&pool);
        let mut state = node.lock();
        assert!(state.readable() && state.writable());
        state.mode = 0o400;
        assert!(state.readable() && !state.writable());
        state.mode = 0o020;
        assert!(!state.readable() && state.writable());
    }

    #[test]
    fn rekey_subtree() {
        let pool = Arc::new(BufferPool::default());
        let node = file(&pool);
        node.lock().path = PathBuf::from("/a/b/f");
        node.rekey(Path::new("/a"), Path::new("/z"));
        assert_eq!(node.path(), PathBuf::from("/z/b/f"));
        node.rekey(Path::new("/z/b/f"), Path::new("/g"));
        assert_eq!(node.path(), PathBuf::from("/g"));
        assert_eq!(node.info().name(), std::ffi::OsStr::new("g"));
    }

    #[test]
    fn drop_returns_buffer() {
        let pool = Arc::new(BufferPool::new(64, 4));
        let node = file(&pool);
        node.lock().write_at(b"data", 0, 1 << 20, false).unwrap();
        assert_eq!(pool.retained(), 0);
        drop(node);
        assert_eq!(pool.retained(), 1);
        assert!(pool.get().is_empty());
    }
}
