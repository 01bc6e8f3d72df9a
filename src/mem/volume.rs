//! The node table and every path-based operation.

use std::collections::HashMap;
use std::fmt;
use std::io::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use super::config::Config;
use super::handle::Handle;
use super::node::{guard, Kind, Node, NodeId};
use super::pool::BufferPool;
use crate::errors::*;
use crate::flags::OpenFlags;
use crate::fs::GenFs;
use crate::info::Info;
use crate::path_parts::{self, within};
use crate::temp;
use crate::TRACING_TARGET;

/// Where `temp_dir` points.
pub const TEMP_DIR: &str = "/tmp";

// Table maps every clean absolute path to its node. The root is always present.
#[derive(Debug)]
pub(crate) struct Table {
    pub nodes: HashMap<PathBuf, Arc<Node>>,
    pub cwd: PathBuf,
    next_id: NodeId,
    pool: Arc<BufferPool>,
    thread_safe: bool,
}

impl Table {
    fn new(root_mode: u32, pool: Arc<BufferPool>, thread_safe: bool) -> Table {
        let mut table = Table {
            nodes: HashMap::new(),
            cwd: PathBuf::new(),
            next_id: 0,
            pool,
            thread_safe,
        };
        table.reset(root_mode);
        table
    }

    // reset drops every node and installs a fresh root.
    fn reset(&mut self, root_mode: u32) {
        self.nodes.clear();
        self.cwd = PathBuf::from("/");
        self.insert(Kind::Dir, PathBuf::from("/"), None, root_mode);
    }

    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        path_parts::absolute(&self.cwd, path)
    }

    pub fn get(&self, path: &Path) -> Result<Arc<Node>> {
        self.nodes.get(path).cloned().ok_or_else(ENOENT)
    }

    // parent_dir returns the directory that would contain `path`. A missing or non-directory
    // parent is reported as not found.
    fn parent_dir(&self, path: &Path) -> Result<Arc<Node>> {
        match self.nodes.get(path_parts::parent(path)) {
            Some(node) if node.is_dir() => Ok(node.clone()),
            _ => Err(ENOENT()),
        }
    }

    fn insert(&mut self, kind: Kind, path: PathBuf, parent: Option<NodeId>, mode: u32) -> Arc<Node> {
        let id = self.next_id;
        self.next_id += 1;
        let node = Arc::new(Node::new(
            id,
            kind,
            path.clone(),
            parent,
            mode,
            self.pool.clone(),
            self.thread_safe,
        ));
        self.nodes.insert(path, node.clone());
        node
    }

    // children scans the whole table for nodes whose parent is `dir`.
    pub fn children(&self, dir: NodeId) -> Vec<Arc<Node>> {
        self.nodes
            .values()
            .filter(|node| node.parent() == Some(dir))
            .cloned()
            .collect()
    }

    fn has_children(&self, dir: NodeId) -> bool {
        self.nodes.values().any(|node| node.parent() == Some(dir))
    }

    // snapshot lists `dir`, sorted by name.
    pub fn snapshot(&self, dir: NodeId) -> Vec<Info> {
        let mut infos: Vec<Info> = self.children(dir).iter().map(|node| node.info()).collect();
        infos.sort_by(|l, r| l.name().cmp(r.name()));
        infos
    }
}

// Shared is everything a volume's clones and handles have in common.
pub(crate) struct Shared {
    table: Mutex<Table>,
    pub config: Config,
    pub pool: Arc<BufferPool>,
    pub track_dirty: AtomicBool,
}

impl Shared {
    pub fn table(&self) -> MutexGuard<'_, Table> {
        guard(&self.table, self.config.thread_safe)
    }

    pub fn tracking(&self) -> bool {
        self.track_dirty.load(Ordering::Relaxed)
    }

    pub fn max_file_size(&self) -> u64 {
        self.config.max_file_size
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Shared")
            .field("config", &self.config)
            .field("track_dirty", &self.tracking())
            .finish()
    }
}

/// An in-memory filesystem.
///
/// A `Volume` is cheap to clone; clones share the same files. Every path is resolved lexically
/// against the volume's own working directory and never touches the host.
///
/// # Examples
///
/// ```
/// use std::io::{Read, Seek, SeekFrom, Write};
///
/// use memvol::*;
/// use memvol::mem::Volume;
///
/// let fs = Volume::new();
/// fs.mkdir_all("a/b/c", 0o755).unwrap();
///
/// let mut wf = fs.open_file("a/f", OpenFlags::WRONLY | OpenFlags::CREATE | OpenFlags::EXCL, 0o600).unwrap();
/// assert_eq!(wf.write(&[0, 1, 2, 3, 4, 5]).unwrap(), 6);
///
/// let mut rf = fs.open("/a/f").unwrap();
/// assert_eq!(rf.seek(SeekFrom::Start(1)).unwrap(), 1);
/// let mut output = [0u8; 4];
/// assert_eq!(rf.read(&mut output).unwrap(), 4);
/// assert_eq!(&output, &[1, 2, 3, 4]);
///
/// let names: Vec<_> = fs.read_dir("a").unwrap().into_iter().map(|i| i.name().to_owned()).collect();
/// assert_eq!(names, ["b", "f"]);
/// ```
#[derive(Clone, Debug)]
pub struct Volume {
    shared: Arc<Shared>,
}

impl Volume {
    /// Creates an empty, single-threaded volume with the default configuration.
    pub fn new() -> Volume {
        Config::default().build()
    }

    /// Creates an empty, thread-safe volume.
    pub fn thread_safe() -> Volume {
        Config::new().thread_safe(true).build()
    }

    /// Creates an empty volume with the given configuration.
    pub fn with_config(config: Config) -> Volume {
        let pool = config.pool.clone().unwrap_or_default();
        let table = Table::new(config.root_mode, pool.clone(), config.thread_safe);
        Volume {
            shared: Arc::new(Shared {
                table: Mutex::new(table),
                track_dirty: AtomicBool::new(config.track_dirty),
                config,
                pool,
            }),
        }
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    /// Starts recording the interval of every write, see [`corrupt_dirty_intervals`].
    ///
    /// [`corrupt_dirty_intervals`]: #method.corrupt_dirty_intervals
    pub fn track_dirty_intervals(&self) {
        self.shared.track_dirty.store(true, Ordering::Relaxed);
    }

    /// The buffer pool backing this volume's files.
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.shared.pool
    }

    /// The current working directory.
    pub fn cwd(&self) -> PathBuf {
        self.shared.table().cwd.clone()
    }

    /// Drops every file and directory and resets the working directory to `/`.
    ///
    /// Buffers return to the pool once no handle refers to their file anymore. Open handles keep
    /// working on their detached files.
    pub fn release(&self) {
        let mut table = self.shared.table();
        let dropped = table.nodes.len() - 1;
        table.reset(self.shared.config.root_mode);
        debug!(target: TRACING_TARGET, dropped, "release");
    }

    fn open_locked(&self, table: &mut Table, path: PathBuf, flags: OpenFlags, mode: u32) -> Result<Handle> {
        let node = match table.nodes.get(&path).cloned() {
            Some(node) => {
                if flags.create() && flags.exclusive() {
                    return Err(EEXIST());
                }
                // Truncation needs write access even through a read-only handle.
                let write = flags.can_write() || flags.truncate();
                if node.is_dir() && (write || flags.create()) {
                    return Err(EISDIR());
                }
                let mut state = node.lock();
                if flags.can_read() && !state.readable() {
                    return Err(EACCES());
                }
                if write && !state.writable() {
                    return Err(EACCES());
                }
                if flags.truncate() {
                    state.resize(0, self.shared.max_file_size())?;
                }
                drop(state);
                node
            }
            None => {
                if !flags.create() {
                    return Err(ENOENT());
                }
                let parent = table.parent_dir(&path)?;
                debug!(target: TRACING_TARGET, ?path, mode, "create");
                table.insert(Kind::File, path, Some(parent.id()), mode)
            }
        };
        trace!(target: TRACING_TARGET, path = ?node.path(), ?flags, "open");
        Ok(Handle::new(node, self.shared.clone(), flags))
    }

    fn mkdir_locked(&self, table: &mut Table, path: PathBuf, mode: u32) -> Result<()> {
        if table.nodes.contains_key(&path) {
            return Err(EEXIST());
        }
        let parent = table.parent_dir(&path)?;
        debug!(target: TRACING_TARGET, ?path, mode, "mkdir");
        table.insert(Kind::Dir, path, Some(parent.id()), mode);
        Ok(())
    }
}

impl Default for Volume {
    fn default() -> Self {
        Volume::new()
    }
}

impl GenFs for Volume {
    type File = Handle;

    fn open_file<P: AsRef<Path>>(&self, path: P, flags: OpenFlags, mode: u32) -> Result<Handle> {
        let mut table = self.shared.table();
        let path = table.resolve(path)?;
        self.open_locked(&mut table, path, flags, mode)
    }

    fn create_temp<P: AsRef<Path>>(&self, dir: P, pattern: &str) -> Result<Handle> {
        let dir = match dir.as_ref() {
            dir if dir.as_os_str().is_empty() => self.temp_dir(),
            dir => dir.to_path_buf(),
        };
        temp::create_unique(&dir, pattern, |candidate| {
            self.open_file(
                candidate,
                OpenFlags::RDWR | OpenFlags::CREATE | OpenFlags::EXCL,
                0o600,
            )
        })
    }

    fn chdir<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut table = self.shared.table();
        let path = table.resolve(path)?;
        if !table.get(&path)?.is_dir() {
            return Err(ENOTDIR());
        }
        table.cwd = path;
        Ok(())
    }

    fn chmod<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()> {
        let table = self.shared.table();
        let node = table.get(&table.resolve(path)?)?;
        node.lock().mode = mode & 0o777;
        Ok(())
    }

    fn chown<P: AsRef<Path>>(&self, path: P, _uid: u32, _gid: u32) -> Result<()> {
        let table = self.shared.table();
        table.get(&table.resolve(path)?).map(|_| ())
    }

    fn mkdir<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()> {
        let mut table = self.shared.table();
        let path = table.resolve(path)?;
        self.mkdir_locked(&mut table, path, mode)
    }

    fn mkdir_all<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()> {
        let mut table = self.shared.table();
        let path = table.resolve(path)?;
        let mut missing: Vec<&Path> = Vec::new();
        for ancestor in path.ancestors() {
            match table.nodes.get(ancestor) {
                Some(node) if node.is_dir() => break,
                Some(_) => return Err(ENOTDIR()),
                None => missing.push(ancestor),
            }
        }
        for dir in missing.into_iter().rev() {
            self.mkdir_locked(&mut table, dir.to_path_buf(), mode)?;
        }
        Ok(())
    }

    fn mkdir_temp<P: AsRef<Path>>(&self, dir: P, pattern: &str) -> Result<PathBuf> {
        let dir = match dir.as_ref() {
            dir if dir.as_os_str().is_empty() => self.temp_dir(),
            dir => dir.to_path_buf(),
        };
        temp::create_unique(&dir, pattern, |candidate| {
            self.mkdir(candidate, 0o700).map(|()| candidate.to_path_buf())
        })
    }

    fn read_link<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let table = self.shared.table();
        table.get(&table.resolve(path)?)?;
        // Nothing is ever a symlink.
        Err(EINVAL())
    }

    fn remove<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut table = self.shared.table();
        let path = table.resolve(path)?;
        let node = table.get(&path)?;
        if node.parent().is_none() {
            return Err(EACCES());
        }
        if node.is_dir() && table.has_children(node.id()) {
            return Err(ENOTEMPTY());
        }
        table.nodes.remove(&path);
        debug!(target: TRACING_TARGET, ?path, "remove");
        Ok(())
    }

    fn remove_all<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut table = self.shared.table();
        let path = table.resolve(path)?;
        match table.nodes.get(&path) {
            None => return Ok(()),
            Some(node) if node.parent().is_none() => return Err(EACCES()),
            Some(_) => (),
        }
        let before = table.nodes.len();
        table.nodes.retain(|key, _| !within(key, &path));
        debug!(target: TRACING_TARGET, ?path, removed = before - table.nodes.len(), "remove_all");
        Ok(())
    }

    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&self, from: P, to: Q) -> Result<()> {
        let mut table = self.shared.table();
        let from = table.resolve(from)?;
        let to = table.resolve(to)?;
        let node = table.get(&from)?;
        if node.parent().is_none() {
            return Err(EINVAL());
        }
        if from == to {
            return Ok(());
        }
        let parent = table.parent_dir(&to)?;
        if node.is_dir() && within(&to, &from) {
            return Err(EINVAL());
        }
        if let Some(dest) = table.nodes.get(&to).cloned() {
            match (node.is_dir(), dest.is_dir()) {
                (false, true) => return Err(EISDIR()),
                (true, false) => return Err(ENOTDIR()),
                (true, true) if table.has_children(dest.id()) => return Err(ENOTEMPTY()),
                _ => (),
            }
            if dest.parent().is_none() {
                return Err(EINVAL());
            }
            table.nodes.remove(&to);
        }

        let moved: Vec<PathBuf> = table
            .nodes
            .keys()
            .filter(|key| within(key, &from))
            .cloned()
            .collect();
        for key in moved {
            if let Some(child) = table.nodes.remove(&key) {
                child.rekey(&from, &to);
                let path = child.path();
                table.nodes.insert(path, child);
            }
        }
        node.lock().parent = Some(parent.id());
        if within(&table.cwd, &from) {
            let rest = table.cwd.strip_prefix(&from).map(Path::to_path_buf).unwrap_or_default();
            table.cwd = if rest.as_os_str().is_empty() { to.clone() } else { to.join(rest) };
        }
        debug!(target: TRACING_TARGET, ?from, ?to, "rename");
        Ok(())
    }

    fn truncate<P: AsRef<Path>>(&self, path: P, size: i64) -> Result<()> {
        if size < 0 {
            return Err(EINVAL());
        }
        let table = self.shared.table();
        let node = table.get(&table.resolve(path)?)?;
        if node.is_dir() {
            return Err(EISDIR());
        }
        let mut state = node.lock();
        if !state.writable() {
            return Err(EACCES());
        }
        state.resize(size as u64, self.shared.max_file_size())
    }

    fn stat<P: AsRef<Path>>(&self, path: P) -> Result<Info> {
        let table = self.shared.table();
        Ok(table.get(&table.resolve(path)?)?.info())
    }

    fn temp_dir(&self) -> PathBuf {
        let dir = PathBuf::from(TEMP_DIR);
        if let Err(err) = self.mkdir_all(&dir, 0o777) {
            debug!(target: TRACING_TARGET, %err, "temp dir unavailable");
        }
        dir
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fs::GenFile;
    use std::ffi::OsStr;
    use std::io::{Error, Read, Write};

    fn errs_eq(l: Error, r: Error) -> bool {
        l.raw_os_error() == r.raw_os_error()
    }

    fn names(infos: Vec<Info>) -> Vec<String> {
        infos
            .iter()
            .map(|info| info.name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn root_exists() {
        let fs = Volume::new();
        let info = fs.stat("/").unwrap();
        assert!(info.is_dir());
        assert_eq!(info.name(), OsStr::new("/"));
        assert_eq!(info.mode(), 0o777);
        assert_eq!(fs.cwd(), PathBuf::from("/"));

        assert!(errs_eq(fs.remove("/").unwrap_err(), EACCES()));
        assert!(errs_eq(fs.remove_all("/").unwrap_err(), EACCES()));
        assert!(errs_eq(fs.rename("/", "/x").unwrap_err(), EINVAL()));
        assert!(errs_eq(fs.mkdir("/", 0o777).unwrap_err(), EEXIST()));
        assert!(errs_eq(fs.stat("").unwrap_err(), ENOENT()));
    }

    #[test]
    fn open_missing_and_create() {
        let fs = Volume::new();
        assert!(errs_eq(fs.open("/missing").unwrap_err(), ENOENT()));
        assert!(errs_eq(
            fs.open_file("/nodir/f", OpenFlags::RDWR | OpenFlags::CREATE, 0o666).unwrap_err(),
            ENOENT()
        ));

        let flags = OpenFlags::RDWR | OpenFlags::CREATE | OpenFlags::EXCL;
        assert!(fs.open_file("/f", flags, 0o644).is_ok());
        assert!(errs_eq(fs.open_file("/f", flags, 0o644).unwrap_err(), EEXIST()));
        assert!(fs.open_file("/f", OpenFlags::RDWR | OpenFlags::CREATE, 0o644).is_ok());

        // A file is not a directory to create things in.
        assert!(errs_eq(
            fs.open_file("/f/g", OpenFlags::RDWR | OpenFlags::CREATE, 0o644).unwrap_err(),
            ENOENT()
        ));
    }

    #[test]
    fn open_permissions() {
        let fs = Volume::new();
        fs.write_file("/f", b"abc", 0o000).unwrap();
        // A new file's mode does not apply to the handle that created it.
        let mut f = fs
            .open_file("/g", OpenFlags::RDWR | OpenFlags::CREATE, 0o000)
            .unwrap();
        assert_eq!(f.write(b"x").unwrap(), 1);

        assert!(errs_eq(fs.open("/f").unwrap_err(), EACCES()));
        assert!(errs_eq(fs.open_file("/f", OpenFlags::WRONLY, 0).unwrap_err(), EACCES()));

        fs.chmod("/f", 0o444).unwrap();
        assert!(fs.open("/f").is_ok());
        assert!(errs_eq(fs.open_file("/f", OpenFlags::RDWR, 0).unwrap_err(), EACCES()));
        assert!(errs_eq(
            fs.open_file("/f", OpenFlags::RDONLY | OpenFlags::TRUNC, 0).unwrap_err(),
            EACCES()
        ));
        assert_eq!(fs.stat("/f").unwrap().len(), 3);

        fs.chmod("/f", 0o200).unwrap();
        assert!(fs.open_file("/f", OpenFlags::WRONLY | OpenFlags::TRUNC, 0).is_ok());
        assert_eq!(fs.stat("/f").unwrap().len(), 0);
        assert_eq!(fs.stat("/f").unwrap().mode(), 0o200);
    }

    #[test]
    fn open_directories() {
        let fs = Volume::new();
        fs.mkdir("/d", 0o755).unwrap();
        assert!(fs.open("/d").is_ok());
        assert!(errs_eq(fs.open_file("/d", OpenFlags::WRONLY, 0).unwrap_err(), EISDIR()));
        assert!(errs_eq(
            fs.open_file("/d", OpenFlags::RDONLY | OpenFlags::CREATE, 0o644).unwrap_err(),
            EISDIR()
        ));
        assert!(errs_eq(fs.create("/d").unwrap_err(), EISDIR()));
    }

    #[test]
    fn truncate_on_open_keeps_capacity() {
        let fs = Volume::new();
        fs.write_file("/f", &[7; 100], 0o644).unwrap();
        let f = fs.open_file("/f", OpenFlags::RDWR | OpenFlags::TRUNC, 0).unwrap();
        assert_eq!(f.stat().unwrap().len(), 0);
        let table = fs.shared.table();
        let node = table.get(Path::new("/f")).unwrap();
        assert!(node.lock().buf.capacity() >= 100);
    }

    #[test]
    fn mkdir() {
        let fs = Volume::new();
        assert!(fs.mkdir("/a", 0o755).is_ok());
        assert!(errs_eq(fs.mkdir("/a", 0o755).unwrap_err(), EEXIST()));
        assert!(errs_eq(fs.mkdir("/x/y", 0o755).unwrap_err(), ENOENT()));
        fs.write_file("/a/f", b"", 0o644).unwrap();
        assert!(errs_eq(fs.mkdir("/a/f/g", 0o755).unwrap_err(), ENOENT()));
        assert!(errs_eq(fs.mkdir("/a/f", 0o755).unwrap_err(), EEXIST()));
        assert_eq!(fs.stat("/a").unwrap().mode(), 0o755);
    }

    #[test]
    fn mkdir_all() {
        let fs = Volume::new();
        assert!(fs.mkdir_all("/a/b/c", 0o700).is_ok());
        assert!(fs.mkdir_all("/a/b/c", 0o700).is_ok());
        assert!(fs.stat("/a/b").unwrap().is_dir());
        assert_eq!(fs.stat("/a/b/c").unwrap().mode(), 0o700);

        fs.write_file("/a/f", b"", 0o644).unwrap();
        assert!(errs_eq(fs.mkdir_all("/a/f", 0o700).unwrap_err(), ENOTDIR()));
        assert!(errs_eq(fs.mkdir_all("/a/f/g/h", 0o700).unwrap_err(), ENOTDIR()));
        assert!(errs_eq(fs.stat("/a/f/g").unwrap_err(), ENOENT()));
        assert!(fs.mkdir_all("/", 0o700).is_ok());
    }

    #[test]
    fn relative_paths_and_chdir() {
        let fs = Volume::new();
        fs.mkdir_all("/a/b", 0o755).unwrap();
        fs.write_file("/a/f", b"x", 0o644).unwrap();

        assert!(errs_eq(fs.chdir("/missing").unwrap_err(), ENOENT()));
        assert!(errs_eq(fs.chdir("/a/f").unwrap_err(), ENOTDIR()));

        fs.chdir("a/b").unwrap();
        assert_eq!(fs.cwd(), PathBuf::from("/a/b"));
        assert_eq!(fs.read_file("../f").unwrap(), b"x");
        fs.write_file("g", b"y", 0o644).unwrap();
        assert_eq!(fs.read_file("/a/b/g").unwrap(), b"y");
        fs.chdir("..").unwrap();
        assert_eq!(fs.cwd(), PathBuf::from("/a"));
        assert_eq!(names(fs.read_dir(".").unwrap()), ["b", "f"]);
    }

    #[test]
    fn remove() {
        let fs = Volume::new();
        assert!(errs_eq(fs.remove("/a").unwrap_err(), ENOENT()));
        fs.mkdir_all("/a/b", 0o755).unwrap();
        assert!(errs_eq(fs.remove("/a").unwrap_err(), ENOTEMPTY()));
        assert!(fs.remove("/a/b").is_ok());
        assert!(fs.remove("/a").is_ok());
        assert!(errs_eq(fs.stat("/a").unwrap_err(), ENOENT()));

        fs.write_file("/f", b"data", 0o644).unwrap();
        let f = fs.open("/f").unwrap();
        fs.remove("/f").unwrap();
        // The file lives on for handles that still hold it.
        let mut buf = [0u8; 4];
        assert_eq!(f.read_at(&mut buf, 0).unwrap(), 4);
        assert!(errs_eq(fs.open("/f").unwrap_err(), ENOENT()));
    }

    #[test]
    fn remove_all() {
        let fs = Volume::new();
        assert!(fs.remove_all("/never").is_ok());
        fs.mkdir_all("/a/b/c", 0o755).unwrap();
        fs.write_file("/a/b/f", b"", 0o644).unwrap();
        fs.write_file("/ab", b"", 0o644).unwrap();
        assert!(fs.remove_all("/a").is_ok());
        assert!(errs_eq(fs.stat("/a/b/c").unwrap_err(), ENOENT()));
        assert!(errs_eq(fs.stat("/a").unwrap_err(), ENOENT()));
        assert!(fs.stat("/ab").is_ok());
        assert!(fs.remove_all("/ab").is_ok());
        assert!(fs.read_dir("/").unwrap().is_empty());
    }

    #[test]
    fn rename_file() {
        let fs = Volume::new();
        fs.mkdir("/d", 0o755).unwrap();
        fs.write_file("/f", b"abc", 0o644).unwrap();
        let f = fs.open("/f").unwrap();

        assert!(errs_eq(fs.rename("/missing", "/x").unwrap_err(), ENOENT()));
        assert!(errs_eq(fs.rename("/f", "/nodir/x").unwrap_err(), ENOENT()));

        fs.rename("/f", "/d/g").unwrap();
        assert!(errs_eq(fs.stat("/f").unwrap_err(), ENOENT()));
        assert_eq!(fs.read_file("/d/g").unwrap(), b"abc");
        assert_eq!(f.name(), PathBuf::from("/d/g"));
        assert_eq!(names(fs.read_dir("/").unwrap()), ["d"]);
        assert_eq!(names(fs.read_dir("/d").unwrap()), ["g"]);

        assert!(fs.rename("/d/g", "/d/g").is_ok());
    }

    #[test]
    fn rename_onto_existing() {
        let fs = Volume::new();
        fs.write_file("/f", b"new", 0o644).unwrap();
        fs.write_file("/g", b"old", 0o644).unwrap();
        fs.mkdir_all("/d/e", 0o755).unwrap();
        fs.mkdir("/empty", 0o755).unwrap();

        fs.rename("/f", "/g").unwrap();
        assert_eq!(fs.read_file("/g").unwrap(), b"new");
        assert!(errs_eq(fs.stat("/f").unwrap_err(), ENOENT()));

        assert!(errs_eq(fs.rename("/g", "/d").unwrap_err(), EISDIR()));
        assert!(errs_eq(fs.rename("/d", "/g").unwrap_err(), ENOTDIR()));
        assert!(errs_eq(fs.rename("/empty", "/d").unwrap_err(), ENOTEMPTY()));
        assert!(errs_eq(fs.rename("/d", "/d/e/x").unwrap_err(), EINVAL()));

        fs.rename("/d/e", "/empty").unwrap();
        assert!(fs.stat("/empty").unwrap().is_dir());
        assert!(fs.read_dir("/d").unwrap().is_empty());
    }

    #[test]
    fn rename_directory_moves_subtree() {
        let fs = Volume::new();
        fs.mkdir_all("/a/b/c", 0o755).unwrap();
        fs.write_file("/a/b/c/f", b"deep", 0o644).unwrap();
        fs.mkdir("/z", 0o755).unwrap();
        fs.chdir("/a/b").unwrap();
        let f = fs.open("/a/b/c/f").unwrap();

        fs.rename("/a", "/z/a2").unwrap();
        assert_eq!(fs.read_file("/z/a2/b/c/f").unwrap(), b"deep");
        assert_eq!(f.name(), PathBuf::from("/z/a2/b/c/f"));
        assert_eq!(fs.cwd(), PathBuf::from("/z/a2/b"));
        assert!(errs_eq(fs.stat("/a/b").unwrap_err(), ENOENT()));
        assert_eq!(names(fs.read_dir("/z/a2/b").unwrap()), ["c"]);

        let table = fs.shared.table();
        for (key, node) in &table.nodes {
            assert_eq!(*key, node.path());
        }
    }

    #[test]
    fn truncate_path() {
        let fs = Volume::new();
        assert!(errs_eq(fs.truncate("/f", 1).unwrap_err(), ENOENT()));
        fs.write_file("/f", b"abcdef", 0o644).unwrap();
        assert!(errs_eq(fs.truncate("/f", -1).unwrap_err(), EINVAL()));
        fs.truncate("/f", 2).unwrap();
        assert_eq!(fs.read_file("/f").unwrap(), b"ab");
        fs.truncate("/f", 4).unwrap();
        assert_eq!(fs.read_file("/f").unwrap(), b"ab\0\0");

        fs.chmod("/f", 0o444).unwrap();
        assert!(errs_eq(fs.truncate("/f", 0).unwrap_err(), EACCES()));
        fs.mkdir("/d", 0o755).unwrap();
        assert!(errs_eq(fs.truncate("/d", 0).unwrap_err(), EISDIR()));
    }

    #[test]
    fn max_file_size() {
        let fs = Config::new().max_file_size(8).build();
        fs.write_file("/f", b"12345678", 0o644).unwrap();
        assert!(errs_eq(fs.truncate("/f", 9).unwrap_err(), EFBIG()));
        let f = fs.open_file("/f", OpenFlags::WRONLY, 0).unwrap();
        assert!(errs_eq(f.write_at(b"x", 8).unwrap_err(), EFBIG()));
    }

    #[test]
    fn chmod_chown_read_link() {
        let fs = Volume::new();
        assert!(errs_eq(fs.chmod("/f", 0o644).unwrap_err(), ENOENT()));
        assert!(errs_eq(fs.chown("/f", 0, 0).unwrap_err(), ENOENT()));
        assert!(errs_eq(fs.read_link("/f").unwrap_err(), ENOENT()));

        fs.write_file("/f", b"", 0o644).unwrap();
        fs.chmod("/f", 0o7755).unwrap();
        assert_eq!(fs.stat("/f").unwrap().mode(), 0o755);
        assert!(fs.chown("/f", 1000, 1000).is_ok());
        assert!(errs_eq(fs.read_link("/f").unwrap_err(), EINVAL()));
    }

    #[test]
    fn temp_names() {
        let fs = Volume::new();
        let mut f = fs.create_temp("", "pre*.suf").unwrap();
        let name = f.name();
        assert_eq!(name.parent().unwrap(), Path::new(TEMP_DIR));
        let base = name.file_name().unwrap().to_str().unwrap();
        assert!(base.starts_with("pre") && base.ends_with(".suf"));
        assert_eq!(fs.stat(&name).unwrap().mode(), 0o600);
        assert_eq!(f.write(b"t").unwrap(), 1);

        fs.mkdir("/d", 0o755).unwrap();
        let dir = fs.mkdir_temp("/d", "x*").unwrap();
        assert_eq!(dir.parent().unwrap(), Path::new("/d"));
        let info = fs.stat(&dir).unwrap();
        assert!(info.is_dir());
        assert_eq!(info.mode(), 0o700);

        assert!(fs.create_temp("/missing", "x").is_err());
        assert!(fs.mkdir_temp("/d", "a/b").is_err());
    }

    #[test]
    fn read_write_file() {
        let fs = Volume::new();
        fs.write_file("/f", b"first version", 0o640).unwrap();
        fs.write_file("/f", b"second", 0o600).unwrap();
        assert_eq!(fs.read_file("/f").unwrap(), b"second");
        // write_file only applies the mode on creation.
        assert_eq!(fs.stat("/f").unwrap().mode(), 0o640);

        let mut f = fs.open("/f").unwrap();
        let mut s = String::new();
        f.read_to_string(&mut s).unwrap();
        assert_eq!(s, "second");
    }

    #[test]
    fn release() {
        let pool = Arc::new(BufferPool::new(16, 8));
        let fs = Config::new().pool(pool.clone()).root_mode(0o755).build();
        fs.mkdir_all("/a/b", 0o755).unwrap();
        fs.write_file("/a/f", b"abc", 0o644).unwrap();
        fs.write_file("/g", b"abc", 0o644).unwrap();
        let held = fs.open("/g").unwrap();
        fs.chdir("/a").unwrap();

        fs.release();
        assert_eq!(fs.cwd(), PathBuf::from("/"));
        assert!(fs.read_dir("/").unwrap().is_empty());
        assert_eq!(fs.stat("/").unwrap().mode(), 0o755);
        assert_eq!(pool.retained(), 1);

        let mut buf = [0u8; 3];
        assert_eq!(held.read_at(&mut buf, 0).unwrap(), 3);
        drop(held);
        assert_eq!(pool.retained(), 2);
    }

    #[test]
    fn clones_share_files() {
        let fs = Volume::new();
        let other = fs.clone();
        fs.write_file("/f", b"shared", 0o644).unwrap();
        assert_eq!(other.read_file("/f").unwrap(), b"shared");
    }
}
