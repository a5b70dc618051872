//! Filesystem primitives the pipeline is written against.
//!
//! Discovery, reading and summary creation only touch the disk through
//! [`FileSystem`], so a run can be pointed at [`MemoryFileSystem`] to inject
//! permission errors or special files that are awkward to produce on a real
//! disk.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// What a directory entry is, without following symbolic links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symbolic links, sockets, devices and anything else that is not a
    /// plain file or directory.
    Other,
}

/// One child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub name: OsString,
    pub kind: EntryKind,
}

pub trait FileSystem: Send + Sync {
    /// Returns true if `path` exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Lists the direct children of `path`, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<FsEntry>>;

    /// Opens `path` for reading. Callers bound their reads with [`Read::take`].
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send + '_>>;

    /// Creates or truncates `path` for writing.
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + Send + '_>>;
}

/// The real filesystem, through `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<FsEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            entries.push(FsEntry {
                name: entry.file_name(),
                kind,
            });
        }
        Ok(entries)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + Send + '_>> {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }
}

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Arc<Mutex<Vec<u8>>>),
    Special,
}

/// An in-memory tree. Parent directories are created implicitly.
///
/// ```
/// use codecollate::{FileSystem, MemoryFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.add_file("/proj/src/main.rs", "fn main() {}");
/// fs.deny("/proj/secret.rs");
/// assert!(fs.is_dir(Path::new("/proj/src")));
/// ```
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
    denied: RwLock<BTreeSet<PathBuf>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        self.add_parents(path);
        self.nodes_mut().insert(
            path.to_path_buf(),
            Node::File(Arc::new(Mutex::new(contents.into()))),
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.add_parents(path);
        self.nodes_mut().insert(path.to_path_buf(), Node::Dir);
    }

    /// Adds an entry that is neither a file nor a directory, like a symlink.
    pub fn add_special(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.add_parents(path);
        self.nodes_mut().insert(path.to_path_buf(), Node::Special);
    }

    /// Makes every later `read_dir`, `open` or `create` of `path` fail with
    /// `PermissionDenied`. The entry itself stays listed in its parent.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.denied
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.as_ref().to_path_buf());
    }

    /// Current bytes of the file at `path`, if there is one.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.nodes().get(path.as_ref()) {
            Some(Node::File(data)) => {
                Some(data.lock().unwrap_or_else(PoisonError::into_inner).clone())
            }
            _ => None,
        }
    }

    fn add_parents(&self, path: &Path) {
        let mut nodes = self.nodes_mut();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
    }

    fn check_access(&self, path: &Path) -> io::Result<()> {
        let denied = self.denied.read().unwrap_or_else(PoisonError::into_inner);
        if denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            ));
        }
        Ok(())
    }

    fn nodes(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<PathBuf, Node>> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn nodes_mut(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<PathBuf, Node>> {
        self.nodes.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

impl FileSystem for MemoryFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.nodes().get(path), Some(Node::Dir))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<FsEntry>> {
        self.check_access(path)?;
        let nodes = self.nodes();
        if !matches!(nodes.get(path), Some(Node::Dir)) {
            return Err(not_found(path));
        }
        Ok(nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .filter_map(|(child, node)| {
                let kind = match node {
                    Node::Dir => EntryKind::Dir,
                    Node::File(_) => EntryKind::File,
                    Node::Special => EntryKind::Other,
                };
                child.file_name().map(|name| FsEntry {
                    name: name.to_os_string(),
                    kind,
                })
            })
            .collect())
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send + '_>> {
        self.check_access(path)?;
        match self.nodes().get(path) {
            Some(Node::File(data)) => {
                let bytes = data.lock().unwrap_or_else(PoisonError::into_inner).clone();
                Ok(Box::new(Cursor::new(bytes)))
            }
            _ => Err(not_found(path)),
        }
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + Send + '_>> {
        self.check_access(path)?;
        let parent_is_dir = path
            .parent()
            .is_none_or(|parent| parent.as_os_str().is_empty() || self.is_dir(parent));
        if !parent_is_dir {
            return Err(not_found(path));
        }
        let data = Arc::new(Mutex::new(Vec::new()));
        self.nodes_mut()
            .insert(path.to_path_buf(), Node::File(Arc::clone(&data)));
        Ok(Box::new(MemoryWriter { data }))
    }
}

struct MemoryWriter {
    data: Arc<Mutex<Vec<u8>>>,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
