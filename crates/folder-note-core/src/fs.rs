//! FileSystem trait abstraction over the vault.
//!
//! Implementations:
//! - `InMemoryFs` - For testing
//! - `NativeFs` (in folder-note-daemon) - Uses tokio::fs
//!
//! All paths are vault-relative (see [`crate::path`]).

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;
use thiserror::Error;

use crate::path;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Is a directory: {0}")]
    IsDirectory(String),

    #[error("Not a directory: {0}")]
    NotDirectory(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, FsError>;

/// File metadata
#[derive(Debug, Clone)]
pub struct FileStat {
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
}

/// Directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File or directory name (not full path)
    pub name: String,
    /// Whether this is a directory
    pub is_dir: bool,
}

/// Vault storage seen by the relation engine.
///
/// Implementations must be `Send + Sync` so the engine can live inside a
/// multi-threaded Tokio runtime.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Read file contents
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Write file contents (creates parent directories if needed)
    async fn write(&self, path: &str, content: &[u8]) -> Result<()>;

    /// List directory contents
    async fn list(&self, path: &str) -> Result<Vec<FileEntry>>;

    /// Delete file or empty directory
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check if path exists
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Get file metadata
    async fn stat(&self, path: &str) -> Result<FileStat>;

    /// Create directory (and parents if needed)
    async fn mkdir(&self, path: &str) -> Result<()>;

    /// Move a file or directory. Fails with `AlreadyExists` if `to` is taken.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// `Some(is_dir)` if the path exists, `None` otherwise.
    async fn kind(&self, path: &str) -> Result<Option<bool>> {
        match self.stat(path).await {
            Ok(stat) => Ok(Some(stat.is_dir)),
            Err(FsError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn is_dir(&self, path: &str) -> Result<bool> {
        Ok(self.kind(path).await? == Some(true))
    }

    async fn is_file(&self, path: &str) -> Result<bool> {
        Ok(self.kind(path).await? == Some(false))
    }
}

#[derive(Default)]
struct Tree {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

impl Tree {
    fn contains(&self, path: &str) -> bool {
        path.is_empty() || self.files.contains_key(path) || self.dirs.contains(path)
    }

    fn mkdir_all(&mut self, path: &str) {
        let mut current = Some(path);
        while let Some(dir) = current {
            if dir.is_empty() {
                break;
            }
            self.dirs.insert(dir.to_string());
            current = path::parent(dir);
        }
    }
}

/// In-memory filesystem for testing
#[derive(Default)]
pub struct InMemoryFs {
    tree: RwLock<Tree>,
}

impl InMemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_tree(&self) -> std::sync::RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_tree(&self) -> std::sync::RwLockWriteGuard<'_, Tree> {
        self.tree.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl FileSystem for InMemoryFs {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = path::normalize(path);
        let tree = self.read_tree();
        if tree.dirs.contains(&path) {
            return Err(FsError::IsDirectory(path));
        }
        tree.files
            .get(&path)
            .cloned()
            .ok_or(FsError::NotFound(path))
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        let path = path::normalize(path);
        let mut tree = self.write_tree();
        if tree.dirs.contains(&path) {
            return Err(FsError::IsDirectory(path));
        }
        if let Some(parent) = path::parent(&path) {
            if tree.files.contains_key(parent) {
                return Err(FsError::NotDirectory(parent.to_string()));
            }
            tree.mkdir_all(parent);
        }
        tree.files.insert(path, content.to_vec());
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Vec<FileEntry>> {
        let path = path::normalize(path);
        let tree = self.read_tree();
        if tree.files.contains_key(&path) {
            return Err(FsError::NotDirectory(path));
        }
        if !tree.contains(&path) {
            return Err(FsError::NotFound(path));
        }

        let is_child = |candidate: &str| {
            candidate != path && path::parent(candidate) == Some(path.as_str())
        };
        let dirs = tree.dirs.iter().filter(|d| is_child(d.as_str())).map(|d| FileEntry {
            name: path::base_name(d).to_string(),
            is_dir: true,
        });
        let files = tree.files.keys().filter(|f| is_child(f.as_str())).map(|f| FileEntry {
            name: path::base_name(f).to_string(),
            is_dir: false,
        });
        Ok(dirs.chain(files).collect())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let path = path::normalize(path);
        let mut tree = self.write_tree();

        if tree.files.remove(&path).is_some() {
            return Ok(());
        }

        if tree.dirs.contains(&path) {
            let occupied = tree.files.keys().any(|f| path::parent(f) == Some(path.as_str()))
                || tree.dirs.iter().any(|d| path::parent(d) == Some(path.as_str()));
            if occupied {
                return Err(FsError::Io(format!("Directory not empty: {}", path)));
            }
            tree.dirs.remove(&path);
            return Ok(());
        }

        Err(FsError::NotFound(path))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let path = path::normalize(path);
        Ok(self.read_tree().contains(&path))
    }

    async fn stat(&self, path: &str) -> Result<FileStat> {
        let path = path::normalize(path);
        let tree = self.read_tree();

        if let Some(content) = tree.files.get(&path) {
            return Ok(FileStat {
                size: content.len() as u64,
                is_dir: false,
            });
        }
        if path.is_empty() || tree.dirs.contains(&path) {
            return Ok(FileStat { size: 0, is_dir: true });
        }

        Err(FsError::NotFound(path))
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let path = path::normalize(path);
        let mut tree = self.write_tree();
        if tree.files.contains_key(&path) {
            return Err(FsError::AlreadyExists(path));
        }
        tree.mkdir_all(&path);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = path::normalize(from);
        let to = path::normalize(to);
        let mut tree = self.write_tree();

        if from.is_empty() || !tree.contains(&from) {
            return Err(FsError::NotFound(from));
        }
        if tree.contains(&to) {
            return Err(FsError::AlreadyExists(to));
        }
        let parent = path::parent(&to).unwrap_or_default();
        if !tree.dirs.contains(parent) && !parent.is_empty() {
            return Err(FsError::NotFound(parent.to_string()));
        }

        if let Some(content) = tree.files.remove(&from) {
            tree.files.insert(to, content);
            return Ok(());
        }

        if path::is_within(&to, &from) {
            return Err(FsError::Io(format!("Cannot move {} into itself", from)));
        }
        let moved_dirs: Vec<String> = tree
            .dirs
            .iter()
            .filter(|d| path::is_within(d, &from))
            .cloned()
            .collect();
        for dir in moved_dirs {
            tree.dirs.remove(&dir);
            if let Some(rebased) = path::rebase(&dir, &from, &to) {
                tree.dirs.insert(rebased);
            }
        }
        let moved_files: Vec<String> = tree
            .files
            .keys()
            .filter(|f| path::is_within(f, &from))
            .cloned()
            .collect();
        for file in moved_files {
            if let (Some(content), Some(rebased)) =
                (tree.files.remove(&file), path::rebase(&file, &from, &to))
            {
                tree.files.insert(rebased, content);
            }
        }
        Ok(())
    }
}

// Lets tests keep a handle on the filesystem the engine owns.
#[async_trait]
impl<T: FileSystem + ?Sized> FileSystem for std::sync::Arc<T> {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        (**self).read(path).await
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        (**self).write(path, content).await
    }

    async fn list(&self, path: &str) -> Result<Vec<FileEntry>> {
        (**self).list(path).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        (**self).exists(path).await
    }

    async fn stat(&self, path: &str) -> Result<FileStat> {
        (**self).stat(path).await
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        (**self).mkdir(path).await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        (**self).rename(from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inmemory_fs_basic_operations() {
        let fs = InMemoryFs::new();

        fs.write("test.md", b"hello world").await.unwrap();
        assert_eq!(fs.read("test.md").await.unwrap(), b"hello world");

        assert!(fs.exists("test.md").await.unwrap());
        assert!(!fs.exists("nonexistent.md").await.unwrap());

        fs.delete("test.md").await.unwrap();
        assert!(!fs.exists("test.md").await.unwrap());
    }

    #[tokio::test]
    async fn test_inmemory_fs_directories() {
        let fs = InMemoryFs::new();

        // Write creates parent directories
        fs.write("a/b/c.md", b"content").await.unwrap();
        assert!(fs.is_dir("a").await.unwrap());
        assert!(fs.is_dir("a/b").await.unwrap());
        assert!(fs.is_file("a/b/c.md").await.unwrap());

        let entries = fs.list("a").await.unwrap();
        assert_eq!(
            entries,
            vec![FileEntry {
                name: "b".into(),
                is_dir: true
            }]
        );

        let root = fs.list("").await.unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].name, "a");
    }

    #[tokio::test]
    async fn test_rename_directory_moves_contents() {
        let fs = InMemoryFs::new();
        fs.write("A/A.md", b"# A").await.unwrap();
        fs.write("A/sub/x.md", b"x").await.unwrap();

        fs.rename("A", "B").await.unwrap();

        assert!(!fs.exists("A").await.unwrap());
        assert!(fs.is_file("B/A.md").await.unwrap());
        assert!(fs.is_file("B/sub/x.md").await.unwrap());
        assert!(fs.is_dir("B/sub").await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_refuses_existing_target() {
        let fs = InMemoryFs::new();
        fs.write("A/A.md", b"one").await.unwrap();
        fs.write("A/B.md", b"two").await.unwrap();

        let err = fs.rename("A/A.md", "A/B.md").await.unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists(_)));
        assert_eq!(fs.read("A/A.md").await.unwrap(), b"one");
    }

    #[tokio::test]
    async fn test_delete_refuses_non_empty_directory() {
        let fs = InMemoryFs::new();
        fs.write("A/A.md", b"x").await.unwrap();
        assert!(fs.delete("A").await.is_err());
        fs.delete("A/A.md").await.unwrap();
        fs.delete("A").await.unwrap();
        assert!(!fs.exists("A").await.unwrap());
    }
}
