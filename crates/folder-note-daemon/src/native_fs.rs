//! Native filesystem implementation using tokio::fs.

use async_trait::async_trait;
use folder_note_core::fs::{FileEntry, FileStat, FileSystem, FsError, Result};
use std::io;
use std::path::PathBuf;
use tokio::fs;

/// Native filesystem rooted at the vault directory
pub struct NativeFs {
    base_path: PathBuf,
}

impl NativeFs {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        let path = path.trim_matches('/');
        if path.is_empty() {
            self.base_path.clone()
        } else {
            self.base_path.join(path)
        }
    }
}

/// Map an io error on `path` to the vault error the engine branches on.
fn fs_error(path: &str, e: io::Error) -> FsError {
    match e.kind() {
        io::ErrorKind::NotFound => FsError::NotFound(path.to_string()),
        io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path.to_string()),
        io::ErrorKind::IsADirectory => FsError::IsDirectory(path.to_string()),
        io::ErrorKind::NotADirectory => FsError::NotDirectory(path.to_string()),
        _ => FsError::Io(format!("{}: {}", path, e)),
    }
}

#[async_trait]
impl FileSystem for NativeFs {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        fs::read(self.full_path(path))
            .await
            .map_err(|e| fs_error(path, e))
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        // Create parent directories if needed
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| fs_error(path, e))?;
        }

        fs::write(&full_path, content)
            .await
            .map_err(|e| fs_error(path, e))
    }

    async fn list(&self, path: &str) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(self.full_path(path))
            .await
            .map_err(|e| fs_error(path, e))?;

        while let Some(entry) = dir.next_entry().await.map_err(|e| fs_error(path, e))? {
            let name = entry.file_name().to_string_lossy().to_string();
            let metadata = entry.metadata().await.map_err(|e| fs_error(path, e))?;

            entries.push(FileEntry {
                name,
                is_dir: metadata.is_dir(),
            });
        }

        Ok(entries)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        let metadata = fs::metadata(&full_path)
            .await
            .map_err(|e| fs_error(path, e))?;

        let result = if metadata.is_dir() {
            fs::remove_dir(&full_path).await
        } else {
            fs::remove_file(&full_path).await
        };
        result.map_err(|e| fs_error(path, e))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        fs::try_exists(self.full_path(path))
            .await
            .map_err(|e| fs_error(path, e))
    }

    async fn stat(&self, path: &str) -> Result<FileStat> {
        let metadata = fs::metadata(self.full_path(path))
            .await
            .map_err(|e| fs_error(path, e))?;

        Ok(FileStat {
            size: metadata.len(),
            is_dir: metadata.is_dir(),
        })
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.full_path(path))
            .await
            .map_err(|e| fs_error(path, e))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let target = self.full_path(to);
        // fs::rename silently replaces files on unix
        if fs::try_exists(&target).await.map_err(|e| fs_error(to, e))? {
            return Err(FsError::AlreadyExists(to.to_string()));
        }
        fs::rename(self.full_path(from), &target)
            .await
            .map_err(|e| fs_error(from, e))
    }
}
