//! Folder overview listing: a folder's children with its own note flagged.

use serde::Serialize;

use crate::engine::{Engine, EngineError, Result};
use crate::fs::FileSystem;
use crate::path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntry {
    pub name: String,
    /// Vault-relative path
    pub path: String,
    pub is_dir: bool,
    /// True for the listed folder's own note
    pub is_folder_note: bool,
}

impl<F: FileSystem> Engine<F> {
    /// Children of `folder`, folders first, then by name. Hidden entries are
    /// skipped. The folder's own note is left out unless `include_note`.
    pub async fn list_folder(&mut self, folder: &str, include_note: bool) -> Result<Vec<FolderEntry>> {
        let folder = path::normalize(folder);
        if !self.fs.is_dir(&folder).await? {
            return Err(EngineError::NotAFolder(folder));
        }
        let own_note = self.cache.get(&self.fs, &self.settings, &folder).await?;

        let mut entries: Vec<FolderEntry> = self
            .fs
            .list(&folder)
            .await?
            .into_iter()
            .filter(|entry| !entry.name.starts_with('.'))
            .map(|entry| {
                let path = path::join(&folder, &entry.name);
                FolderEntry {
                    is_folder_note: own_note.as_deref() == Some(path.as_str()),
                    name: entry.name,
                    path,
                    is_dir: entry.is_dir,
                }
            })
            .filter(|entry| include_note || !entry.is_folder_note)
            .collect();

        entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }
}
