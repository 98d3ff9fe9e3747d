//! Read-side lookups for renderers and commands.
//!
//! Lookups go through the cache first and fall back to resolving against the
//! vault, storing what they find.

use crate::engine::{Engine, Result};
use crate::fs::FileSystem;
use crate::path;

impl<F: FileSystem> Engine<F> {
    /// Note of `folder`, if it has one.
    pub async fn note_of(&mut self, folder: &str) -> Result<Option<String>> {
        let folder = path::normalize(folder);
        Ok(self.cache.get(&self.fs, &self.settings, &folder).await?)
    }

    pub async fn has_note(&mut self, folder: &str) -> Result<bool> {
        Ok(self.note_of(folder).await?.is_some())
    }

    /// Folder that `note` is the folder note of, if any.
    pub async fn folder_of(&mut self, note: &str) -> Result<Option<String>> {
        let note = path::normalize(note);
        Ok(self.cache.get_folder_of(&self.fs, &self.settings, &note).await?)
    }

    pub async fn is_folder_note(&mut self, note: &str) -> Result<bool> {
        Ok(self.folder_of(note).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use crate::actions::NoVisibility;
    use crate::engine::Engine;
    use crate::fs::{FileSystem, InMemoryFs};
    use crate::settings::Settings;
    use std::sync::Arc;

    async fn engine() -> Engine<InMemoryFs> {
        let fs = InMemoryFs::new();
        fs.write("A/A.md", b"# A").await.unwrap();
        fs.write("A/notes.md", b"notes").await.unwrap();
        fs.mkdir("Empty").await.unwrap();
        Engine::new(fs, Settings::default(), Arc::new(NoVisibility))
    }

    #[tokio::test]
    async fn test_lookups_resolve_on_cold_cache() {
        let mut engine = engine().await;
        assert!(engine.cache().is_empty());

        assert_eq!(engine.note_of("/A/").await.unwrap().as_deref(), Some("A/A.md"));
        assert!(engine.has_note("A").await.unwrap());
        assert_eq!(engine.folder_of("/A/A.md").await.unwrap().as_deref(), Some("A"));
        assert!(engine.is_folder_note("A/A.md").await.unwrap());
        assert_eq!(engine.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_lookups_without_note() {
        let mut engine = engine().await;

        assert!(!engine.has_note("Empty").await.unwrap());
        assert!(!engine.has_note("Missing").await.unwrap());
        assert!(!engine.is_folder_note("A/notes.md").await.unwrap());
        assert_eq!(engine.folder_of("Loose.md").await.unwrap(), None);
    }
}
