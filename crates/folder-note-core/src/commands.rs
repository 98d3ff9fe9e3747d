//! User-facing commands: open-or-create a folder's note, reveal a note's folder.

use crate::engine::{Engine, EngineError, Result};
use crate::fs::{FileSystem, FsError};
use crate::path;
use crate::policy::{self, Resolution};

/// What [`Engine::open_or_create_note`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteAction {
    /// The folder already had this note.
    Existing(String),
    /// A note was synthesized from the template at this path.
    Created(String),
}

impl NoteAction {
    pub fn path(&self) -> &str {
        match self {
            NoteAction::Existing(path) | NoteAction::Created(path) => path,
        }
    }
}

impl<F: FileSystem> Engine<F> {
    /// Return the note of `folder`, creating it from the template if missing.
    pub async fn open_or_create_note(&mut self, folder: &str) -> Result<NoteAction> {
        let folder = path::normalize(folder);
        if !self.fs.is_dir(&folder).await? {
            return Err(EngineError::NotAFolder(folder));
        }
        if let Some(note) = self.cache.get(&self.fs, &self.settings, &folder).await? {
            return Ok(NoteAction::Existing(note));
        }

        let Resolution::Eligible(note) = policy::resolve_with(&folder, &self.settings) else {
            return Err(EngineError::Ineligible {
                folder,
                policy: self.settings.folder_note_pref.as_str(),
            });
        };
        // Something that is not a usable note (a directory, say) is squatting the path
        if self.fs.exists(&note).await? {
            return Err(FsError::AlreadyExists(note).into());
        }

        let body = self
            .settings
            .render_template(path::base_name(&folder), &folder);
        self.fs.write(&note, body.as_bytes()).await?;
        tracing::info!("Created folder note {}", note);

        self.link(&folder, &note);
        self.sync_visibility();
        Ok(NoteAction::Created(note))
    }

    /// Folder that `note` belongs to, for jumping from a note to its folder.
    pub async fn reveal_folder(&mut self, note: &str) -> Result<Option<String>> {
        self.folder_of(note).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::NoVisibility;
    use crate::fs::InMemoryFs;
    use crate::settings::{PlacementPolicy, Settings};
    use std::sync::Arc;

    fn engine(fs: InMemoryFs, policy: PlacementPolicy) -> Engine<InMemoryFs> {
        let settings = Settings {
            folder_note_pref: policy,
            folder_note_template: "# {{FOLDER_NAME}}\n\nIn {{FOLDER_PATH}}".into(),
            ..Settings::default()
        };
        Engine::new(fs, settings, Arc::new(NoVisibility))
    }

    #[tokio::test]
    async fn test_creates_note_from_template() {
        let fs = InMemoryFs::new();
        fs.mkdir("Projects/Alpha").await.unwrap();
        let mut engine = engine(fs, PlacementPolicy::SameNameInside);

        let action = engine.open_or_create_note("/Projects/Alpha").await.unwrap();
        assert_eq!(action, NoteAction::Created("Projects/Alpha/Alpha.md".into()));
        assert_eq!(
            engine.fs().read("Projects/Alpha/Alpha.md").await.unwrap(),
            b"# Alpha\n\nIn Projects/Alpha"
        );
        assert_eq!(engine.cache().note_of("Projects/Alpha"), Some("Projects/Alpha/Alpha.md"));

        let again = engine.open_or_create_note("Projects/Alpha").await.unwrap();
        assert_eq!(again, NoteAction::Existing("Projects/Alpha/Alpha.md".into()));
    }

    #[tokio::test]
    async fn test_outside_policy_creates_sibling_note() {
        let fs = InMemoryFs::new();
        fs.mkdir("Work/A").await.unwrap();
        let mut engine = engine(fs, PlacementPolicy::SameNameOutside);

        let action = engine.open_or_create_note("Work/A").await.unwrap();
        assert_eq!(action.path(), "Work/A.md");
        assert_eq!(engine.reveal_folder("Work/A.md").await.unwrap().as_deref(), Some("Work/A"));
    }

    #[tokio::test]
    async fn test_root_is_ineligible_under_same_name_policy() {
        let mut engine = engine(InMemoryFs::new(), PlacementPolicy::SameNameOutside);

        let err = engine.open_or_create_note("").await.unwrap_err();
        assert!(matches!(err, EngineError::Ineligible { policy: "outside", .. }));
    }

    #[tokio::test]
    async fn test_missing_folder_is_rejected() {
        let mut engine = engine(InMemoryFs::new(), PlacementPolicy::SameNameInside);

        let err = engine.open_or_create_note("Nope").await.unwrap_err();
        assert!(matches!(err, EngineError::NotAFolder(folder) if folder == "Nope"));
    }

    #[tokio::test]
    async fn test_occupied_note_path_is_not_overwritten() {
        let fs = InMemoryFs::new();
        fs.mkdir("A/A.md").await.unwrap();
        let mut engine = engine(fs, PlacementPolicy::SameNameInside);

        let err = engine.open_or_create_note("A").await.unwrap_err();
        assert!(matches!(err, EngineError::Fs(FsError::AlreadyExists(_))));
        assert!(engine.cache().is_empty());
    }

    #[tokio::test]
    async fn test_reveal_folder_of_plain_note() {
        let fs = InMemoryFs::new();
        fs.write("A/notes.md", b"notes").await.unwrap();
        let mut engine = engine(fs, PlacementPolicy::SameNameInside);

        assert_eq!(engine.reveal_folder("A/notes.md").await.unwrap(), None);
    }
}
