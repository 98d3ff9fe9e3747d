//! Engine: owns the relation cache and everything that keeps it in sync with a vault.
//!
//! Event routing lives in [`crate::router`], read-only queries in
//! [`crate::query`], and user-facing commands in [`crate::commands`]; they are
//! all `impl` blocks on [`Engine`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::actions::{ExplorerVisibility, VISIBILITY_DEBOUNCE, VisibilitySync};
use crate::cache::{Relation, RelationCache};
use crate::events::{EventBus, RelationEvent};
use crate::fs::{FileSystem, FsError};
use crate::pending::PendingOps;
use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),

    #[error("Folder '{folder}' cannot have a folder note under the '{policy}' policy")]
    Ineligible { folder: String, policy: &'static str },

    #[error("Not a folder: {0}")]
    NotAFolder(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Folder note relation engine over a vault `F`.
///
/// Every mutating call takes `&mut self`, so cache mutations are serialized
/// by construction. Hosts on a multi-threaded runtime share it behind a
/// single `tokio::sync::Mutex`.
pub struct Engine<F: FileSystem> {
    pub(crate) fs: F,
    pub(crate) settings: Settings,
    pub(crate) cache: RelationCache,
    pub(crate) pending: PendingOps,
    pub(crate) visibility: VisibilitySync,
    pub(crate) events: Arc<EventBus>,
}

impl<F: FileSystem> Engine<F> {
    /// Create an engine with an empty cache. Call [`Engine::on_workspace_ready`]
    /// once the vault has finished loading.
    pub fn new(fs: F, settings: Settings, visibility: Arc<dyn ExplorerVisibility>) -> Self {
        Self::with_debounce(fs, settings, visibility, VISIBILITY_DEBOUNCE)
    }

    pub fn with_debounce(
        fs: F,
        settings: Settings,
        visibility: Arc<dyn ExplorerVisibility>,
        debounce: Duration,
    ) -> Self {
        Self {
            fs,
            settings,
            cache: RelationCache::new(),
            pending: PendingOps::new(),
            visibility: VisibilitySync::new(visibility, debounce),
            events: Arc::new(EventBus::new()),
        }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &RelationCache {
        &self.cache
    }

    pub fn pending(&self) -> &PendingOps {
        &self.pending
    }

    /// Bus carrying [`RelationEvent`]s.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Full population pass, gated on the vault having finished loading.
    pub async fn on_workspace_ready(&mut self) -> Result<usize> {
        let count = self.cache.recompute_all(&self.fs, &self.settings).await?;
        self.visibility
            .refresh(&self.cache, self.settings.hide_note_in_explorer);
        Ok(count)
    }

    /// Swap in new settings.
    ///
    /// A policy or index name change makes every cached relation stale, so the
    /// cache is rebuilt. Existing notes are never moved.
    pub async fn apply_settings(&mut self, settings: Settings) -> Result<()> {
        let stale = self.settings.resolution_differs(&settings);
        let hide_toggled = self.settings.hide_note_in_explorer != settings.hide_note_in_explorer;
        self.settings = settings;

        if stale {
            tracing::info!(
                "Placement changed to '{}', rebuilding folder note relations",
                self.settings.folder_note_pref.as_str()
            );
            self.cache.recompute_all(&self.fs, &self.settings).await?;
        }
        if stale || hide_toggled {
            self.visibility
                .refresh(&self.cache, self.settings.hide_note_in_explorer);
        }
        Ok(())
    }

    /// Deactivate: reveal every hidden note, drop pending side effects and
    /// forget every relation.
    pub fn shutdown(&mut self) {
        self.visibility.sync(&self.cache, false);
        self.pending.clear();
        self.cache.clear();
        tracing::debug!("Folder note engine shut down");
    }

    pub(crate) fn emit_linked(&self, folder: &str, note: &str) {
        tracing::debug!("Linked {} -> {}", folder, note);
        self.events.emit(RelationEvent::Linked {
            folder: folder.to_string(),
            note: note.to_string(),
        });
    }

    pub(crate) fn emit_unlinked(&self, relation: Relation) {
        tracing::debug!("Unlinked {} -> {}", relation.folder, relation.note);
        self.events.emit(RelationEvent::Unlinked {
            folder: relation.folder,
            note: relation.note,
        });
    }

    /// Pair `folder` with `note`, logging (not failing) on a conflict.
    pub(crate) fn link(&mut self, folder: &str, note: &str) {
        match self.cache.put(folder, note) {
            Ok(true) => self.emit_linked(folder, note),
            Ok(false) => {}
            Err(conflict) => tracing::warn!("{}", conflict),
        }
    }

    /// Bring the hidden set in line with the cache.
    pub(crate) fn sync_visibility(&mut self) {
        self.visibility
            .sync(&self.cache, self.settings.hide_note_in_explorer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::RecordingVisibility;
    use crate::fs::InMemoryFs;
    use crate::settings::PlacementPolicy;
    use std::collections::BTreeSet;

    const WINDOW: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_workspace_ready_populates_and_hides() {
        let fs = InMemoryFs::new();
        fs.write("A/A.md", b"# A").await.unwrap();
        fs.write("B/B.md", b"# B").await.unwrap();
        fs.write("C/other.md", b"# C").await.unwrap();
        let sink = Arc::new(RecordingVisibility::new());
        let mut engine = Engine::with_debounce(fs, Settings::default(), sink.clone(), WINDOW);

        assert_eq!(engine.on_workspace_ready().await.unwrap(), 2);
        tokio::time::sleep(WINDOW * 5).await;

        let expected: BTreeSet<String> = ["A/A.md", "B/B.md"].iter().map(|s| s.to_string()).collect();
        assert_eq!(sink.current(), Some(expected));
    }

    #[tokio::test]
    async fn test_policy_change_recomputes_without_moving_notes() {
        let fs = InMemoryFs::new();
        fs.write("A/A.md", b"# A").await.unwrap();
        fs.write("A/_about_.md", b"# about").await.unwrap();
        let sink = Arc::new(RecordingVisibility::new());
        let mut engine = Engine::with_debounce(fs, Settings::default(), sink, WINDOW);
        engine.on_workspace_ready().await.unwrap();
        assert_eq!(engine.cache().note_of("A"), Some("A/A.md"));

        let settings = Settings {
            folder_note_pref: PlacementPolicy::IndexInside,
            ..Settings::default()
        };
        engine.apply_settings(settings).await.unwrap();

        assert_eq!(engine.cache().note_of("A"), Some("A/_about_.md"));
        assert!(engine.fs().is_file("A/A.md").await.unwrap());
    }

    #[tokio::test]
    async fn test_hide_toggle_off_clears_hidden_set() {
        let fs = InMemoryFs::new();
        fs.write("A/A.md", b"# A").await.unwrap();
        let sink = Arc::new(RecordingVisibility::new());
        let mut engine = Engine::with_debounce(fs, Settings::default(), sink.clone(), WINDOW);
        engine.on_workspace_ready().await.unwrap();
        tokio::time::sleep(WINDOW * 5).await;
        assert_eq!(sink.current().map(|s| s.len()), Some(1));

        let settings = Settings {
            hide_note_in_explorer: false,
            ..Settings::default()
        };
        engine.apply_settings(settings).await.unwrap();
        assert_eq!(sink.current(), Some(BTreeSet::new()));
    }

    #[tokio::test]
    async fn test_shutdown_reveals_hidden_notes() {
        let fs = InMemoryFs::new();
        fs.write("A/A.md", b"# A").await.unwrap();
        let sink = Arc::new(RecordingVisibility::new());
        let mut engine = Engine::with_debounce(fs, Settings::default(), sink.clone(), WINDOW);
        engine.on_workspace_ready().await.unwrap();
        tokio::time::sleep(WINDOW * 5).await;
        assert_eq!(sink.current().map(|s| s.len()), Some(1));

        engine.shutdown();
        assert!(engine.cache().is_empty());
        assert_eq!(sink.current(), Some(BTreeSet::new()));
    }

    #[tokio::test]
    async fn test_shutdown_before_first_apply_leaves_nothing_hidden() {
        let fs = InMemoryFs::new();
        fs.write("A/A.md", b"# A").await.unwrap();
        let sink = Arc::new(RecordingVisibility::new());
        let mut engine = Engine::with_debounce(fs, Settings::default(), sink.clone(), WINDOW);
        engine.on_workspace_ready().await.unwrap();

        engine.shutdown();
        tokio::time::sleep(WINDOW * 5).await;
        assert_eq!(sink.history(), vec![BTreeSet::new()]);
    }

    #[tokio::test]
    async fn test_shutdown_with_hiding_disabled_applies_nothing() {
        let fs = InMemoryFs::new();
        fs.write("A/A.md", b"# A").await.unwrap();
        let settings = Settings {
            hide_note_in_explorer: false,
            ..Settings::default()
        };
        let sink = Arc::new(RecordingVisibility::new());
        let mut engine = Engine::with_debounce(fs, settings, sink.clone(), WINDOW);
        engine.on_workspace_ready().await.unwrap();

        engine.shutdown();
        tokio::time::sleep(WINDOW * 5).await;
        assert!(sink.history().is_empty());
    }
}
