//! Routing of vault change events into relation cache updates and sync actions.
//!
//! Events are handled one at a time, in the order the vault reports them.
//! A failure while handling one event is logged and the event dropped; it
//! never propagates to the host.

use crate::actions;
use crate::engine::{Engine, Result};
use crate::events::{RelationEvent, VaultEvent};
use crate::fs::FileSystem;
use crate::path;
use crate::pending::OpKind;
use crate::policy::{self, Resolution};

impl<F: FileSystem> Engine<F> {
    /// Route one vault event.
    pub async fn handle(&mut self, event: VaultEvent) {
        let outcome = match &event {
            VaultEvent::Created { path } => self.on_created(&path::normalize(path)).await,
            VaultEvent::Deleted { path } => {
                self.on_deleted(&path::normalize(path));
                Ok(())
            }
            VaultEvent::Renamed { from, to } => {
                self.on_renamed(&path::normalize(from), &path::normalize(to))
                    .await
            }
            // Content changes never affect which note belongs to which folder
            VaultEvent::Modified { .. } => Ok(()),
        };

        if let Err(e) = outcome {
            tracing::error!("Dropping vault event {:?}: {}", event, e);
        }
        self.sync_visibility();
    }

    async fn on_created(&mut self, path: &str) -> Result<()> {
        if path::is_hidden(path) {
            return Ok(());
        }
        match self.fs.kind(path).await? {
            // A folder moved in from outside the vault, or the new half of a
            // split rename, carries its notes and subfolders along
            Some(true) => self.link_subtree(path).await?,
            Some(false) => self.link_note(path).await?,
            None => tracing::debug!("Created path already gone: {}", path),
        }
        Ok(())
    }

    /// Pair every folder under `root` with its existing note.
    async fn link_subtree(&mut self, root: &str) -> Result<()> {
        let added = self.cache.populate_subtree(&self.fs, &self.settings, root).await?;
        for relation in added {
            self.emit_linked(&relation.folder, &relation.note);
        }
        Ok(())
    }

    /// Pair `note` with the folder it is the expected note of, if that folder exists.
    async fn link_note(&mut self, note: &str) -> Result<()> {
        let Some(folder) = policy::candidate_folder_with(note, &self.settings) else {
            return Ok(());
        };
        if self.fs.is_dir(&folder).await? {
            self.link(&folder, note);
        }
        Ok(())
    }

    /// Deleting a note orphans its folder; deleting a folder orphans its note
    /// (the note itself is left alone) and everything beneath it.
    fn on_deleted(&mut self, path: &str) {
        for relation in self.cache.invalidate_subtree(path) {
            self.emit_unlinked(relation);
        }
    }

    async fn on_renamed(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }

        if self.pending.consume(OpKind::Rename, from, to) {
            tracing::debug!("Engine-originated rename {} -> {}", from, to);
            // The cascade already recorded the relation; re-assert it in case
            // a user event in between dropped it.
            return self.link_note(to).await;
        }

        if path::is_hidden(to) {
            // Moved out of sight (e.g. into .trash)
            self.on_deleted(from);
            return Ok(());
        }

        match self.fs.kind(to).await? {
            Some(true) => self.on_folder_renamed(from, to).await,
            Some(false) => {
                self.on_note_renamed(from, to);
                self.link_note(to).await
            }
            None => {
                // Superseded by a later move; that event will carry the new location.
                if !self.fs.exists(from).await? {
                    self.on_deleted(from);
                }
                Ok(())
            }
        }
    }

    /// A note moved by the user away from its expected path loses its
    /// folder. It is never renamed back.
    fn on_note_renamed(&mut self, from: &str, to: &str) {
        if let Some(relation) = self.cache.invalidate_note(from) {
            tracing::info!(
                "{} moved to {}, folder '{}' no longer has a note",
                relation.note,
                to,
                relation.folder
            );
            self.emit_unlinked(relation);
        }
    }

    async fn on_folder_renamed(&mut self, from: &str, to: &str) -> Result<()> {
        // Relations inside the moved subtree travel with it
        for (before, after) in self.cache.rebase(from, to) {
            self.emit_unlinked(before);
            self.emit_linked(&after.folder, &after.note);
        }

        let current = match self.cache.note_of(to) {
            Some(note) => Some(note.to_string()),
            None => self.locate_moved_note(from, to).await?,
        };
        let Some(current) = current else {
            // Nothing travelled with the folder; it and its subfolders may
            // still have notes at their expected paths.
            return self.link_subtree(to).await;
        };

        match policy::resolve_with(to, &self.settings) {
            Resolution::Eligible(expected) if expected == current => {
                self.link(to, &expected);
            }
            Resolution::Eligible(expected) if actions::cascade_applies(&self.settings) => {
                self.cascade(to, &current, &expected).await;
            }
            _ => {
                tracing::info!(
                    "{} no longer matches the folder note path of '{}', unlinking",
                    current,
                    to
                );
                if let Some(relation) = self.cache.invalidate(to) {
                    self.emit_unlinked(relation);
                }
            }
        }
        Ok(())
    }

    /// Where the note of `from` ended up after the folder moved to `to`, if
    /// it was never cached: inside notes travel with the folder, outside
    /// notes stay put.
    async fn locate_moved_note(&self, from: &str, to: &str) -> Result<Option<String>> {
        let Some(old_note) = policy::resolve_with(from, &self.settings).into_path() else {
            return Ok(None);
        };
        let moved = path::rebase(&old_note, from, to).unwrap_or(old_note);
        if self.cache.folder_of(&moved).is_some() || !self.fs.is_file(&moved).await? {
            return Ok(None);
        }
        Ok(Some(moved))
    }

    /// Rename `folder`'s note from `current` to `expected`.
    ///
    /// On failure the relation stays on `current` (last known good) and the
    /// failure is reported as a warning; nothing is retried.
    async fn cascade(&mut self, folder: &str, current: &str, expected: &str) {
        if self.cache.note_of(folder) != Some(current) {
            if let Err(conflict) = self.cache.put(folder, current) {
                tracing::warn!("{}", conflict);
                return;
            }
        }

        match actions::rename_note(&self.fs, &mut self.pending, current, expected).await {
            Ok(()) => {
                tracing::info!("Auto-renamed folder note {} -> {}", current, expected);
                if let Some(relation) = self.cache.invalidate(folder) {
                    self.emit_unlinked(relation);
                }
                self.link(folder, expected);
            }
            Err(e) => {
                tracing::warn!(
                    "Auto-rename of {} to {} failed, keeping it as the note of '{}': {}",
                    current,
                    expected,
                    folder,
                    e
                );
                self.events.emit(RelationEvent::CascadeFailed {
                    folder: folder.to_string(),
                    note: current.to_string(),
                    target: expected.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
}
