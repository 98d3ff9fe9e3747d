//! Bidirectional folder <-> note index.
//!
//! The forward index (folder -> note) and the reverse index (note -> folder)
//! are only ever changed together, through the methods on [`RelationCache`],
//! so the mapping stays injective in both directions.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use thiserror::Error;

use crate::fs::{self, FileSystem};
use crate::path;
use crate::policy::{self, Resolution};
use crate::settings::Settings;

/// A folder paired with its folder note.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Relation {
    pub folder: String,
    pub note: String,
}

impl Relation {
    pub fn new(folder: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            note: note.into(),
        }
    }
}

/// A note can belong to at most one folder; the first pairing is kept.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{note} is already the folder note of '{existing}', not pairing it with '{rejected}'")]
pub struct RelationConflict {
    pub note: String,
    pub existing: String,
    pub rejected: String,
}

#[derive(Debug, Default)]
pub struct RelationCache {
    /// folder path -> note path
    notes_by_folder: HashMap<String, String>,
    /// note path -> folder path, always the exact inverse of `notes_by_folder`
    folders_by_note: HashMap<String, String>,
    /// Bumped on every effective mutation
    revision: u64,
}

impl RelationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached note of `folder`, without touching the vault.
    pub fn note_of(&self, folder: &str) -> Option<&str> {
        self.notes_by_folder.get(folder).map(String::as_str)
    }

    /// Cached folder of `note`, without touching the vault.
    pub fn folder_of(&self, note: &str) -> Option<&str> {
        self.folders_by_note.get(note).map(String::as_str)
    }

    /// Note of `folder`, resolving it against the vault on a cache miss.
    ///
    /// A miss resolves the expected path under the active policy and checks
    /// that the folder is a directory and the note a file. Hits are stored.
    pub async fn get<F>(&mut self, fs: &F, settings: &Settings, folder: &str) -> fs::Result<Option<String>>
    where
        F: FileSystem + ?Sized,
    {
        if let Some(note) = self.notes_by_folder.get(folder) {
            return Ok(Some(note.clone()));
        }

        let Resolution::Eligible(note) = policy::resolve_with(folder, settings) else {
            return Ok(None);
        };
        if !fs.is_dir(folder).await? || !fs.is_file(&note).await? {
            return Ok(None);
        }

        match self.put(folder, &note) {
            Ok(_) => Ok(Some(note)),
            Err(conflict) => {
                tracing::warn!("{}", conflict);
                Ok(None)
            }
        }
    }

    /// Folder of `note`, resolving it against the vault on a cache miss.
    pub async fn get_folder_of<F>(
        &mut self,
        fs: &F,
        settings: &Settings,
        note: &str,
    ) -> fs::Result<Option<String>>
    where
        F: FileSystem + ?Sized,
    {
        if let Some(folder) = self.folders_by_note.get(note) {
            return Ok(Some(folder.clone()));
        }

        let Some(folder) = policy::candidate_folder_with(note, settings) else {
            return Ok(None);
        };
        if self.notes_by_folder.contains_key(&folder) {
            // The folder is already paired with some other note
            return Ok(None);
        }
        if !fs.is_dir(&folder).await? || !fs.is_file(note).await? {
            return Ok(None);
        }

        self.put(&folder, note)
            .map(|_| Some(folder))
            .or_else(|conflict| {
                tracing::warn!("{}", conflict);
                Ok(None)
            })
    }

    /// Pair `folder` with `note`. Returns whether anything changed.
    ///
    /// A folder's previous note is unpaired. A note already paired with a
    /// different folder is rejected.
    pub fn put(&mut self, folder: &str, note: &str) -> Result<bool, RelationConflict> {
        if let Some(existing) = self.folders_by_note.get(note) {
            if existing == folder {
                return Ok(false);
            }
            return Err(RelationConflict {
                note: note.to_string(),
                existing: existing.clone(),
                rejected: folder.to_string(),
            });
        }

        if let Some(previous) = self.notes_by_folder.insert(folder.to_string(), note.to_string()) {
            self.folders_by_note.remove(&previous);
        }
        self.folders_by_note.insert(note.to_string(), folder.to_string());
        self.revision += 1;
        Ok(true)
    }

    /// Drop the relation held by `folder`.
    pub fn invalidate(&mut self, folder: &str) -> Option<Relation> {
        let note = self.notes_by_folder.remove(folder)?;
        self.folders_by_note.remove(&note);
        self.revision += 1;
        Some(Relation::new(folder, note))
    }

    /// Drop the relation held by `note`.
    pub fn invalidate_note(&mut self, note: &str) -> Option<Relation> {
        let folder = self.folders_by_note.remove(note)?;
        self.notes_by_folder.remove(&folder);
        self.revision += 1;
        Some(Relation::new(folder, note))
    }

    /// Drop every relation with a side at or beneath `root`.
    pub fn invalidate_subtree(&mut self, root: &str) -> Vec<Relation> {
        let affected: Vec<String> = self
            .notes_by_folder
            .iter()
            .filter(|(folder, note)| path::is_within(folder, root) || path::is_within(note, root))
            .map(|(folder, _)| folder.clone())
            .collect();

        let mut removed: Vec<Relation> = affected
            .iter()
            .filter_map(|folder| self.invalidate(folder))
            .collect();
        removed.sort();
        removed
    }

    /// Carry every relation with a side beneath `from` over to `to`, as a
    /// directory move does. Returns `(before, after)` pairs.
    pub fn rebase(&mut self, from: &str, to: &str) -> Vec<(Relation, Relation)> {
        let moved: Vec<Relation> = self
            .notes_by_folder
            .iter()
            .filter(|(folder, note)| path::is_within(folder, from) || path::is_within(note, from))
            .map(|(folder, note)| Relation::new(folder.as_str(), note.as_str()))
            .collect();

        for relation in &moved {
            self.notes_by_folder.remove(&relation.folder);
            self.folders_by_note.remove(&relation.note);
        }

        let mut pairs = Vec::with_capacity(moved.len());
        for before in moved {
            let after = Relation::new(
                path::rebase(&before.folder, from, to).unwrap_or_else(|| before.folder.clone()),
                path::rebase(&before.note, from, to).unwrap_or_else(|| before.note.clone()),
            );
            if let Err(conflict) = self.put(&after.folder, &after.note) {
                tracing::warn!("{}", conflict);
                continue;
            }
            pairs.push((before, after));
        }
        if !pairs.is_empty() {
            self.revision += 1;
        }
        pairs.sort();
        pairs
    }

    /// Rebuild both indices from a walk over every non-hidden folder.
    pub async fn recompute_all<F>(&mut self, fs: &F, settings: &Settings) -> fs::Result<usize>
    where
        F: FileSystem + ?Sized,
    {
        self.notes_by_folder.clear();
        self.folders_by_note.clear();
        self.revision += 1;

        self.populate_subtree(fs, settings, "").await?;

        tracing::info!(
            "Resolved {} folder note(s) under the '{}' policy",
            self.len(),
            settings.folder_note_pref.as_str()
        );
        Ok(self.len())
    }

    /// Pair `root` and every non-hidden folder beneath it with its note, if
    /// the note exists. Returns the relations that were not cached before.
    pub async fn populate_subtree<F>(
        &mut self,
        fs: &F,
        settings: &Settings,
        root: &str,
    ) -> fs::Result<Vec<Relation>>
    where
        F: FileSystem + ?Sized,
    {
        let mut added = Vec::new();
        let mut pending = vec![path::normalize(root)];
        while let Some(folder) = pending.pop() {
            let entries = fs.list(&folder).await?;
            for entry in entries.iter().filter(|e| e.is_dir && !e.name.starts_with('.')) {
                pending.push(path::join(&folder, &entry.name));
            }

            let Resolution::Eligible(note) = policy::resolve_with(&folder, settings) else {
                continue;
            };
            if !fs.is_file(&note).await? {
                continue;
            }
            match self.put(&folder, &note) {
                Ok(true) => added.push(Relation::new(folder.as_str(), note)),
                Ok(false) => {}
                Err(conflict) => tracing::warn!("{}", conflict),
            }
        }

        added.sort();
        Ok(added)
    }

    /// Forget everything (deactivation).
    pub fn clear(&mut self) {
        if !self.notes_by_folder.is_empty() {
            self.revision += 1;
        }
        self.notes_by_folder.clear();
        self.folders_by_note.clear();
    }

    /// Every note currently paired with a folder.
    pub fn notes(&self) -> BTreeSet<String> {
        self.folders_by_note.keys().cloned().collect()
    }

    /// All relations, sorted by folder.
    pub fn relations(&self) -> Vec<Relation> {
        let mut relations: Vec<Relation> = self
            .notes_by_folder
            .iter()
            .map(|(folder, note)| Relation::new(folder.as_str(), note.as_str()))
            .collect();
        relations.sort();
        relations
    }

    pub fn len(&self) -> usize {
        self.notes_by_folder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes_by_folder.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
