//! Side effects driven by relation changes: the auto-rename cascade and
//! explorer visibility of folder notes.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::RelationCache;
use crate::debounce::Debouncer;
use crate::fs::{self, FileSystem};
use crate::pending::{OpKind, PendingOps};
use crate::settings::Settings;

/// Default window for collapsing visibility updates.
pub const VISIBILITY_DEBOUNCE: Duration = Duration::from_millis(200);

/// True if a folder rename should drag its note's name along.
pub fn cascade_applies(settings: &Settings) -> bool {
    settings.auto_rename && settings.folder_note_pref.is_name_coupled()
}

/// Rename `note` to `target` as an engine-originated operation.
///
/// The rename is marked in `pending` before it is issued, so its echo from
/// the vault is recognized. On failure the mark is withdrawn.
pub async fn rename_note<F>(fs: &F, pending: &mut PendingOps, note: &str, target: &str) -> fs::Result<()>
where
    F: FileSystem + ?Sized,
{
    pending.mark(OpKind::Rename, note, target);
    if let Err(e) = fs.rename(note, target).await {
        pending.consume(OpKind::Rename, note, target);
        return Err(e);
    }
    Ok(())
}

/// Where hidden folder notes get applied.
///
/// This is the only seam between the engine and whatever renders the file
/// listing. Implementations report their own failures.
pub trait ExplorerVisibility: Send + Sync {
    /// Replace the hidden set with `paths`. An empty set unhides everything.
    fn apply_hidden_set(&self, paths: &BTreeSet<String>);
}

/// Visibility sink that ignores every update.
#[derive(Debug, Default)]
pub struct NoVisibility;

impl ExplorerVisibility for NoVisibility {
    fn apply_hidden_set(&self, _paths: &BTreeSet<String>) {}
}

/// Visibility sink that records every applied set (for tests and diagnostics).
#[derive(Debug, Default)]
pub struct RecordingVisibility {
    applied: Mutex<Vec<BTreeSet<String>>>,
}

impl RecordingVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every set applied so far, oldest first.
    pub fn history(&self) -> Vec<BTreeSet<String>> {
        self.applied.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The most recently applied set, if any.
    pub fn current(&self) -> Option<BTreeSet<String>> {
        self.applied
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

impl ExplorerVisibility for RecordingVisibility {
    fn apply_hidden_set(&self, paths: &BTreeSet<String>) {
        self.applied
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(paths.clone());
    }
}

/// Keeps the hidden set equal to the cache's notes while hiding is enabled.
pub struct VisibilitySync {
    sink: Arc<dyn ExplorerVisibility>,
    debouncer: Debouncer,
    /// Cache revision of the last scheduled apply
    synced_revision: Option<u64>,
    /// Whether a non-cleared set may currently be applied
    hiding: bool,
}

impl VisibilitySync {
    pub fn new(sink: Arc<dyn ExplorerVisibility>, delay: Duration) -> Self {
        Self {
            sink,
            debouncer: Debouncer::new(delay),
            synced_revision: None,
            hiding: false,
        }
    }

    /// Schedule an apply if the cache changed since the last one.
    ///
    /// With hiding disabled, a previously applied set is cleared immediately.
    pub fn sync(&mut self, cache: &RelationCache, enabled: bool) {
        if !enabled {
            self.synced_revision = None;
            if self.hiding {
                self.debouncer.cancel();
                self.sink.apply_hidden_set(&BTreeSet::new());
                self.hiding = false;
                tracing::debug!("Cleared hidden folder notes");
            }
            return;
        }

        if self.synced_revision == Some(cache.revision()) {
            return;
        }
        self.synced_revision = Some(cache.revision());
        self.hiding = true;

        let notes = cache.notes();
        let sink = Arc::clone(&self.sink);
        self.debouncer.schedule(move || {
            tracing::debug!("Hiding {} folder note(s)", notes.len());
            sink.apply_hidden_set(&notes);
        });
    }

    /// Schedule an apply even if the cache has not changed.
    pub fn refresh(&mut self, cache: &RelationCache, enabled: bool) {
        self.synced_revision = None;
        self.sync(cache, enabled);
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}
