//! File watcher producing typed vault events.
//!
//! Uses raw notify events rather than a debouncer: the relation engine needs
//! renames as (from, to) pairs, which debounced events do not carry.

use anyhow::Result;
use folder_note_core::{VaultEvent, path};
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::config::SETTINGS_FILE;

/// File watcher that monitors the vault directory.
pub struct FileWatcher {
    /// Vault base path
    vault_path: PathBuf,
    /// Watcher handle (must keep alive)
    _watcher: RecommendedWatcher,
    /// Receiver for vault events
    event_rx: mpsc::UnboundedReceiver<VaultEvent>,
}

impl FileWatcher {
    /// Create a new file watcher for the vault.
    pub fn new(vault_path: PathBuf) -> Result<Self> {
        // Canonicalize the path to resolve symlinks. On macOS, /var/folders/...
        // is actually /private/var/folders/..., and FSEvents needs the real path.
        let vault_path = vault_path.canonicalize().unwrap_or(vault_path);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let vault_path_clone = vault_path.clone();

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    for vault_event in map_event(&event, &vault_path_clone) {
                        debug!("Vault event: {:?}", vault_event);
                        if event_tx.send(vault_event).is_err() {
                            // Receiver dropped
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!("File watcher error: {}", e);
                }
            }
        })?;

        watcher.watch(&vault_path, RecursiveMode::Recursive)?;

        Ok(Self {
            vault_path,
            _watcher: watcher,
            event_rx,
        })
    }

    /// Get the receiver for vault events.
    pub fn event_rx(&mut self) -> &mut mpsc::UnboundedReceiver<VaultEvent> {
        &mut self.event_rx
    }

    /// Get the vault path.
    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }
}

/// Translate one notify event into vault events.
///
/// Paired renames become `Renamed`. A lone rename half (the other side is
/// outside the vault, or the backend does not pair them) becomes `Created`
/// or `Deleted` depending on whether the path still exists. Hidden paths
/// are dropped, except the settings file.
pub fn map_event(event: &Event, vault_path: &Path) -> Vec<VaultEvent> {
    let relative_paths = move || event.paths.iter().filter_map(move |p| relative(vault_path, p));

    let events: Vec<VaultEvent> = match event.kind {
        EventKind::Create(_) => relative_paths().map(|p| VaultEvent::created(&p)).collect(),
        EventKind::Remove(_) => relative_paths().map(|p| VaultEvent::deleted(&p)).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let from = event.paths.first().and_then(|p| relative(vault_path, p));
            let to = event.paths.get(1).and_then(|p| relative(vault_path, p));
            match (from, to) {
                (Some(from), Some(to)) => vec![VaultEvent::renamed(&from, &to)],
                // Moved in from outside the vault
                (None, Some(to)) => vec![VaultEvent::created(&to)],
                // Moved out of the vault
                (Some(from), None) => vec![VaultEvent::deleted(&from)],
                (None, None) => Vec::new(),
            }
        }
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .filter_map(|p| {
                let rel = relative(vault_path, p)?;
                Some(if p.exists() {
                    VaultEvent::created(&rel)
                } else {
                    VaultEvent::deleted(&rel)
                })
            })
            .collect(),
        EventKind::Modify(_) => relative_paths().map(|p| VaultEvent::modified(&p)).collect(),
        _ => Vec::new(),
    };

    events.into_iter().filter(is_relevant).collect()
}

/// Vault-relative, `/`-separated form of `path`, or `None` outside the vault.
fn relative(vault_path: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(vault_path).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    if parts.is_empty() {
        // The vault root itself
        return None;
    }
    Some(parts.join("/"))
}

fn is_visible(rel: &str) -> bool {
    rel == SETTINGS_FILE || !path::is_hidden(rel)
}

fn is_relevant(event: &VaultEvent) -> bool {
    match event {
        VaultEvent::Created { path: rel }
        | VaultEvent::Deleted { path: rel }
        | VaultEvent::Modified { path: rel } => is_visible(rel),
        VaultEvent::Renamed { from, to } => is_visible(from) || is_visible(to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use tempfile::TempDir;

    fn vault() -> PathBuf {
        PathBuf::from("/vault")
    }

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, p| event.add_path(PathBuf::from(p)))
    }

    #[test]
    fn test_maps_create_remove_and_modify() {
        assert_eq!(
            map_event(&event(EventKind::Create(CreateKind::Folder), &["/vault/A"]), &vault()),
            vec![VaultEvent::created("A")]
        );
        assert_eq!(
            map_event(&event(EventKind::Remove(RemoveKind::File), &["/vault/A/A.md"]), &vault()),
            vec![VaultEvent::deleted("A/A.md")]
        );
        assert_eq!(
            map_event(
                &event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &["/vault/A/A.md"]),
                &vault()
            ),
            vec![VaultEvent::modified("A/A.md")]
        );
    }

    #[test]
    fn test_maps_paired_rename() {
        let both = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/vault/A", "/vault/Projects/B"],
        );
        assert_eq!(map_event(&both, &vault()), vec![VaultEvent::renamed("A", "Projects/B")]);

        let moved_out = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/vault/A", "/elsewhere/A"],
        );
        assert_eq!(map_event(&moved_out, &vault()), vec![VaultEvent::deleted("A")]);
    }

    #[test]
    fn test_lone_rename_half_checks_existence() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Here")).unwrap();
        let half = |name: &str| {
            Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any)))
                .add_path(dir.path().join(name))
        };

        assert_eq!(map_event(&half("Here"), dir.path()), vec![VaultEvent::created("Here")]);
        assert_eq!(map_event(&half("Gone"), dir.path()), vec![VaultEvent::deleted("Gone")]);
    }

    #[test]
    fn test_hidden_paths_are_dropped_except_settings() {
        let hidden = event(EventKind::Create(CreateKind::File), &["/vault/.obsidian/app.json"]);
        assert!(map_event(&hidden, &vault()).is_empty());

        let own_list = event(EventKind::Create(CreateKind::File), &["/vault/.folder-note/hidden.json"]);
        assert!(map_event(&own_list, &vault()).is_empty());

        let settings = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Any)),
            &["/vault/.folder-note/settings.json"],
        );
        assert_eq!(
            map_event(&settings, &vault()),
            vec![VaultEvent::modified(SETTINGS_FILE)]
        );

        // Atomic save through a temp file
        let saved = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/vault/.folder-note/settings.json.tmp", "/vault/.folder-note/settings.json"],
        );
        assert_eq!(
            map_event(&saved, &vault()),
            vec![VaultEvent::renamed(".folder-note/settings.json.tmp", SETTINGS_FILE)]
        );
    }

    #[test]
    fn test_vault_root_and_outside_paths_are_dropped() {
        let root = event(EventKind::Modify(ModifyKind::Any), &["/vault"]);
        assert!(map_event(&root, &vault()).is_empty());

        let outside = event(EventKind::Create(CreateKind::File), &["/other/A.md"]);
        assert!(map_event(&outside, &vault()).is_empty());
    }
}
