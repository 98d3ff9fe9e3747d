//! The daemon: an engine over the native vault plus its settings store.

use anyhow::Result;
use folder_note_core::{Engine, ExplorerVisibility, VaultEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{SETTINGS_FILE, SettingsStore};
use crate::native_fs::NativeFs;

/// Daemon state holding all components.
pub struct Daemon {
    /// Relation engine over the vault
    engine: Engine<NativeFs>,
    /// Where settings are loaded from and saved to
    store: SettingsStore,
    vault_path: PathBuf,
}

impl Daemon {
    /// Open the vault at `vault_path`, loading its settings.
    ///
    /// The cache starts empty; call [`Daemon::ready`] before routing events.
    pub async fn open(vault_path: PathBuf, visibility: Arc<dyn ExplorerVisibility>) -> Result<Self> {
        if !vault_path.is_dir() {
            anyhow::bail!("Vault directory not found: {:?}", vault_path);
        }
        let store = SettingsStore::new(&vault_path);
        let settings = store.load().await?;
        let engine = Engine::new(NativeFs::new(vault_path.clone()), settings, visibility);

        Ok(Self {
            engine,
            store,
            vault_path,
        })
    }

    /// Populate the relation cache from the vault.
    pub async fn ready(&mut self) -> Result<usize> {
        let count = self.engine.on_workspace_ready().await?;
        info!("Found {} folder note(s) in {:?}", count, self.vault_path);
        Ok(count)
    }

    pub fn engine(&mut self) -> &mut Engine<NativeFs> {
        &mut self.engine
    }

    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }

    /// Handle an event from the watcher.
    ///
    /// Changes to the settings file reload the settings; everything else
    /// goes to the engine.
    pub async fn on_vault_event(&mut self, event: VaultEvent) {
        if touches_settings(&event) {
            self.reload_settings().await;
            return;
        }
        self.engine.handle(event).await;
    }

    /// Reload settings from disk. An unreadable file keeps the current settings.
    pub async fn reload_settings(&mut self) {
        let settings = match self.store.load().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Keeping current settings: {}", e);
                return;
            }
        };
        if &settings == self.engine.settings() {
            return;
        }
        info!("Settings changed, applying");
        if let Err(e) = self.engine.apply_settings(settings).await {
            warn!("Failed to apply settings: {}", e);
        }
    }

    /// Reveal hidden notes and drop pending side effects before exit.
    pub fn shutdown(&mut self) {
        self.engine.shutdown();
    }
}

fn touches_settings(event: &VaultEvent) -> bool {
    match event {
        VaultEvent::Created { path } | VaultEvent::Modified { path } => path == SETTINGS_FILE,
        VaultEvent::Renamed { to, .. } => to == SETTINGS_FILE,
        // Deleting the file leaves the current settings in place
        VaultEvent::Deleted { .. } => false,
    }
}
