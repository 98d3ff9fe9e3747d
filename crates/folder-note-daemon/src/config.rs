//! Vault-local configuration: where the daemon keeps its files, and the
//! persisted [`Settings`].

use folder_note_core::Settings;
use std::io;
use std::path::{Path, PathBuf};

/// Daemon directory inside the vault. Dot-prefixed, so the engine never
/// treats it as a folder.
pub const CONFIG_DIR: &str = ".folder-note";

/// Vault-relative path of the settings file.
pub const SETTINGS_FILE: &str = ".folder-note/settings.json";

/// Vault-relative path of the hidden folder note list.
pub const HIDDEN_FILE: &str = ".folder-note/hidden.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Expand ~ or ~/ prefix to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}

/// Settings persisted as pretty JSON at [`SETTINGS_FILE`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(vault_path: &Path) -> Self {
        Self {
            path: vault_path.join(SETTINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings. A missing file yields the defaults; missing fields
    /// are filled from the defaults.
    pub async fn load(&self) -> Result<Settings, ConfigError> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No settings at {:?}, using defaults", self.path);
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        Settings::from_json(&json).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub async fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let json = settings.to_json()?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| ConfigError::Io {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!("Saved settings to {:?}", self.path);
        Ok(())
    }
}
