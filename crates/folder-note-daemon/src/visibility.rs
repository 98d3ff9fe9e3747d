//! Explorer visibility sink backed by a JSON file in the vault.

use folder_note_core::ExplorerVisibility;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, HIDDEN_FILE};

/// Writes the hidden folder note set to [`HIDDEN_FILE`] as a sorted JSON
/// array, for explorer integrations to pick up.
pub struct HiddenListFile {
    path: PathBuf,
}

impl HiddenListFile {
    pub fn new(vault_path: &Path) -> Self {
        Self {
            path: vault_path.join(HIDDEN_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back the last written set. A missing file is an empty set.
    pub fn read(&self) -> Result<BTreeSet<String>, ConfigError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, paths: &BTreeSet<String>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(paths)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl ExplorerVisibility for HiddenListFile {
    fn apply_hidden_set(&self, paths: &BTreeSet<String>) {
        match self.write(paths) {
            Ok(()) => tracing::debug!("Wrote {} hidden folder note(s)", paths.len()),
            Err(e) => tracing::error!("Failed to update hidden folder notes: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_sorted_array() {
        let dir = TempDir::new().unwrap();
        let sink = HiddenListFile::new(dir.path());
        let paths: BTreeSet<String> = ["B/B.md", "A/A.md"].iter().map(|s| s.to_string()).collect();

        sink.apply_hidden_set(&paths);

        let raw = std::fs::read_to_string(sink.path()).unwrap();
        let written: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(written, vec!["A/A.md", "B/B.md"]);
        assert_eq!(sink.read().unwrap(), paths);
    }

    #[test]
    fn test_empty_set_clears_file() {
        let dir = TempDir::new().unwrap();
        let sink = HiddenListFile::new(dir.path());
        assert!(sink.read().unwrap().is_empty());

        sink.apply_hidden_set(&["A/A.md".to_string()].into_iter().collect());
        sink.apply_hidden_set(&BTreeSet::new());
        assert!(sink.read().unwrap().is_empty());
    }
}
