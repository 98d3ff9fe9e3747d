//! folder-note-daemon library: Exposes internal modules for testing.
//!
//! This is a thin library layer over the daemon components,
//! allowing integration tests to access internal types.

pub mod config;
pub mod daemon;
pub mod native_fs;
pub mod visibility;
pub mod watcher;

// Re-export key types for convenience
pub use config::{ConfigError, SettingsStore};
pub use daemon::Daemon;
pub use native_fs::NativeFs;
pub use visibility::HiddenListFile;
pub use watcher::FileWatcher;
