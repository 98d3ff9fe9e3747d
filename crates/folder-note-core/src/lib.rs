//! folder-note-core: keeps folders paired with their folder notes.
//!
//! This crate provides:
//! - Placement policies and their pure resolution to note paths
//! - A bidirectional folder <-> note relation cache
//! - Routing of vault change events, including the auto-rename cascade
//! - Debounced explorer visibility of folder notes
//! - Queries, commands and folder listings on top of the cache
//! - The FileSystem trait abstraction over the vault

pub mod actions;
pub mod cache;
pub mod commands;
pub mod debounce;
pub mod engine;
pub mod events;
pub mod folderv;
pub mod fs;
pub mod path;
pub mod pending;
pub mod policy;
pub mod query;
pub mod router;
pub mod settings;

pub use actions::{ExplorerVisibility, NoVisibility, RecordingVisibility, VisibilitySync};
pub use cache::{Relation, RelationCache, RelationConflict};
pub use commands::NoteAction;
pub use engine::{Engine, EngineError};
pub use events::{EventBus, RelationEvent, Subscription, VaultEvent};
pub use folderv::FolderEntry;
pub use fs::{FileEntry, FileStat, FileSystem, FsError, InMemoryFs};
pub use pending::{OpKind, PendingOps};
pub use policy::Resolution;
pub use settings::{Modifier, PlacementPolicy, Settings};
