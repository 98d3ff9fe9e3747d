//! Event types flowing into and out of the relation engine.
//!
//! - `VaultEvent`: typed change notifications from the vault, routed by
//!   [`crate::Engine::handle`].
//! - `RelationEvent`: emitted on the engine's `EventBus` whenever a folder
//!   gains, loses, or moves its note, for observers such as renderers.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

use crate::path;

/// A change reported by the vault. Paths are vault-relative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VaultEvent {
    Created { path: String },
    Deleted { path: String },
    Renamed {
        from: String,
        to: String,
    },
    Modified { path: String },
}

impl VaultEvent {
    pub fn created(path: &str) -> Self {
        VaultEvent::Created {
            path: path::normalize(path),
        }
    }

    pub fn deleted(path: &str) -> Self {
        VaultEvent::Deleted {
            path: path::normalize(path),
        }
    }

    pub fn renamed(from: &str, to: &str) -> Self {
        VaultEvent::Renamed {
            from: path::normalize(from),
            to: path::normalize(to),
        }
    }

    pub fn modified(path: &str) -> Self {
        VaultEvent::Modified {
            path: path::normalize(path),
        }
    }
}

/// Relation changes emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RelationEvent {
    /// A folder was paired with its note.
    Linked { folder: String, note: String },
    /// A folder lost its note (note deleted, moved away, or folder gone).
    Unlinked { folder: String, note: String },
    /// The auto-rename cascade could not rename the note.
    CascadeFailed {
        folder: String,
        note: String,
        target: String,
        reason: String,
    },
}

/// Subscription handle that unsubscribes automatically when dropped.
///
/// Follows the disposer pattern: hold this value to keep receiving events,
/// drop it (or let it go out of scope) to unsubscribe.
pub struct Subscription {
    bus: Weak<EventBus>,
    id: usize,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }
}

type Callback = Arc<dyn Fn(RelationEvent) + Send + Sync>;

/// Event bus for publishing relation events to subscribers.
///
/// Wrap in `Arc` to enable subscriptions.
#[derive(Default)]
pub struct EventBus {
    callbacks: RwLock<Vec<(usize, Callback)>>,
    next_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events. Returns `Subscription` that unsubscribes on drop.
    pub fn subscribe(
        self: &Arc<Self>,
        callback: impl Fn(RelationEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(callback)));
        Subscription {
            bus: Arc::downgrade(self),
            id,
        }
    }

    fn unsubscribe(&self, id: usize) {
        // try_write: Drop may run during unwinding while emit holds the read lock
        if let Ok(mut guard) = self.callbacks.try_write() {
            guard.retain(|(i, _)| *i != id);
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: RelationEvent) {
        // Clone the callback list so a callback may subscribe without deadlocking.
        let callbacks: Vec<Callback> = self
            .callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn linked(folder: &str) -> RelationEvent {
        RelationEvent::Linked {
            folder: folder.into(),
            note: format!("{}/{}.md", folder, folder),
        }
    }

    #[test]
    fn test_subscribe_and_emit() {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let _sub = bus.subscribe(move |event| seen_clone.lock().unwrap().push(event));
        bus.emit(linked("A"));

        assert_eq!(*seen.lock().unwrap(), vec![linked("A")]);
    }

    #[test]
    fn test_subscription_unsubscribes_on_drop() {
        let bus = Arc::new(EventBus::new());
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        {
            let _sub = bus.subscribe(move |_| {
                count_clone.fetch_add(1, Ordering::Relaxed);
            });
            bus.emit(linked("A"));
        }
        bus.emit(linked("B"));

        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_vault_event_constructors_normalize_paths() {
        assert_eq!(
            VaultEvent::renamed("/A/", "/B"),
            VaultEvent::Renamed {
                from: "A".into(),
                to: "B".into()
            }
        );
        assert_eq!(VaultEvent::deleted("/A/A.md"), VaultEvent::Deleted { path: "A/A.md".into() });
    }

    #[test]
    fn test_relation_event_serialization() {
        let json = serde_json::to_string(&RelationEvent::CascadeFailed {
            folder: "B".into(),
            note: "B/A.md".into(),
            target: "B/B.md".into(),
            reason: "Already exists: B/B.md".into(),
        })
        .unwrap();
        assert!(json.contains("\"type\":\"cascadeFailed\""));
        assert!(json.contains("\"target\":\"B/B.md\""));
    }
}
