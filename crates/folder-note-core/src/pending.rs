//! Vault operations the engine performed itself and expects to hear back about.
//!
//! Before the engine renames a note through the vault, it marks the operation
//! here. When the resulting vault event is routed back, the router consumes
//! the mark and treats the event as engine-originated, so it never triggers
//! a second cascade.
//!
//! Marks expire after [`MARK_TTL`] to handle watcher events that never arrive
//! (e.g., dropped under heavy load). This prevents stale marks from
//! swallowing a later user-initiated operation on the same paths.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Time-to-live for pending marks.
pub const MARK_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Rename,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OpKey {
    kind: OpKind,
    from: String,
    to: String,
}

/// Short-lived set of expected self-caused operations, each consumed once.
#[derive(Debug)]
pub struct PendingOps {
    marks: HashMap<OpKey, Instant>,
    ttl: Duration,
}

impl Default for PendingOps {
    fn default() -> Self {
        Self::with_ttl(MARK_TTL)
    }
}

impl PendingOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            marks: HashMap::new(),
            ttl,
        }
    }

    /// Mark an operation as engine-originated (call before performing it).
    pub fn mark(&mut self, kind: OpKind, from: &str, to: &str) {
        self.cleanup_expired();
        self.marks.insert(Self::key(kind, from, to), Instant::now());
    }

    /// Check if the operation was marked and consume the mark (returns true once).
    /// Returns false if the mark has expired.
    pub fn consume(&mut self, kind: OpKind, from: &str, to: &str) -> bool {
        match self.marks.remove(&Self::key(kind, from, to)) {
            Some(marked_at) => marked_at.elapsed() < self.ttl,
            None => false,
        }
    }

    /// Check for a live mark without consuming it.
    pub fn is_pending(&self, kind: OpKind, from: &str, to: &str) -> bool {
        self.marks
            .get(&Self::key(kind, from, to))
            .is_some_and(|marked_at| marked_at.elapsed() < self.ttl)
    }

    /// Remove expired marks to prevent memory growth.
    pub fn cleanup_expired(&mut self) {
        let ttl = self.ttl;
        self.marks.retain(|_, marked_at| marked_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    fn key(kind: OpKind, from: &str, to: &str) -> OpKey {
        OpKey {
            kind,
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_is_consumed_exactly_once() {
        let mut pending = PendingOps::new();
        pending.mark(OpKind::Rename, "B/A.md", "B/B.md");

        assert!(pending.is_pending(OpKind::Rename, "B/A.md", "B/B.md"));
        assert!(pending.consume(OpKind::Rename, "B/A.md", "B/B.md"));
        assert!(!pending.consume(OpKind::Rename, "B/A.md", "B/B.md"));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_mark_matches_the_exact_path_pair() {
        let mut pending = PendingOps::new();
        pending.mark(OpKind::Rename, "B/A.md", "B/B.md");

        assert!(!pending.consume(OpKind::Rename, "B/B.md", "B/A.md"));
        assert!(!pending.consume(OpKind::Rename, "B/A.md", "B/C.md"));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_expired_mark_is_not_honored() {
        let mut pending = PendingOps::with_ttl(Duration::from_millis(0));
        pending.mark(OpKind::Rename, "a.md", "b.md");
        std::thread::sleep(Duration::from_millis(2));

        assert!(!pending.is_pending(OpKind::Rename, "a.md", "b.md"));
        assert!(!pending.consume(OpKind::Rename, "a.md", "b.md"));
    }

    #[test]
    fn test_cleanup_drops_expired_marks() {
        let mut pending = PendingOps::with_ttl(Duration::from_millis(0));
        pending.mark(OpKind::Rename, "a.md", "b.md");
        pending.mark(OpKind::Rename, "c.md", "d.md");
        std::thread::sleep(Duration::from_millis(2));

        pending.cleanup_expired();
        assert!(pending.is_empty());
    }
}
