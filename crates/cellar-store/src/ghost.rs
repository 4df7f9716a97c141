use serde::{Deserialize, Serialize};

use crate::record::GhostRecord;

/// Insertion-ordered registry of blobs pending physical deletion.
///
/// Owned by exactly one storage instance. The registry is the single source
/// of truth for "needs deletion": entries survive failed removal attempts
/// and are only pruned once the file is confirmed absent. Hosts that need
/// the registry to survive restarts can serialize it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostRegistry {
    entries: Vec<GhostRecord>,
}

impl GhostRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered ghosts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no ghosts are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|g| g.id == id)
    }

    /// Look up a ghost by id.
    pub fn get(&self, id: &str) -> Option<&GhostRecord> {
        self.entries.iter().find(|g| g.id == id)
    }

    /// Register a ghost. Re-registering an id keeps its original position.
    pub fn insert(&mut self, ghost: GhostRecord) {
        match self.entries.iter_mut().find(|g| g.id == ghost.id) {
            Some(existing) => *existing = ghost,
            None => self.entries.push(ghost),
        }
    }

    /// Remove a ghost by id, returning it if present.
    pub fn remove(&mut self, id: &str) -> Option<GhostRecord> {
        let index = self.entries.iter().position(|g| g.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Iterate ghosts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GhostRecord> {
        self.entries.iter()
    }

    /// Ids currently registered, in insertion order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|g| g.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ghost(id: &str) -> GhostRecord {
        GhostRecord {
            id: id.into(),
            path: format!("/blobs/{id}").into(),
        }
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut reg = GhostRegistry::new();
        reg.insert(ghost("c"));
        reg.insert(ghost("a"));
        reg.insert(ghost("b"));
        assert_eq!(reg.ids(), vec!["c", "a", "b"]);
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut reg = GhostRegistry::new();
        reg.insert(ghost("a"));
        reg.insert(ghost("b"));
        reg.insert(GhostRecord {
            id: "a".into(),
            path: "/elsewhere/a".into(),
        });
        assert_eq!(reg.ids(), vec!["a", "b"]);
        assert_eq!(reg.get("a").unwrap().path, std::path::Path::new("/elsewhere/a"));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn remove_returns_entry() {
        let mut reg = GhostRegistry::new();
        reg.insert(ghost("a"));
        reg.insert(ghost("b"));

        let removed = reg.remove("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(!reg.contains("a"));
        assert!(reg.contains("b"));
        assert!(reg.remove("a").is_none());
    }

    #[test]
    fn empty_registry() {
        let reg = GhostRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.len(), 0);
        assert!(reg.get("x").is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let mut reg = GhostRegistry::new();
        reg.insert(ghost("a"));
        reg.insert(ghost("b"));
        let json = serde_json::to_string(&reg).unwrap();
        let parsed: GhostRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(reg, parsed);
    }
}
