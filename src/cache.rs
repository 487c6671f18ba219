//! Entity Cache - run-scoped memo of resolved storage ids
//!
//! The cache only saves round-trips. It is never authoritative: on a miss
//! the transactor decides whether the row exists. One cache lives for one
//! extraction call and is passed into it explicitly.

use std::collections::HashMap;
use std::fmt;

use crate::hash::quote;
use crate::storage::SqliteStore;
use crate::Result;

/// Kind of cached entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// keyed by node fingerprint
    Node,
    /// keyed by [`citation_key`]
    Citation,
    /// keyed by evidence fingerprint
    Evidence,
    /// keyed by edge fingerprint
    Edge,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Node => "node",
            CacheKind::Citation => "citation",
            CacheKind::Evidence => "evidence",
            CacheKind::Edge => "edge",
        }
    }

    pub fn all() -> &'static [CacheKind] {
        &[CacheKind::Node, CacheKind::Citation, CacheKind::Evidence, CacheKind::Edge]
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Natural cache key of a citation
pub fn citation_key(citation_type: &str, reference: &str) -> String {
    format!("({}, {})", quote(citation_type), quote(reference))
}

/// Run-scoped mapping from (kind, key) to storage id.
#[derive(Debug, Clone, Default)]
pub struct EntityCache {
    entries: HashMap<CacheKind, HashMap<String, i64>>,
    hits: usize,
    misses: usize,
}

impl EntityCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previously resolved id
    pub fn lookup(&mut self, kind: CacheKind, key: &str) -> Option<i64> {
        let found = self.entries.get(&kind).and_then(|m| m.get(key)).copied();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Record a resolved id
    pub fn remember(&mut self, kind: CacheKind, key: impl Into<String>, id: i64) {
        self.entries.entry(kind).or_default().insert(key.into(), id);
    }

    /// Bulk-load existing rows of the given kinds.
    ///
    /// Read-only; run it once before any mutation starts.
    pub fn warm_start(&mut self, store: &SqliteStore, kinds: &[CacheKind]) -> Result<usize> {
        let mut loaded = 0;
        for &kind in kinds {
            let rows = store.scan_cache_keys(kind)?;
            loaded += rows.len();
            let map = self.entries.entry(kind).or_default();
            map.reserve(rows.len());
            map.extend(rows);
            tracing::debug!("Warm-started {} cache entries for {}", map.len(), kind);
        }
        Ok(loaded)
    }

    /// Number of entries of one kind
    pub fn len_of(&self, kind: CacheKind) -> usize {
        self.entries.get(&kind).map(HashMap::len).unwrap_or(0)
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_remember() {
        let mut cache = EntityCache::new();
        assert_eq!(cache.lookup(CacheKind::Node, "abc"), None);

        cache.remember(CacheKind::Node, "abc", 7);
        assert_eq!(cache.lookup(CacheKind::Node, "abc"), Some(7));
        // Kinds are separate key spaces
        assert_eq!(cache.lookup(CacheKind::Edge, "abc"), None);

        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_citation_key_is_unambiguous() {
        assert_ne!(citation_key("a, 'b", "c"), citation_key("a", "b', c"));
        assert_eq!(citation_key("PubMed", "123"), "('PubMed', '123')");
    }

    #[test]
    fn test_warm_start_from_empty_store() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut cache = EntityCache::new();
        let loaded = cache.warm_start(&store, CacheKind::all()).unwrap();
        assert_eq!(loaded, 0);
        assert!(cache.is_empty());
    }
}
