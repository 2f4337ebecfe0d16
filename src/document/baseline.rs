//! Last-known content tracking for open documents.

use std::sync::Arc;

use dashmap::DashMap;

/// Per-document cache of the most recent content snapshot the engine has
/// diffed against.
///
/// Not persisted: the cache is rebuilt when tracking resumes, and the
/// durable timestamp store remains the sole source of truth. Entries are
/// shared as `Arc` so a reader never blocks a concurrent change for another
/// document.
#[derive(Debug, Default)]
pub struct BaselineCache {
    lines: DashMap<String, Arc<Vec<String>>>,
}

impl BaselineCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            lines: DashMap::new(),
        }
    }

    /// Record `lines` as the baseline for a document, replacing any prior one.
    pub fn insert(&self, document_id: &str, lines: Vec<String>) {
        self.lines.insert(document_id.to_owned(), Arc::new(lines));
    }

    /// The current baseline, if the document is tracked.
    pub fn get(&self, document_id: &str) -> Option<Arc<Vec<String>>> {
        self.lines.get(document_id).map(|r| Arc::clone(&r))
    }

    /// Stop tracking a document. Its persisted history is unaffected.
    pub fn remove(&self, document_id: &str) {
        self.lines.remove(document_id);
    }

    /// Whether a baseline is recorded for the document.
    pub fn contains(&self, document_id: &str) -> bool {
        self.lines.contains_key(document_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get() {
        let cache = BaselineCache::new();
        cache.insert("notes.md", vec!["a".into(), "b".into()]);

        let lines = cache.get("notes.md").unwrap();
        assert_eq!(lines.as_slice(), ["a", "b"]);
    }

    #[test]
    fn insert_replaces_prior_baseline() {
        let cache = BaselineCache::new();
        cache.insert("notes.md", vec!["a".into()]);
        cache.insert("notes.md", vec!["b".into()]);

        assert_eq!(cache.get("notes.md").unwrap().as_slice(), ["b"]);
    }

    #[test]
    fn remove_forgets_the_document() {
        let cache = BaselineCache::new();
        cache.insert("notes.md", vec!["a".into()]);
        cache.remove("notes.md");

        assert!(!cache.contains("notes.md"));
        assert!(cache.get("notes.md").is_none());
    }

    #[test]
    fn documents_are_independent() {
        let cache = BaselineCache::new();
        cache.insert("a.md", vec!["a".into()]);
        cache.insert("b.md", vec!["b".into()]);
        cache.remove("a.md");

        assert!(cache.get("b.md").is_some());
    }
}
