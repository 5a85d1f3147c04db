//! File set management for tracking loaded translation units.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::base::FileId;
use crate::syntax::Language;

/// Manages the mapping between unit paths and FileIds.
///
/// Paths are the `filename` attributes of srcML units, exactly as they
/// appear in source locations.
#[derive(Debug, Default)]
pub struct FileSet {
    inner: RwLock<FileSetInner>,
}

#[derive(Debug, Default)]
struct FileSetInner {
    /// Path → entry, in load order
    entries: IndexMap<Arc<str>, FileEntry>,
    /// Next FileId to assign
    next_id: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FileEntry {
    id: FileId,
    language: Language,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a FileId for a path, recording its language.
    pub fn insert(&self, path: &str, language: Language) -> FileId {
        // Fast path: read lock
        {
            let inner = self.inner.read();
            if let Some(entry) = inner.entries.get(path) {
                if entry.language == language {
                    return entry.id;
                }
            }
        }

        let mut inner = self.inner.write();

        // Double-check
        if let Some(entry) = inner.entries.get_mut(path) {
            entry.language = language;
            return entry.id;
        }

        let id = FileId::new(inner.next_id);
        inner.next_id += 1;
        inner.entries.insert(Arc::from(path), FileEntry { id, language });
        id
    }

    pub fn get(&self, path: &str) -> Option<FileId> {
        self.inner.read().entries.get(path).map(|e| e.id)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner.read().entries.contains_key(path)
    }

    pub fn language(&self, path: &str) -> Option<Language> {
        self.inner.read().entries.get(path).map(|e| e.language)
    }

    /// Get the path for a FileId.
    pub fn path(&self, file: FileId) -> Option<Arc<str>> {
        self.inner
            .read()
            .entries
            .iter()
            .find(|(_, e)| e.id == file)
            .map(|(path, _)| path.clone())
    }

    /// Remove a path from the set.
    pub fn remove(&self, path: &str) -> Option<FileId> {
        self.inner.write().entries.shift_remove(path).map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All paths in load order.
    pub fn paths(&self) -> Vec<Arc<str>> {
        self.inner.read().entries.keys().cloned().collect()
    }

    /// Number of files per language.
    pub fn languages(&self) -> IndexMap<Language, usize> {
        let mut out = IndexMap::new();
        for entry in self.inner.read().entries.values() {
            *out.entry(entry.language).or_insert(0) += 1;
        }
        out
    }

    /// Forget every path. Ids are never reused.
    pub fn clear(&self) {
        self.inner.write().entries.clear();
    }
}
