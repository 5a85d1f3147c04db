//! File change events and the parsed-unit feed.
//!
//! The working set never reads source files itself. An external monitor
//! reports [`FileEvent`]s; a [`UnitProvider`] supplies the srcML units for the
//! affected path.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::syntax::ParsedUnit;

/// What happened to a file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FileChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed { old_path: Arc<str> },
}

impl fmt::Display for FileChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileChangeKind::Added => f.write_str("added"),
            FileChangeKind::Modified => f.write_str("modified"),
            FileChangeKind::Deleted => f.write_str("deleted"),
            FileChangeKind::Renamed { old_path } => write!(f, "renamed from {}", old_path),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileEvent {
    pub path: Arc<str>,
    pub kind: FileChangeKind,
}

impl FileEvent {
    pub fn added(path: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            kind: FileChangeKind::Added,
        }
    }

    pub fn modified(path: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            kind: FileChangeKind::Modified,
        }
    }

    pub fn deleted(path: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            kind: FileChangeKind::Deleted,
        }
    }

    pub fn renamed(old_path: impl Into<Arc<str>>, path: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            kind: FileChangeKind::Renamed {
                old_path: old_path.into(),
            },
        }
    }
}

/// Supplies the parsed units for a source path.
///
/// Usually backed by a srcML generation step. Closures work too:
///
/// ```ignore
/// let provider = |path: &str| srcdata::syntax::srcml::parse_file(format!("{path}.xml").as_ref());
/// ```
pub trait UnitProvider: Send + Sync {
    fn units(&self, path: &str) -> Result<Vec<ParsedUnit>>;
}

impl<F> UnitProvider for F
where
    F: Fn(&str) -> Result<Vec<ParsedUnit>> + Send + Sync,
{
    fn units(&self, path: &str) -> Result<Vec<ParsedUnit>> {
        self(path)
    }
}

/// An in-memory provider; units are registered by path.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    units: RwLock<FxHashMap<Arc<str>, Vec<ParsedUnit>>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `unit` under its own path, replacing earlier units.
    pub fn insert(&self, unit: ParsedUnit) {
        self.units.write().insert(unit.path.clone(), vec![unit]);
    }

    pub fn remove(&self, path: &str) {
        self.units.write().remove(path);
    }
}

impl UnitProvider for MemoryProvider {
    fn units(&self, path: &str) -> Result<Vec<ParsedUnit>> {
        self.units
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::invalid_input(format!("no units available for {}", path)))
    }
}
