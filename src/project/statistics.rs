//! Working set statistics for reporting tools.

use std::fmt;

use super::events::FileChangeKind;
use crate::hir::{ScopeKind, ScopeTree};

/// Number of file events processed, per change kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileEventCounts {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    pub renamed: usize,
}

impl FileEventCounts {
    pub fn record(&mut self, kind: &FileChangeKind) {
        match kind {
            FileChangeKind::Added => self.added += 1,
            FileChangeKind::Modified => self.modified += 1,
            FileChangeKind::Deleted => self.deleted += 1,
            FileChangeKind::Renamed { .. } => self.renamed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.added + self.modified + self.deleted + self.renamed
    }
}

/// A point-in-time summary of a working set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    pub files: usize,
    /// Every scope, including the global namespace.
    pub scopes: usize,
    /// Named namespaces.
    pub namespaces: usize,
    pub types: usize,
    pub methods: usize,
    pub variables: usize,
    pub method_calls: usize,
    pub error_count: usize,
    pub file_events: FileEventCounts,
}

impl Statistics {
    /// Count the entities of `tree`; file, error and event counts are left at zero.
    pub fn from_tree(tree: &ScopeTree) -> Self {
        let mut stats = Statistics {
            scopes: tree.len(),
            ..Statistics::default()
        };
        for (_, scope) in tree.iter() {
            match scope.kind {
                ScopeKind::Namespace if !scope.name.is_empty() => stats.namespaces += 1,
                ScopeKind::Type => stats.types += 1,
                ScopeKind::Method => stats.methods += 1,
                _ => {}
            }
            stats.variables += scope.variables.len();
            stats.method_calls += scope.calls.len();
        }
        stats
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "files:        {}", self.files)?;
        writeln!(f, "scopes:       {}", self.scopes)?;
        writeln!(f, "namespaces:   {}", self.namespaces)?;
        writeln!(f, "types:        {}", self.types)?;
        writeln!(f, "methods:      {}", self.methods)?;
        writeln!(f, "variables:    {}", self.variables)?;
        writeln!(f, "method calls: {}", self.method_calls)?;
        writeln!(f, "errors:       {}", self.error_count)?;
        write!(
            f,
            "file events:  {} (added {}, modified {}, deleted {}, renamed {})",
            self.file_events.total(),
            self.file_events.added,
            self.file_events.modified,
            self.file_events.deleted,
            self.file_events.renamed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{ScopeId, Scope, VariableDeclaration, TypeUse};
    use crate::base::SourceLocation;
    use crate::syntax::Language;

    #[test]
    fn test_counts_from_tree() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let ns = tree.add_child(root, Scope::new(ScopeKind::Namespace, "app", Language::Java));
        let ty = tree.add_child(ns, Scope::new(ScopeKind::Type, "Main", Language::Java));
        tree.add_child(ty, Scope::new(ScopeKind::Method, "main", Language::Java));
        tree[ty].variables.push(VariableDeclaration {
            name: "count".into(),
            declared_type: TypeUse::builtin("int"),
            is_global: false,
            location: SourceLocation::new("Main.java", 3, 5),
            owner: ScopeId::new(2),
        });

        let stats = Statistics::from_tree(&tree);
        assert_eq!(stats.scopes, 4);
        assert_eq!(stats.namespaces, 1);
        assert_eq!(stats.types, 1);
        assert_eq!(stats.methods, 1);
        assert_eq!(stats.variables, 1);
        assert_eq!(stats.method_calls, 0);
    }

    #[test]
    fn test_event_counts() {
        let mut counts = FileEventCounts::default();
        counts.record(&FileChangeKind::Added);
        counts.record(&FileChangeKind::Added);
        counts.record(&FileChangeKind::Renamed { old_path: "a".into() });
        assert_eq!(counts.added, 2);
        assert_eq!(counts.renamed, 1);
        assert_eq!(counts.total(), 3);
    }
}
