//! Diagnostics: problems found while loading and checking a working set.
//!
//! Parse errors and merge conflicts are recorded as errors by the working
//! set. [`check_calls`] is an on-demand lint over one file that reports calls
//! the resolver cannot link to a single definition.

use std::sync::Arc;

use super::resolve::{ResolveResult, Resolver};
use super::tree::ScopeTree;
use crate::base::SourceLocation;
use crate::error::{MergeConflict, ParseError};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: SourceLocation,
    pub severity: Severity,
    /// Error/warning code (e.g., "E0001").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedInfo {
    pub location: SourceLocation,
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn error(location: SourceLocation, message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Error, location, message)
    }

    pub fn warning(location: SourceLocation, message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Warning, location, message)
    }

    fn new(severity: Severity, location: SourceLocation, message: impl Into<Arc<str>>) -> Self {
        Self {
            location,
            severity,
            code: None,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn file(&self) -> &str {
        self.location.file()
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        let location = err
            .location
            .clone()
            .unwrap_or_else(|| SourceLocation::new(err.file.clone(), 1, 1));
        Diagnostic::error(location, err.reason.as_str()).with_code(codes::PARSE_ERROR)
    }
}

impl From<&MergeConflict> for Diagnostic {
    fn from(conflict: &MergeConflict) -> Self {
        let location = conflict
            .location
            .clone()
            .unwrap_or_else(|| SourceLocation::new(conflict.file.clone(), 1, 1));
        Diagnostic::error(
            location,
            format!(
                "'{}' declared as {} conflicts with existing {}",
                conflict.qualified_name, conflict.incoming, conflict.existing
            ),
        )
        .with_code(codes::MERGE_CONFLICT)
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

pub mod codes {
    /// A unit could not be turned into a scope tree.
    pub const PARSE_ERROR: &str = "E0001";
    /// A unit's contribution was rejected by the global merge.
    pub const MERGE_CONFLICT: &str = "E0002";

    /// No definition matches a method call.
    pub const UNRESOLVED_CALL: &str = "W0001";
    /// Several definitions match a method call equally well.
    pub const AMBIGUOUS_CALL: &str = "W0002";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn diagnostics_for_file(&self, file: &str) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.file() == file).collect()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Drop every diagnostic reported for `file`.
    pub fn clear_file(&mut self, file: &str) {
        self.diagnostics.retain(|d| d.file() != file);
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

// ============================================================================
// CALL CHECKER
// ============================================================================

/// Report method calls in `file` that resolve to nothing or to several
/// equally ranked definitions.
pub fn check_calls(tree: &ScopeTree, file: &str) -> Vec<Diagnostic> {
    let resolver = Resolver::new(tree);
    let mut collector = DiagnosticCollector::new();

    let mut calls: Vec<_> = tree
        .iter()
        .flat_map(|(_, scope)| scope.calls.iter())
        .filter(|c| c.location.file() == file)
        .collect();
    calls.sort_by(|a, b| a.location.cmp(&b.location));

    for call in calls {
        match resolver.resolve_call(call) {
            ResolveResult::Found(_) => {}
            ResolveResult::NotFound => collector.add(
                Diagnostic::warning(
                    call.location.clone(),
                    format!("no definition found for call to '{}'", call.name),
                )
                .with_code(codes::UNRESOLVED_CALL),
            ),
            ResolveResult::Ambiguous(candidates) => {
                let mut diagnostic = Diagnostic::warning(
                    call.location.clone(),
                    format!(
                        "call to '{}' matches {} definitions",
                        call.name,
                        candidates.len()
                    ),
                )
                .with_code(codes::AMBIGUOUS_CALL);
                for candidate in candidates {
                    let scope = &tree[candidate];
                    if let Some(location) = scope.location() {
                        diagnostic = diagnostic.with_related(RelatedInfo {
                            location: location.clone(),
                            message: Arc::from(format!("candidate: {}", tree.qualified_name(candidate).join("::"))),
                        });
                    }
                }
                collector.add(diagnostic);
            }
        }
    }
    collector.take()
}
