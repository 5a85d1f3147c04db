//! Location queries: which scope, statement or call is at a position.

use smol_str::SmolStr;

use super::query::{Query, QueryContext};
use crate::base::SourceLocation;
use crate::error::Result;
use crate::hir::{MethodCall, ScopeDetail, ScopeId, ScopeKind, ScopeTree, calls_at};
use crate::syntax::Language;

/// An owned snapshot of one scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeInfo {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub name: SmolStr,
    /// `a::b::C` or `a.b.C`, depending on the language.
    pub qualified_name: String,
    pub language: Language,
    pub locations: Vec<SourceLocation>,
    pub detail: ScopeDetail,
}

impl ScopeInfo {
    pub fn from_tree(tree: &ScopeTree, id: ScopeId) -> Option<Self> {
        let scope = tree.get(id)?;
        Some(Self {
            id,
            kind: scope.kind,
            name: scope.name.clone(),
            qualified_name: tree.qualified_path(id),
            language: scope.language,
            locations: scope.locations().to_vec(),
            detail: scope.detail.clone(),
        })
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.locations.first()
    }
}

/// The innermost scope containing a location.
#[derive(Clone, Debug)]
pub struct StatementForLocation {
    pub location: SourceLocation,
}

impl StatementForLocation {
    pub fn new(location: SourceLocation) -> Self {
        Self { location }
    }
}

impl Query for StatementForLocation {
    type Output = Option<ScopeInfo>;

    fn run(&self, ctx: &QueryContext<'_>) -> Result<Self::Output> {
        ctx.require_loaded(&self.location)?;
        let tree = ctx.tree();
        Ok(tree
            .scope_for_location(&self.location)
            .and_then(|id| ScopeInfo::from_tree(tree, id)))
    }
}

/// The innermost scope of a given kind containing a location.
///
/// Without a kind this is [`StatementForLocation`].
#[derive(Clone, Debug)]
pub struct ScopeForLocation {
    pub location: SourceLocation,
    pub kind: Option<ScopeKind>,
}

impl ScopeForLocation {
    pub fn new(location: SourceLocation) -> Self {
        Self {
            location,
            kind: None,
        }
    }

    pub fn of_kind(mut self, kind: ScopeKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl Query for ScopeForLocation {
    type Output = Option<ScopeInfo>;

    fn run(&self, ctx: &QueryContext<'_>) -> Result<Self::Output> {
        ctx.require_loaded(&self.location)?;
        let tree = ctx.tree();
        let Some(innermost) = tree.scope_for_location(&self.location) else {
            return Ok(None);
        };
        let found = match self.kind {
            Some(kind) => tree.enclosing(innermost, kind),
            None => Some(innermost),
        };
        Ok(found.and_then(|id| ScopeInfo::from_tree(tree, id)))
    }
}

/// Method calls whose extent covers a location, innermost first.
#[derive(Clone, Debug)]
pub struct FindMethodCallsAtLocation {
    pub location: SourceLocation,
}

impl FindMethodCallsAtLocation {
    pub fn new(location: SourceLocation) -> Self {
        Self { location }
    }
}

impl Query for FindMethodCallsAtLocation {
    type Output = Vec<MethodCall>;

    fn run(&self, ctx: &QueryContext<'_>) -> Result<Self::Output> {
        ctx.require_loaded(&self.location)?;
        Ok(calls_at(ctx.tree(), &self.location)
            .into_iter()
            .cloned()
            .collect())
    }
}

/// Scopes whose qualified name ends with the given path.
///
/// The path may use either `::` or `.` between segments; `Shape` matches
/// `geo::Shape` and `geo::Shape` matches only that one.
#[derive(Clone, Debug)]
pub struct FindScopesByName {
    pub path: String,
    pub kind: Option<ScopeKind>,
}

impl FindScopesByName {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: None,
        }
    }

    pub fn of_kind(mut self, kind: ScopeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn segments(&self) -> Vec<&str> {
        self.path
            .split("::")
            .flat_map(|s| s.split('.'))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Query for FindScopesByName {
    type Output = Vec<ScopeInfo>;

    fn run(&self, ctx: &QueryContext<'_>) -> Result<Self::Output> {
        let segments = self.segments();
        let Some(last) = segments.last() else {
            return Ok(Vec::new());
        };

        let tree = ctx.tree();
        let mut out = Vec::new();
        for (id, scope) in tree.iter() {
            if scope.name != *last || self.kind.is_some_and(|k| k != scope.kind) {
                continue;
            }
            ctx.checkpoint()?;
            let qualified = tree.qualified_name(id);
            if qualified.len() >= segments.len()
                && qualified[qualified.len() - segments.len()..]
                    .iter()
                    .zip(&segments)
                    .all(|(a, b)| a == b)
            {
                out.extend(ScopeInfo::from_tree(tree, id));
            }
        }
        out.sort_by(|a, b| a.location().cmp(&b.location()));
        Ok(out)
    }
}
