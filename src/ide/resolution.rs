//! Go-to-declaration style queries built on the resolution engine.

use super::location::ScopeInfo;
use super::query::{Query, QueryContext};
use crate::base::SourceLocation;
use crate::error::Result;
use crate::hir::{
    MatchRank, MethodDefinition, VariableDeclaration, declaration_for_use, definitions_for_call,
};

/// Declarations of the variable used at a location.
///
/// Usually one; several when a member is found at the same depth through more
/// than one base type. Empty when nothing is used there or nothing matches.
#[derive(Clone, Debug)]
pub struct DeclarationForVariableUse {
    pub location: SourceLocation,
}

impl DeclarationForVariableUse {
    pub fn new(location: SourceLocation) -> Self {
        Self { location }
    }
}

impl Query for DeclarationForVariableUse {
    type Output = Vec<VariableDeclaration>;

    fn run(&self, ctx: &QueryContext<'_>) -> Result<Self::Output> {
        ctx.require_loaded(&self.location)?;
        Ok(declaration_for_use(ctx.tree(), &self.location))
    }
}

/// One candidate definition of a method call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallTarget {
    pub method: ScopeInfo,
    pub definition: MethodDefinition,
    pub rank: MatchRank,
}

/// Candidate definitions for the innermost call at a location, best match
/// first.
#[derive(Clone, Debug)]
pub struct DefinitionsForMethodCall {
    pub location: SourceLocation,
}

impl DefinitionsForMethodCall {
    pub fn new(location: SourceLocation) -> Self {
        Self { location }
    }
}

impl Query for DefinitionsForMethodCall {
    type Output = Vec<CallTarget>;

    fn run(&self, ctx: &QueryContext<'_>) -> Result<Self::Output> {
        ctx.require_loaded(&self.location)?;
        let tree = ctx.tree();
        let mut out = Vec::new();
        for candidate in definitions_for_call(tree, &self.location) {
            ctx.checkpoint()?;
            let Some(method) = ScopeInfo::from_tree(tree, candidate.scope) else {
                continue;
            };
            let Some(definition) = tree[candidate.scope].as_method().cloned() else {
                continue;
            };
            out.push(CallTarget {
                method,
                definition,
                rank: candidate.rank,
            });
        }
        Ok(out)
    }
}
