//! High-level IR: the program-data model built from srcML.
//!
//! ## Pipeline
//!
//! 1. **Build**: [`build`] turns one [`ParsedUnit`](crate::syntax::ParsedUnit)
//!    into a per-file [`ScopeTree`]
//! 2. **Merge**: [`merge_file`] folds a per-file tree into the shared global
//!    tree; [`remove_file`] takes a file's contribution back out
//! 3. **Resolve**: [`Resolver`] links use sites and call sites to declarations
//!    over the merged tree, lazily at query time
//!
//! Everything here is synchronous and lock-free; the working set in
//! [`crate::project`] owns the global tree and its lock.

mod builder;
mod diagnostics;
mod ids;
mod language;
mod merge;
mod model;
mod resolve;
mod source;
mod tree;

pub use builder::build;
pub use diagnostics::{
    Diagnostic, DiagnosticCollector, RelatedInfo, Severity, check_calls, codes,
};
pub use ids::ScopeId;
pub use language::{SignatureParser, parser_for};
pub use merge::{check_conflicts, merge_file, remove_file};
pub use model::{
    Argument, CallingObject, LiteralKind, MethodCall, MethodDefinition, NamedType,
    NamespaceImport, Parameter, Scope, ScopeDetail, ScopeKind, TypeDefinition, TypeKind, TypeUse,
    VariableDeclaration, VariableUse,
};
pub use resolve::{
    CallCandidate, MatchRank, ResolveResult, Resolver, calls_at, declaration_for_use,
    definitions_for_call, use_at,
};
pub use source::FileSet;
pub use tree::ScopeTree;
