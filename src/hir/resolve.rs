//! Name resolution: linking use sites and call sites to their declarations.
//!
//! Resolution runs lazily over a [`ScopeTree`] (normally the working set's
//! merged tree under a read lock). Nothing is cached; every query walks the
//! tree from the use site outward.
//!
//! # Variables
//!
//! 1. Lexical chain: the innermost scope first. Within one file a declaration
//!    must precede the use; the closest preceding one wins (shadowing).
//! 2. On reaching a type, its members and then its base types, breadth-first.
//!    All matches at the first level that has any are returned.
//! 3. Namespaces up to the global scope.
//!
//! # Method calls
//!
//! Candidates are collected from the lexical chain, enclosing types with their
//! base types, namespaces, imports and the global scope, filtered by arity
//! (default parameters widen the range), ranked by argument-type
//! compatibility, and ordered by rank then declaration location. Ranking never
//! removes a candidate.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use tracing::trace;

use super::ids::ScopeId;
use super::language::{SignatureParser, parser_for};
use super::model::{
    Argument, CallingObject, MethodCall, NamedType, Scope, ScopeKind, TypeUse,
    VariableDeclaration, VariableUse,
};
use super::tree::ScopeTree;
use crate::base::SourceLocation;

// ============================================================================
// RESULTS
// ============================================================================

/// Result of resolving a single reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveResult<T> {
    /// Resolved to a single entity.
    Found(T),
    /// Several equally good candidates.
    Ambiguous(Vec<T>),
    /// Nothing matched. Normal for library or external symbols.
    NotFound,
}

impl<T> ResolveResult<T> {
    pub fn from_candidates(mut candidates: Vec<T>) -> Self {
        match candidates.len() {
            0 => ResolveResult::NotFound,
            1 => ResolveResult::Found(candidates.remove(0)),
            _ => ResolveResult::Ambiguous(candidates),
        }
    }

    /// Get the resolved entity if unambiguous.
    pub fn found(&self) -> Option<&T> {
        match self {
            ResolveResult::Found(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ResolveResult::Found(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolveResult::Ambiguous(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveResult::NotFound)
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            ResolveResult::Found(t) => vec![t],
            ResolveResult::Ambiguous(all) => all,
            ResolveResult::NotFound => Vec::new(),
        }
    }
}

/// How well a candidate's parameters match the call's arguments.
///
/// Ordered best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchRank {
    /// Every argument type equals its parameter type.
    Exact,
    /// No argument is known to mismatch.
    Compatible,
    /// Only the argument count fits.
    ArityOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallCandidate {
    /// The method scope of the candidate definition.
    pub scope: ScopeId,
    pub rank: MatchRank,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArgumentMatch {
    Exact,
    Convertible,
    Mismatch,
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolver over one scope tree.
#[derive(Clone, Copy, Debug)]
pub struct Resolver<'a> {
    tree: &'a ScopeTree,
}

impl<'a> Resolver<'a> {
    pub fn new(tree: &'a ScopeTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'a ScopeTree {
        self.tree
    }

    fn parser(&self, scope: ScopeId) -> &'static dyn SignatureParser {
        parser_for(self.tree[scope].language)
    }

    // ------------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------------

    /// Declarations visible as `name` from `at` inside `scope`.
    pub fn declarations_for(
        &self,
        name: &str,
        at: &SourceLocation,
        scope: ScopeId,
    ) -> Vec<&'a VariableDeclaration> {
        for id in self.tree.ancestors(scope) {
            let found = match self.tree[id].kind {
                ScopeKind::Type => self.member_variables(&[id], name),
                _ => visible_in(&self.tree[id], name, at),
            };
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    pub fn resolve_variable(&self, usage: &VariableUse) -> ResolveResult<&'a VariableDeclaration> {
        ResolveResult::from_candidates(self.declarations_for(&usage.name, &usage.location, usage.scope))
    }

    /// Members named `name` of `types` or, failing that, of their base types.
    pub fn member_variables(&self, types: &[ScopeId], name: &str) -> Vec<&'a VariableDeclaration> {
        let mut visited = FxHashSet::default();
        let mut level: Vec<ScopeId> = types.to_vec();
        while !level.is_empty() {
            level.retain(|t| visited.insert(*t));
            let mut found: Vec<&'a VariableDeclaration> = level
                .iter()
                .flat_map(|t| self.tree[*t].variables.iter())
                .filter(|v| v.name == name)
                .collect();
            if !found.is_empty() {
                found.sort_by(|a, b| a.location.cmp(&b.location));
                return found;
            }
            level = level.iter().flat_map(|t| self.base_scopes(*t)).collect();
        }
        Vec::new()
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    /// Type scopes named by `ty` as seen from `from`.
    ///
    /// Walks the lexical chain; each scope's own members are checked before
    /// the imports declared there in `file`. Builtins and unknown types never
    /// resolve.
    pub fn resolve_type(&self, ty: &TypeUse, from: ScopeId, file: &str) -> Vec<ScopeId> {
        match ty.as_named() {
            Some(named) if !named.builtin => self.resolve_path(&named.path(), from, file, false),
            _ => Vec::new(),
        }
    }

    fn resolve_path(
        &self,
        path: &[SmolStr],
        from: ScopeId,
        file: &str,
        allow_namespaces: bool,
    ) -> Vec<ScopeId> {
        for id in self.tree.ancestors(from) {
            let found = self.lookup_path(id, path, allow_namespaces);
            if !found.is_empty() {
                return found;
            }
            let found = self.lookup_imported(id, path, file, allow_namespaces);
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Follow `path` downward from `from` through types and namespaces.
    fn lookup_path(&self, from: ScopeId, path: &[SmolStr], allow_namespaces: bool) -> Vec<ScopeId> {
        if path.is_empty() {
            return Vec::new();
        }
        let mut frontier = vec![from];
        for segment in path {
            frontier = frontier
                .iter()
                .flat_map(|s| self.tree.children(*s).iter().copied())
                .filter(|c| {
                    let scope = &self.tree[*c];
                    scope.name == *segment
                        && matches!(scope.kind, ScopeKind::Type | ScopeKind::Namespace)
                })
                .collect();
            if frontier.is_empty() {
                return frontier;
            }
        }
        frontier.retain(|s| allow_namespaces || self.tree[*s].kind == ScopeKind::Type);
        frontier
    }

    fn lookup_imported(
        &self,
        scope: ScopeId,
        path: &[SmolStr],
        file: &str,
        allow_namespaces: bool,
    ) -> Vec<ScopeId> {
        let root = self.tree.root();
        for import in &self.tree[scope].imports {
            if import.location.file() != file {
                continue;
            }
            let Some(full) = import.expand(path) else {
                continue;
            };
            let found = self.lookup_path(root, &full, allow_namespaces);
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Direct base types of the type scope `ty`, resolved.
    pub fn base_scopes(&self, ty: ScopeId) -> Vec<ScopeId> {
        let scope = &self.tree[ty];
        let Some(def) = scope.as_type() else {
            return Vec::new();
        };
        let from = scope.parent().unwrap_or(self.tree.root());
        let mut out = Vec::new();
        for base in &def.base_types {
            for location in scope.locations() {
                let found = self.resolve_type(base, from, location.file());
                if !found.is_empty() {
                    out.extend(found.into_iter().filter(|f| *f != ty));
                    break;
                }
            }
        }
        out
    }

    /// `roots` followed by all their transitive base types, breadth-first.
    pub fn with_bases(&self, roots: &[ScopeId]) -> Vec<ScopeId> {
        let mut visited = FxHashSet::default();
        let mut queue: VecDeque<ScopeId> = roots.iter().copied().collect();
        let mut out = Vec::new();
        while let Some(ty) = queue.pop_front() {
            if !visited.insert(ty) {
                continue;
            }
            out.push(ty);
            queue.extend(self.base_scopes(ty));
        }
        out
    }

    // ------------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------------

    /// All definitions `call` may invoke, best match first.
    pub fn candidates(&self, call: &MethodCall) -> Vec<CallCandidate> {
        let argc = call.arguments.len();
        let methods: Vec<ScopeId> = self
            .methods_in_reach(call)
            .into_iter()
            .filter(|m| {
                self.tree[*m]
                    .as_method()
                    .is_some_and(|def| def.accepts_arity(argc))
            })
            .collect();
        trace!(call = %call.name, argc, candidates = methods.len(), "call candidates by arity");
        if methods.is_empty() {
            return Vec::new();
        }

        let argument_types: Vec<TypeUse> = call
            .arguments
            .iter()
            .map(|a| self.argument_type(a, call))
            .collect();
        let mut out: Vec<CallCandidate> = methods
            .into_iter()
            .map(|scope| CallCandidate {
                scope,
                rank: self.rank(scope, &argument_types, call),
            })
            .collect();
        out.sort_by(|a, b| {
            a.rank
                .cmp(&b.rank)
                .then_with(|| self.tree[a.scope].location().cmp(&self.tree[b.scope].location()))
                .then_with(|| a.scope.cmp(&b.scope))
        });
        out
    }

    /// The best candidates for `call`.
    ///
    /// A prototype and its out-of-line definition count as one candidate; the
    /// one with a body is reported.
    pub fn resolve_call(&self, call: &MethodCall) -> ResolveResult<ScopeId> {
        let candidates = self.candidates(call);
        let Some(best) = candidates.first().map(|c| c.rank) else {
            return ResolveResult::NotFound;
        };
        let mut picked: Vec<(String, ScopeId)> = Vec::new();
        for candidate in candidates.iter().filter(|c| c.rank == best) {
            let key = self.signature_key(candidate.scope);
            match picked.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => {
                    let has_body = |id: ScopeId| {
                        self.tree[id].as_method().is_some_and(|m| m.has_body)
                    };
                    if !has_body(slot.1) && has_body(candidate.scope) {
                        slot.1 = candidate.scope;
                    }
                }
                None => picked.push((key, candidate.scope)),
            }
        }
        ResolveResult::from_candidates(picked.into_iter().map(|(_, id)| id).collect())
    }

    fn signature_key(&self, method: ScopeId) -> String {
        let parent = self.tree.parent(method).map(|p| p.0).unwrap_or_default();
        let params = self.tree[method]
            .as_method()
            .map(|m| {
                m.parameters
                    .iter()
                    .map(|p| p.declared_type.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();
        format!("{}:{}({})", parent, self.tree[method].name, params)
    }

    fn methods_named(&self, scope: ScopeId, name: &str) -> impl Iterator<Item = ScopeId> + 'a {
        self.tree.named_children(scope, ScopeKind::Method, name)
    }

    fn methods_in_types(&self, types: &[ScopeId], name: &str, out: &mut Vec<ScopeId>) {
        for ty in self.with_bases(types) {
            out.extend(self.methods_named(ty, name));
        }
    }

    /// Every method named like `call` that is reachable from the call site.
    fn methods_in_reach(&self, call: &MethodCall) -> Vec<ScopeId> {
        if call.is_constructor {
            return self.constructors(call);
        }
        let mut out = Vec::new();
        let name = call.name.as_str();
        match &call.calling_object {
            None => {
                for id in self.tree.ancestors(call.caller) {
                    match self.tree[id].kind {
                        ScopeKind::Type => self.methods_in_types(&[id], name, &mut out),
                        ScopeKind::Namespace => {
                            out.extend(self.methods_named(id, name));
                            for target in self.imported_scopes(id, name, call.location.file()) {
                                out.extend(self.methods_named(target, name));
                            }
                        }
                        _ => out.extend(self.methods_named(id, name)),
                    }
                }
            }
            Some(CallingObject::This) => {
                if let Some(ty) = self.tree.enclosing(call.caller, ScopeKind::Type) {
                    self.methods_in_types(&[ty], name, &mut out);
                }
            }
            Some(CallingObject::Base) => {
                if let Some(ty) = self.tree.enclosing(call.caller, ScopeKind::Type) {
                    self.methods_in_types(&self.base_scopes(ty), name, &mut out);
                }
            }
            Some(CallingObject::Path(path)) => {
                for target in self.object_scopes(path, call) {
                    match self.tree[target].kind {
                        ScopeKind::Type => self.methods_in_types(&[target], name, &mut out),
                        _ => out.extend(self.methods_named(target, name)),
                    }
                }
            }
            Some(CallingObject::Call(inner)) => {
                let types = self.call_result_types(inner);
                self.methods_in_types(&types, name, &mut out);
            }
        }
        let mut seen = FxHashSet::default();
        out.retain(|id| seen.insert(*id));
        out
    }

    /// Scopes whose members `scope`'s imports in `file` bring in as `name`.
    fn imported_scopes(&self, scope: ScopeId, name: &str, file: &str) -> Vec<ScopeId> {
        let root = self.tree.root();
        let mut out = Vec::new();
        for import in &self.tree[scope].imports {
            if import.location.file() != file || import.alias.is_some() {
                continue;
            }
            let container = if import.wildcard {
                &import.path[..]
            } else if import.path.last().is_some_and(|last| last == name) {
                &import.path[..import.path.len() - 1]
            } else {
                continue;
            };
            out.extend(self.lookup_path(root, container, true));
        }
        out
    }

    /// Types or namespaces an access path such as `a.b` or `ns::A` denotes.
    fn object_scopes(&self, path: &[SmolStr], call: &MethodCall) -> Vec<ScopeId> {
        let Some((first, rest)) = path.split_first() else {
            return Vec::new();
        };
        let file = call.location.file();

        let declarations = self.declarations_for(first, &call.location, call.caller);
        if !declarations.is_empty() {
            let mut types = self.declaration_types(&declarations, file);
            for member in rest {
                let members = self.member_variables(&types, member);
                types = self.declaration_types(&members, file);
            }
            return types;
        }
        self.resolve_path(path, call.caller, file, true)
    }

    fn declaration_types(&self, declarations: &[&VariableDeclaration], file: &str) -> Vec<ScopeId> {
        let mut out = Vec::new();
        for declaration in declarations {
            for ty in self.resolve_type(&declaration.declared_type, declaration.owner, file) {
                if !out.contains(&ty) {
                    out.push(ty);
                }
            }
        }
        out
    }

    fn constructors(&self, call: &MethodCall) -> Vec<ScopeId> {
        let file = call.location.file();
        let types = match &call.calling_object {
            Some(CallingObject::This) => self
                .tree
                .enclosing(call.caller, ScopeKind::Type)
                .into_iter()
                .collect(),
            Some(CallingObject::Base) => self
                .tree
                .enclosing(call.caller, ScopeKind::Type)
                .map(|ty| self.base_scopes(ty))
                .unwrap_or_default(),
            Some(CallingObject::Path(prefix)) => {
                let ty = TypeUse::named(call.name.clone()).with_prefix(prefix.clone());
                self.resolve_type(&ty, call.caller, file)
            }
            _ => self.resolve_type(&TypeUse::named(call.name.clone()), call.caller, file),
        };
        types
            .into_iter()
            .flat_map(|ty| {
                let type_name = self.tree[ty].name.clone();
                self.tree.children(ty).iter().copied().filter(move |c| {
                    let scope = &self.tree[*c];
                    scope.as_method().is_some_and(|m| {
                        m.is_constructor || scope.name == type_name || scope.name == "__init__"
                    })
                })
            })
            .collect()
    }

    /// Types a call evaluates to, from its best candidates.
    fn call_result_types(&self, call: &MethodCall) -> Vec<ScopeId> {
        let file = call.location.file();
        if call.is_constructor {
            return self.constructor_types(call);
        }
        let mut out = Vec::new();
        for candidate in self.resolve_call(call).into_vec() {
            let Some(def) = self.tree[candidate].as_method() else {
                continue;
            };
            let from = self.tree.parent(candidate).unwrap_or(self.tree.root());
            for ty in self.resolve_type(&def.return_type, from, file) {
                if !out.contains(&ty) {
                    out.push(ty);
                }
            }
        }
        out
    }

    fn constructor_types(&self, call: &MethodCall) -> Vec<ScopeId> {
        let prefix = match &call.calling_object {
            Some(CallingObject::Path(prefix)) => prefix.clone(),
            _ => Vec::new(),
        };
        let ty = TypeUse::named(call.name.clone()).with_prefix(prefix);
        self.resolve_type(&ty, call.caller, call.location.file())
    }

    // ------------------------------------------------------------------------
    // Argument typing and ranking
    // ------------------------------------------------------------------------

    fn argument_type(&self, argument: &Argument, call: &MethodCall) -> TypeUse {
        match argument {
            Argument::Literal { kind, text } => self.parser(call.caller).literal_type(*kind, text),
            Argument::Name(name) => self
                .declarations_for(name, &call.location, call.caller)
                .first()
                .map(|d| d.declared_type.clone())
                .unwrap_or_default(),
            Argument::Call(inner) if inner.is_constructor => {
                let prefix = match &inner.calling_object {
                    Some(CallingObject::Path(prefix)) => prefix.clone(),
                    _ => Vec::new(),
                };
                TypeUse::named(inner.name.clone()).with_prefix(prefix)
            }
            Argument::Call(inner) => match self.resolve_call(inner) {
                ResolveResult::Found(method) => self.tree[method]
                    .as_method()
                    .map(|m| m.return_type.clone())
                    .unwrap_or_default(),
                _ => TypeUse::Unknown,
            },
            Argument::Other => TypeUse::Unknown,
        }
    }

    fn rank(&self, method: ScopeId, argument_types: &[TypeUse], call: &MethodCall) -> MatchRank {
        let Some(def) = self.tree[method].as_method() else {
            return MatchRank::ArityOnly;
        };
        let mut all_exact = true;
        for (argument, parameter) in argument_types.iter().zip(&def.parameters) {
            match self.compare(argument, &parameter.declared_type, call) {
                ArgumentMatch::Exact => {}
                ArgumentMatch::Convertible => all_exact = false,
                ArgumentMatch::Mismatch => return MatchRank::ArityOnly,
            }
        }
        if all_exact {
            MatchRank::Exact
        } else {
            MatchRank::Compatible
        }
    }

    fn compare(&self, argument: &TypeUse, parameter: &TypeUse, call: &MethodCall) -> ArgumentMatch {
        let (Some(arg), Some(param)) = (argument.as_named(), parameter.as_named()) else {
            return ArgumentMatch::Convertible;
        };
        if same_type(arg, param) {
            return ArgumentMatch::Exact;
        }
        let parser = self.parser(call.caller);
        if parser.is_numeric(&arg.name) && parser.is_numeric(&param.name) {
            return ArgumentMatch::Convertible;
        }
        let file = call.location.file();
        let arg_types = self.resolve_type(argument, call.caller, file);
        if !arg_types.is_empty() {
            let targets = self.resolve_type(parameter, call.caller, file);
            let reaches = self
                .with_bases(&arg_types)
                .into_iter()
                .any(|t| targets.contains(&t) || (targets.is_empty() && self.tree[t].name == param.name));
            if reaches {
                return ArgumentMatch::Convertible;
            }
        }
        ArgumentMatch::Mismatch
    }
}

/// Same name, and prefixes agree where both are given.
fn same_type(a: &NamedType, b: &NamedType) -> bool {
    a.name == b.name && (a.prefix.is_empty() || b.prefix.is_empty() || a.prefix == b.prefix)
}

/// Declarations of `name` in one non-type scope that are visible from `at`.
///
/// A same-file declaration must start before the use and the closest one
/// wins. Declarations from other files are only visible at namespace level.
fn visible_in<'a>(scope: &'a Scope, name: &str, at: &SourceLocation) -> Vec<&'a VariableDeclaration> {
    let matching = || scope.variables.iter().filter(move |v| v.name == name);
    let closest = matching()
        .filter(|v| v.location.precedes(at))
        .max_by(|a, b| a.location.position_cmp(&b.location));
    if let Some(declaration) = closest {
        return vec![declaration];
    }
    if scope.kind != ScopeKind::Namespace {
        return Vec::new();
    }
    let mut others: Vec<_> = matching().filter(|v| v.location.file() != at.file()).collect();
    others.sort_by(|a, b| a.location.cmp(&b.location));
    others
}

// ============================================================================
// LOCATION ENTRY POINTS
// ============================================================================

/// The variable use covering `location`, innermost first.
pub fn use_at<'a>(tree: &'a ScopeTree, location: &SourceLocation) -> Option<&'a VariableUse> {
    let scope = tree.scope_for_location(location)?;
    tree.ancestors(scope)
        .flat_map(|s| tree[s].uses.iter())
        .filter(|u| u.location.contains(location))
        .max_by(|a, b| a.location.position_cmp(&b.location))
}

/// Calls whose location covers `location`, innermost first.
pub fn calls_at<'a>(tree: &'a ScopeTree, location: &SourceLocation) -> Vec<&'a MethodCall> {
    let Some(scope) = tree.scope_for_location(location) else {
        return Vec::new();
    };
    let mut calls: Vec<&MethodCall> = tree
        .ancestors(scope)
        .flat_map(|s| tree[s].calls.iter())
        .filter(|c| c.location.contains(location))
        .collect();
    calls.sort_by(|a, b| {
        b.location
            .position_cmp(&a.location)
            .then_with(|| a.location.end().cmp(&b.location.end()))
    });
    calls
}

/// Declarations for the variable used at `location`.
///
/// Empty when there is no use there or it does not resolve.
pub fn declaration_for_use(tree: &ScopeTree, location: &SourceLocation) -> Vec<VariableDeclaration> {
    let Some(usage) = use_at(tree, location) else {
        return Vec::new();
    };
    Resolver::new(tree)
        .declarations_for(&usage.name, &usage.location, usage.scope)
        .into_iter()
        .cloned()
        .collect()
}

/// Candidate method definitions for the innermost call at `location`.
pub fn definitions_for_call(tree: &ScopeTree, location: &SourceLocation) -> Vec<CallCandidate> {
    match calls_at(tree, location).first() {
        Some(call) => Resolver::new(tree).candidates(call),
        None => Vec::new(),
    }
}

#[cfg(all(test, feature = "srcml"))]
mod tests {
    use super::*;
    use crate::hir::{build, merge_file};
    use crate::syntax::srcml::parse_str;

    const NS: &str = r#"xmlns="http://www.srcML.org/srcML/src" xmlns:cpp="http://www.srcML.org/srcML/cpp""#;

    fn global(units: &[(&str, String)]) -> ScopeTree {
        let mut tree = ScopeTree::new();
        for (file, xml) in units {
            let unit = parse_str(xml, None)
                .expect("valid srcML")
                .into_iter()
                .next()
                .expect("one unit");
            let built = build(&unit).expect("builds");
            merge_file(&mut tree, &built, file).expect("merges");
        }
        tree
    }

    fn method_scope(tree: &ScopeTree, name: &str) -> Vec<ScopeId> {
        tree.iter()
            .filter(|(_, s)| s.kind == ScopeKind::Method && s.name == name)
            .map(|(id, _)| id)
            .collect()
    }

    #[test]
    fn test_shadowing_picks_innermost_preceding() {
        let xml = format!(
            r#"<unit {NS} language="C++" filename="s.cpp"><function><type><name>void</name></type> <name>f</name><parameter_list>()</parameter_list> <block>{{<block_content>
  <decl_stmt><decl><type><name>int</name></type> <name>x</name> <init>= <expr><literal type="number">1</literal></expr></init></decl>;</decl_stmt>
  <block>{{<block_content>
    <decl_stmt><decl><type><name>double</name></type> <name>x</name> <init>= <expr><literal type="number">2.0</literal></expr></init></decl>;</decl_stmt>
    <expr_stmt><expr><call><name>g</name><argument_list>(<argument><expr><name>x</name></expr></argument>)</argument_list></call></expr>;</expr_stmt>
  </block_content>}}</block>
  <expr_stmt><expr><call><name>g</name><argument_list>(<argument><expr><name>x</name></expr></argument>)</argument_list></call></expr>;</expr_stmt>
</block_content>}}</block></function>
</unit>"#
        );
        let tree = global(&[("s.cpp", xml)]);

        let inner = declaration_for_use(&tree, &SourceLocation::new("s.cpp", 5, 7));
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].declared_type, TypeUse::builtin("double"));

        let outer = declaration_for_use(&tree, &SourceLocation::new("s.cpp", 7, 5));
        assert_eq!(outer.len(), 1);
        assert_eq!(outer[0].declared_type, TypeUse::builtin("int"));
        assert_eq!(outer[0].location.start_line(), 2);
    }

    #[test]
    fn test_member_lookup_walks_base_types() {
        let xml = format!(
            r#"<unit {NS} language="C++" filename="b.cpp"><class>class <name>Base</name> <block>{{<private type="default">
<decl_stmt><decl><type><name>int</name></type> <name>count</name></decl>;</decl_stmt>
</private>}}</block>;</class>
<class>class <name>Derived</name> <super_list>: <super><specifier>public</specifier> <name>Base</name></super></super_list> <block>{{<public>public:
<function><type><name>int</name></type> <name>get</name><parameter_list>()</parameter_list> <block>{{<block_content> <return>return <expr><name>count</name></expr>;</return> </block_content>}}</block></function>
</public>}}</block>;</class>
</unit>"#
        );
        let tree = global(&[("b.cpp", xml)]);
        let found = declaration_for_use(&tree, &SourceLocation::new("b.cpp", 5, 20));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "count");
        assert_eq!(found[0].location.start_line(), 2);
    }

    #[test]
    fn test_overloads_ranked_by_argument_type() {
        let xml = format!(
            r#"<unit {NS} language="C++" filename="o.cpp"><function_decl><type><name>void</name></type> <name>put</name><parameter_list>(<parameter><decl><type><name>int</name></type> <name>a</name></decl></parameter>)</parameter_list>;</function_decl>
<function_decl><type><name>void</name></type> <name>put</name><parameter_list>(<parameter><decl><type><name>Widget</name></type> <name>w</name></decl></parameter>)</parameter_list>;</function_decl>
<function_decl><type><name>void</name></type> <name>put</name><parameter_list>(<parameter><decl><type><name>int</name></type> <name>a</name></decl></parameter>, <parameter><decl><type><name>int</name></type> <name>b</name></decl></parameter>)</parameter_list>;</function_decl>
<function><type><name>void</name></type> <name>run</name><parameter_list>()</parameter_list> <block>{{<block_content> <expr_stmt><expr><call><name>put</name><argument_list>(<argument><expr><literal type="number">7</literal></expr></argument>)</argument_list></call></expr>;</expr_stmt> </block_content>}}</block></function>
</unit>"#
        );
        let tree = global(&[("o.cpp", xml)]);
        let candidates = definitions_for_call(&tree, &SourceLocation::new("o.cpp", 4, 15));
        assert_eq!(candidates.len(), 2, "two-parameter overload filtered by arity");
        assert_eq!(candidates[0].rank, MatchRank::Exact);
        assert_eq!(tree[candidates[0].scope].location().map(|l| l.start_line()), Some(1));
        assert_eq!(candidates[1].rank, MatchRank::ArityOnly);
    }

    #[test]
    fn test_default_parameters_widen_arity() {
        let xml = format!(
            r#"<unit {NS} language="C++" filename="d.cpp"><function_decl><type><name>void</name></type> <name>log</name><parameter_list>(<parameter><decl><type><name>int</name></type> <name>level</name></decl></parameter>, <parameter><decl><type><name>int</name></type> <name>flags</name> <init>= <expr><literal type="number">0</literal></expr></init></decl></parameter>)</parameter_list>;</function_decl>
<function><type><name>void</name></type> <name>run</name><parameter_list>()</parameter_list> <block>{{<block_content> <expr_stmt><expr><call><name>log</name><argument_list>(<argument><expr><literal type="number">1</literal></expr></argument>)</argument_list></call></expr>;</expr_stmt> </block_content>}}</block></function>
</unit>"#
        );
        let tree = global(&[("d.cpp", xml)]);
        let call = tree
            .iter()
            .flat_map(|(_, s)| s.calls.iter())
            .find(|c| c.name == "log")
            .expect("call recorded");
        let result = Resolver::new(&tree).resolve_call(call);
        assert_eq!(result.found().copied(), method_scope(&tree, "log").first().copied());
    }

    #[test]
    fn test_this_call_searches_base_types_and_tolerates_cycles() {
        let xml = format!(
            r#"<unit {NS} language="Java" filename="C.java"><class>class <name>A</name> <super_list><extends>extends <super><name>B</name></super></extends></super_list> <block>{{
<function><type><name>void</name></type> <name>helper</name><parameter_list>()</parameter_list> <block>{{<block_content> </block_content>}}</block></function>
}}</block></class>
<class>class <name>B</name> <super_list><extends>extends <super><name>A</name></super></extends></super_list> <block>{{
<function><type><name>void</name></type> <name>go</name><parameter_list>()</parameter_list> <block>{{<block_content> <expr_stmt><expr><call><name><name>this</name><operator>.</operator><name>helper</name></name><argument_list>()</argument_list></call></expr>;</expr_stmt> </block_content>}}</block></function>
}}</block></class>
</unit>"#
        );
        let tree = global(&[("C.java", xml)]);
        let call = tree
            .iter()
            .flat_map(|(_, s)| s.calls.iter())
            .find(|c| c.name == "helper")
            .expect("call recorded");
        assert_eq!(call.calling_object, Some(CallingObject::This));
        let result = Resolver::new(&tree).resolve_call(call);
        assert_eq!(result.found().copied(), method_scope(&tree, "helper").first().copied());
    }

    #[test]
    fn test_unresolved_call_is_not_found() {
        let xml = format!(
            r#"<unit {NS} language="C" filename="u.c"><function><type><name>int</name></type> <name>main</name><parameter_list>()</parameter_list> <block>{{<block_content> <expr_stmt><expr><call><name>printf</name><argument_list>(<argument><expr><literal type="string">"hi"</literal></expr></argument>)</argument_list></call></expr>;</expr_stmt> </block_content>}}</block></function>
</unit>"#
        );
        let tree = global(&[("u.c", xml)]);
        let call = &tree.iter().flat_map(|(_, s)| s.calls.iter()).next().expect("call");
        assert!(Resolver::new(&tree).resolve_call(call).is_not_found());
        assert!(definitions_for_call(&tree, &SourceLocation::new("u.c", 1, 200)).is_empty());
    }

    #[test]
    fn test_resolve_result_from_candidates() {
        assert_eq!(ResolveResult::<u8>::from_candidates(vec![]), ResolveResult::NotFound);
        assert_eq!(ResolveResult::from_candidates(vec![1]), ResolveResult::Found(1));
        assert!(ResolveResult::from_candidates(vec![1, 2]).is_ambiguous());
        assert_eq!(ResolveResult::from_candidates(vec![1, 2]).into_vec(), vec![1, 2]);
    }
}
