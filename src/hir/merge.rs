//! Global Merge: folding per-file scope trees into the shared tree.
//!
//! Namespaces merge by qualified name. Types merge by qualified name when
//! their kinds are compatible and the language allows it (C++ always, C#
//! only `partial` types, Java never). Methods, blocks and lambdas never merge;
//! they are added as siblings and overloads are sorted out during resolution.
//!
//! A file's contribution is identified purely by location: every scope,
//! declaration and use site carries the file it came from. Merged type
//! definitions additionally keep one part per contributing file.

use tracing::{debug, trace};

use super::ids::ScopeId;
use super::model::{
    Argument, CallingObject, MethodCall, Scope, ScopeDetail, ScopeKind, TypeDefinition, TypeKind,
};
use super::tree::ScopeTree;
use crate::error::MergeConflict;
use crate::syntax::Language;

/// Replace the contribution of `file` in `global` with `incoming`.
///
/// Conflicts are detected before anything is touched; on error `global` is
/// unchanged. Returns the number of scopes added to `global`.
pub fn merge_file(
    global: &mut ScopeTree,
    incoming: &ScopeTree,
    file: &str,
) -> Result<usize, MergeConflict> {
    check_conflicts(global, incoming, file)?;
    let removed = remove_file(global, file);

    let mut merger = Merger {
        global,
        incoming,
        file,
        added: 0,
    };
    let root = merger.global.root();
    merger.absorb(root, incoming.root());
    for &child in incoming.children(incoming.root()) {
        merger.merge_child(root, child);
    }

    debug!(file, added = merger.added, removed, "merged file");
    Ok(merger.added)
}

/// Remove every location, declaration and use site of `file` from `global`.
///
/// Scopes left without any location are dropped with their subtrees; the
/// root is kept. Returns the number of scopes dropped.
pub fn remove_file(global: &mut ScopeTree, file: &str) -> usize {
    let root = global.root();
    let before = global.len();
    for id in global.descendants(root) {
        let Some(scope) = global.get_mut(id) else {
            // Freed together with an ancestor.
            continue;
        };
        scope.locations.retain(|l| l.file() != file);
        if id != root && scope.locations.is_empty() {
            global.remove_subtree(id);
            continue;
        }
        scope.variables.retain(|v| v.location.file() != file);
        scope.calls.retain(|c| c.location.file() != file);
        scope.uses.retain(|u| u.location.file() != file);
        scope.imports.retain(|i| i.location.file() != file);
        if let Some(def) = scope.as_method_mut() {
            def.definition_locations.retain(|l| l.file() != file);
        }
        if let Some(def) = scope.as_type_mut() {
            def.remove_part(file);
        }
    }
    let removed = before - global.len();
    trace!(file, removed, "removed file contribution");
    removed
}

/// Whether `scope` has a location outside `file`, i.e. survives removing `file`.
fn contributed_elsewhere(scope: &Scope, file: &str) -> bool {
    scope.locations().iter().any(|l| l.file() != file)
}

/// Whether the language has namespaces that may clash with type names.
fn has_namespaces(language: Language) -> bool {
    matches!(language, Language::CPlusPlus | Language::CSharp | Language::Any)
}

/// Whether an incoming type joins an existing same-named type.
fn types_merge(a: &TypeDefinition, incoming: &Scope) -> bool {
    if incoming.name.is_empty() {
        return false;
    }
    let Some(b) = incoming.as_type() else {
        return false;
    };
    if !a.kind.is_compatible(b.kind) {
        return false;
    }
    if a.kind == TypeKind::Unknown || b.kind == TypeKind::Unknown {
        return true;
    }
    match incoming.language {
        Language::Java | Language::AspectJ => false,
        Language::CSharp => a.is_partial && b.is_partial,
        _ => true,
    }
}

fn qualified(tree: &ScopeTree, id: ScopeId) -> String {
    tree.qualified_path(id)
}

/// Check that merging `incoming` (after removing `file`) would not clash.
pub fn check_conflicts(
    global: &ScopeTree,
    incoming: &ScopeTree,
    file: &str,
) -> Result<(), MergeConflict> {
    Checker {
        global,
        incoming,
        file,
    }
    .check(global.root(), incoming.root())
}

struct Checker<'a> {
    global: &'a ScopeTree,
    incoming: &'a ScopeTree,
    file: &'a str,
}

impl Checker<'_> {
    fn survivors(&self, parent: ScopeId, kind: ScopeKind, name: &str) -> Vec<ScopeId> {
        self.global
            .named_children(parent, kind, name)
            .filter(|id| contributed_elsewhere(&self.global[*id], self.file))
            .collect()
    }

    /// The type definition of `id` once `file` has been taken out of it.
    fn surviving_type(&self, id: ScopeId) -> Option<TypeDefinition> {
        self.global[id].as_type().map(|def| def.without(self.file))
    }

    fn conflict(&self, existing: ScopeId, incoming: ScopeId) -> MergeConflict {
        let existing_scope = &self.global[existing];
        let other_file = existing_scope
            .locations()
            .iter()
            .find(|l| l.file() != self.file)
            .map(|l| l.file().to_string())
            .unwrap_or_default();
        let incoming_scope = &self.incoming[incoming];
        MergeConflict {
            file: self.file.into(),
            qualified_name: qualified(self.incoming, incoming),
            existing: format!("{} from {}", existing_scope.describe(), other_file),
            incoming: incoming_scope.describe(),
            location: incoming_scope.location().cloned(),
        }
    }

    fn check(&self, global_parent: ScopeId, incoming_parent: ScopeId) -> Result<(), MergeConflict> {
        for &child in self.incoming.children(incoming_parent) {
            let scope = &self.incoming[child];
            match scope.kind {
                ScopeKind::Namespace => {
                    if has_namespaces(scope.language) {
                        let clash = self
                            .survivors(global_parent, ScopeKind::Type, &scope.name)
                            .into_iter()
                            .find(|t| {
                                self.surviving_type(*t)
                                    .is_some_and(|def| def.kind != TypeKind::Unknown)
                            });
                        if let Some(existing) = clash {
                            return Err(self.conflict(existing, child));
                        }
                    }
                    if let Some(&existing) = self
                        .survivors(global_parent, ScopeKind::Namespace, &scope.name)
                        .first()
                    {
                        self.check(existing, child)?;
                    }
                }
                ScopeKind::Type if !scope.name.is_empty() => {
                    let existing = self.survivors(global_parent, ScopeKind::Type, &scope.name);
                    if let Some(&target) = existing
                        .iter()
                        .find(|e| {
                            self.surviving_type(**e)
                                .is_some_and(|def| types_merge(&def, scope))
                        })
                    {
                        self.check(target, child)?;
                        continue;
                    }
                    let kind = scope.as_type().map(|d| d.kind);
                    if scope.language.has_unique_types() {
                        let duplicate = existing
                            .iter()
                            .find(|e| self.surviving_type(**e).map(|d| d.kind) == kind);
                        if let Some(&duplicate) = duplicate {
                            return Err(self.conflict(duplicate, child));
                        }
                    }
                    if kind != Some(TypeKind::Unknown) && has_namespaces(scope.language) {
                        if let Some(&namespace) = self
                            .survivors(global_parent, ScopeKind::Namespace, &scope.name)
                            .first()
                        {
                            return Err(self.conflict(namespace, child));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

struct Merger<'a> {
    global: &'a mut ScopeTree,
    incoming: &'a ScopeTree,
    file: &'a str,
    added: usize,
}

fn rehome_call(call: &mut MethodCall, scope: ScopeId) {
    call.caller = scope;
    for argument in &mut call.arguments {
        if let Argument::Call(inner) = argument {
            rehome_call(inner, scope);
        }
    }
    if let Some(CallingObject::Call(inner)) = &mut call.calling_object {
        rehome_call(inner, scope);
    }
}

impl Merger<'_> {
    /// Copy locations and entities of `source` into the global scope `target`.
    fn absorb(&mut self, target: ScopeId, source: ScopeId) {
        let source = &self.incoming[source];
        let scope = &mut self.global[target];
        for location in source.locations() {
            scope.add_location(location.clone());
        }
        scope.variables.extend(source.variables.iter().cloned().map(|mut v| {
            v.owner = target;
            v
        }));
        scope.calls.extend(source.calls.iter().cloned().map(|mut c| {
            rehome_call(&mut c, target);
            c
        }));
        scope.uses.extend(source.uses.iter().cloned().map(|mut u| {
            u.scope = target;
            u
        }));
        scope.imports.extend(source.imports.iter().cloned());
    }

    fn find_target(&self, parent: ScopeId, source: &Scope) -> Option<ScopeId> {
        match source.kind {
            ScopeKind::Namespace => self
                .global
                .named_children(parent, ScopeKind::Namespace, &source.name)
                .next()
                .or_else(|| {
                    // A placeholder from `void ns::f()` seen before `namespace ns`.
                    self.global
                        .named_children(parent, ScopeKind::Type, &source.name)
                        .find(|t| {
                            self.global[*t]
                                .as_type()
                                .is_some_and(|d| d.kind == TypeKind::Unknown)
                        })
                }),
            ScopeKind::Type => {
                let is_placeholder = source
                    .as_type()
                    .is_some_and(|d| d.kind == TypeKind::Unknown);
                self.global
                    .named_children(parent, ScopeKind::Type, &source.name)
                    .find(|t| {
                        self.global[*t]
                            .as_type()
                            .is_some_and(|def| types_merge(def, source))
                    })
                    .or_else(|| {
                        is_placeholder
                            .then(|| {
                                self.global
                                    .named_children(parent, ScopeKind::Namespace, &source.name)
                                    .next()
                            })
                            .flatten()
                    })
            }
            _ => None,
        }
    }

    fn merge_child(&mut self, parent: ScopeId, source_id: ScopeId) {
        let incoming = self.incoming;
        let source = &incoming[source_id];

        let target = match self.find_target(parent, source) {
            Some(existing) => existing,
            None => {
                self.added += 1;
                let detail = match &source.detail {
                    ScopeDetail::Type(def) => ScopeDetail::Type(TypeDefinition::new(
                        def.kind,
                        Vec::new(),
                        false,
                    )),
                    other => other.clone(),
                };
                let scope = Scope::new(source.kind, source.name.clone(), source.language)
                    .with_detail(detail);
                self.global.add_child(parent, scope)
            }
        };

        self.merge_detail(target, source);
        self.absorb(target, source_id);
        for &child in incoming.children(source_id) {
            self.merge_child(target, child);
        }
    }

    fn merge_detail(&mut self, target: ScopeId, source: &Scope) {
        let scope = &mut self.global[target];
        if scope.kind == ScopeKind::Type && source.kind == ScopeKind::Namespace {
            // A placeholder type turns out to be a namespace.
            scope.kind = ScopeKind::Namespace;
            scope.detail = ScopeDetail::None;
            return;
        }
        if let (Some(existing), Some(incoming)) = (scope.as_type_mut(), source.as_type()) {
            existing.add_part(self.file, incoming);
        }
    }
}
