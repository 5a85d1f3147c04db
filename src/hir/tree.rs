//! The scope arena.
//!
//! A [`ScopeTree`] owns every [`Scope`] of one tree in a flat table indexed by
//! [`ScopeId`]. Parents own their children exclusively; back-references are
//! plain ids. The same type holds a single file's tree (built by
//! [`build`](super::build)) and the working set's merged global tree.

use std::ops::{Index, IndexMut};

use smol_str::SmolStr;

use super::ids::ScopeId;
use super::model::{Scope, ScopeDetail, ScopeKind};
use crate::base::SourceLocation;
use crate::syntax::Language;

#[derive(Clone, Debug)]
pub struct ScopeTree {
    slots: Vec<Option<Scope>>,
    free: Vec<u32>,
    live: usize,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Create a tree containing only the unnamed global namespace.
    pub fn new() -> Self {
        Self::with_root(Scope::new(ScopeKind::Namespace, "", Language::Any))
    }

    pub fn with_root(root: Scope) -> Self {
        Self {
            slots: vec![Some(root)],
            free: Vec::new(),
            live: 1,
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn contains_id(&self, id: ScopeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live scopes, including the root.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// All live scopes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (ScopeId::new(i as u32), s)))
    }

    fn alloc(&mut self, scope: Scope) -> ScopeId {
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(scope);
                ScopeId::new(index)
            }
            None => {
                self.slots.push(Some(scope));
                ScopeId::new((self.slots.len() - 1) as u32)
            }
        }
    }

    /// Append `scope` as the last child of `parent`.
    pub fn add_child(&mut self, parent: ScopeId, mut scope: Scope) -> ScopeId {
        scope.parent = Some(parent);
        scope.children.clear();
        let id = self.alloc(scope);
        if let Some(parent) = self.get_mut(parent) {
            parent.children.push(id);
        }
        id
    }

    /// Detach `id` from its parent and free it together with its subtree.
    ///
    /// The root cannot be removed.
    pub fn remove_subtree(&mut self, id: ScopeId) {
        if id == self.root() {
            return;
        }
        if let Some(parent) = self.get(id).and_then(|s| s.parent) {
            if let Some(parent) = self.get_mut(parent) {
                parent.children.retain(|c| *c != id);
            }
        }
        for doomed in self.descendants(id) {
            if let Some(slot) = self.slots.get_mut(doomed.index()) {
                if slot.take().is_some() {
                    self.live -= 1;
                    self.free.push(doomed.0);
                }
            }
        }
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id).and_then(|s| s.parent)
    }

    pub fn children(&self, id: ScopeId) -> &[ScopeId] {
        self.get(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    /// `id` followed by its parent chain up to the root.
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(self.get(id).map(|_| id), move |current| self.parent(*current))
    }

    /// `id` and every scope below it, parents before children.
    pub fn descendants(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut out = Vec::new();
        if !self.contains_id(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Names from the outermost named scope down to `id`, skipping unnamed scopes.
    pub fn qualified_name(&self, id: ScopeId) -> Vec<SmolStr> {
        let mut names: Vec<SmolStr> = self
            .ancestors(id)
            .filter_map(|a| self.get(a))
            .filter(|s| !s.name.is_empty())
            .map(|s| s.name.clone())
            .collect();
        names.reverse();
        names
    }

    /// [`qualified_name`](Self::qualified_name) joined with the separator of
    /// the scope's language (`a::b::C`, `a.b.C`).
    pub fn qualified_path(&self, id: ScopeId) -> String {
        let separator = self
            .get(id)
            .map_or("::", |s| s.language.scope_separator());
        self.qualified_name(id).join(separator)
    }

    /// Nearest ancestor-or-self of `id` with the given kind.
    pub fn enclosing(&self, id: ScopeId, kind: ScopeKind) -> Option<ScopeId> {
        self.ancestors(id)
            .find(|a| self.get(*a).is_some_and(|s| s.kind == kind))
    }

    /// Children of `parent` named `name` with the given kind.
    pub fn named_children(
        &self,
        parent: ScopeId,
        kind: ScopeKind,
        name: &str,
    ) -> impl Iterator<Item = ScopeId> + '_ {
        let name = SmolStr::from(name);
        self.children(parent)
            .iter()
            .copied()
            .filter(move |c| {
                self.get(*c)
                    .is_some_and(|s| s.kind == kind && s.name == name)
            })
    }

    /// The most deeply nested scope whose location contains `location`.
    ///
    /// Only locations in the same file count. When several siblings contain the
    /// location, the one starting last wins, and among equal starts the later
    /// sibling. Returns `None` when the root does not contain the location.
    pub fn scope_for_location(&self, location: &SourceLocation) -> Option<ScopeId> {
        let root = self.root();
        if !self.get(root)?.contains(location) {
            return None;
        }
        let mut current = root;
        loop {
            let next = self
                .children(current)
                .iter()
                .copied()
                .filter_map(|c| {
                    let scope = self.get(c)?;
                    let start = scope
                        .locations()
                        .iter()
                        .filter(|l| l.contains(location))
                        .map(SourceLocation::start)
                        .max()?;
                    Some((start, c))
                })
                .max_by(|(a, _), (b, _)| a.cmp(b));
            match next {
                Some((_, child)) => current = child,
                None => return Some(current),
            }
        }
    }

    /// A sorted structural outline: one line per scope, declaration, call and use.
    ///
    /// Two trees with equal outlines hold the same entities with the same
    /// details at the same locations, regardless of arena layout.
    pub fn outline(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (id, scope) in self.iter() {
            let path = self.qualified_name(id).join("::");
            let mut locations: Vec<_> = scope.locations().iter().map(|l| format!("{:?}", l)).collect();
            locations.sort();
            lines.push(format!(
                "{} {} [{}]{}",
                scope.describe(),
                path,
                locations.join(", "),
                outline_detail(&scope.detail)
            ));
            for var in &scope.variables {
                lines.push(format!("  var {}::{}: {} @{:?}", path, var.name, var.declared_type, var.location));
            }
            for call in &scope.calls {
                lines.push(format!("  call {}::{}/{} @{:?}", path, call.name, call.arguments.len(), call.location));
            }
            for import in &scope.imports {
                let alias = import.alias.as_ref().map(|a| format!(" as {}", a)).unwrap_or_default();
                lines.push(format!(
                    "  import {}::{}{} @{:?}",
                    path,
                    import.path.join("."),
                    alias,
                    import.location
                ));
            }
            for use_site in &scope.uses {
                lines.push(format!("  use {}::{} @{:?}", path, use_site.name, use_site.location));
            }
        }
        lines.sort();
        lines
    }
}

fn outline_detail(detail: &ScopeDetail) -> String {
    match detail {
        ScopeDetail::None => String::new(),
        ScopeDetail::Type(def) => {
            let mut bases: Vec<_> = def.base_types.iter().map(ToString::to_string).collect();
            bases.sort();
            let partial = if def.is_partial { " partial" } else { "" };
            format!(" : [{}]{}", bases.join(", "), partial)
        }
        ScopeDetail::Method(def) => {
            let parameters: Vec<_> = def
                .parameters
                .iter()
                .map(|p| {
                    let default = if p.has_default { "=" } else { "" };
                    format!("{}: {}{}", p.name, p.declared_type, default)
                })
                .collect();
            let mut definitions: Vec<_> =
                def.definition_locations.iter().map(|l| format!("{:?}", l)).collect();
            definitions.sort();
            format!(
                " ({}) -> {} body={} defs=[{}]",
                parameters.join(", "),
                def.return_type,
                def.has_body,
                definitions.join(", ")
            )
        }
    }
}

impl Index<ScopeId> for ScopeTree {
    type Output = Scope;

    /// Panics if `id` is not a live scope of this tree.
    fn index(&self, id: ScopeId) -> &Scope {
        match self.get(id) {
            Some(scope) => scope,
            None => panic!("{:?} is not a live scope", id),
        }
    }
}

impl IndexMut<ScopeId> for ScopeTree {
    fn index_mut(&mut self, id: ScopeId) -> &mut Scope {
        match self.get_mut(id) {
            Some(scope) => scope,
            None => panic!("{:?} is not a live scope", id),
        }
    }
}
