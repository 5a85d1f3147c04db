//! Scope Tree Builder: one [`ParsedUnit`] to one per-file [`ScopeTree`].
//!
//! A recursive descent over the srcML elements of the unit:
//!
//! - namespaces, types, methods, blocks, control statements and lambdas open
//!   child scopes
//! - declarations are appended to the enclosing scope
//! - calls and plain-name uses are appended to the innermost enclosing scope
//!
//! Unknown elements are descended into transparently, so wrappers such as
//! `block_content`, `if_stmt` or C++ access regions need no special casing.

use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{debug, trace};

use super::ids::ScopeId;
use super::language::{SignatureParser, parser_for};
use super::model::{
    Argument, CallingObject, LiteralKind, MethodCall, MethodDefinition, NamespaceImport,
    Parameter, Scope, ScopeDetail, ScopeKind, TypeDefinition, TypeKind, TypeUse,
    VariableDeclaration, VariableUse,
};
use super::tree::ScopeTree;
use crate::base::SourceLocation;
use crate::error::ParseError;
use crate::syntax::{Language, ParsedUnit, SyntaxNode};

/// Build the scope tree of a single translation unit.
///
/// The root of the returned tree is an unnamed namespace spanning the whole
/// unit. Errors are confined to this unit.
pub fn build(unit: &ParsedUnit) -> Result<ScopeTree, ParseError> {
    if !unit.root.is("unit") {
        return Err(ParseError::new(
            unit.path.clone(),
            format!("expected a <unit> element, found <{}>", unit.root.tag()),
        ));
    }

    let file = unit.path.clone();
    let root = Scope::new(ScopeKind::Namespace, "", unit.language)
        .with_location(unit.root.location(&file));
    let mut builder = Builder {
        file,
        language: unit.language,
        parser: parser_for(unit.language),
        tree: ScopeTree::with_root(root),
    };
    builder.visit_children(&unit.root, ScopeId::ROOT)?;

    debug!(file = %unit.path, scopes = builder.tree.len(), "built scope tree");
    Ok(builder.tree)
}

struct Builder {
    file: Arc<str>,
    language: Language,
    parser: &'static dyn SignatureParser,
    tree: ScopeTree,
}

fn is_method_tag(tag: &str) -> bool {
    matches!(
        tag,
        "function" | "constructor" | "destructor" | "function_decl" | "constructor_decl" | "destructor_decl"
    )
}

fn is_control_tag(tag: &str) -> bool {
    matches!(
        tag,
        "for" | "foreach" | "while" | "catch" | "using_stmt" | "lock" | "synchronized"
    )
}

/// Elements that must be handled as statements even when nested in an expression.
fn is_structural_tag(tag: &str) -> bool {
    is_method_tag(tag)
        || is_control_tag(tag)
        || TypeKind::from_tag(tag).is_some()
        || matches!(tag, "namespace" | "block" | "decl_stmt" | "decl")
}

/// The leading identifier of a name element (`arr` for `arr[10]`).
fn identifier(node: &SyntaxNode) -> SmolStr {
    let text = node.text();
    let trimmed = text.trim();
    let end = trimmed
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(trimmed.len());
    SmolStr::from(&trimmed[..end])
}

impl Builder {
    fn location(&self, node: &SyntaxNode) -> SourceLocation {
        node.location(&self.file)
    }

    fn error(&self, node: &SyntaxNode, reason: impl Into<String>) -> ParseError {
        ParseError::new(self.file.clone(), reason).at(self.location(node))
    }

    fn new_scope(&self, kind: ScopeKind, name: impl Into<SmolStr>, node: &SyntaxNode) -> Scope {
        Scope::new(kind, name, self.language).with_location(self.location(node))
    }

    fn is_keyword(&self, name: &str) -> bool {
        name == self.parser.this_keyword()
            || Some(name) == self.parser.base_keyword()
            || matches!(name, "nullptr" | "NULL" | "null" | "None" | "true" | "false")
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn visit_children(&mut self, node: &SyntaxNode, scope: ScopeId) -> Result<(), ParseError> {
        let mut target = scope;
        for child in node.child_nodes() {
            let file_scoped = child.is("package")
                || (self.language == Language::CSharp
                    && child.is("namespace")
                    && child.child("block").is_none()
                    && child.child("init").is_none());
            if file_scoped {
                // Applies to the remaining siblings.
                target = self.file_scoped_namespace(child, node, scope)?;
                continue;
            }
            self.visit(child, target)?;
        }
        Ok(())
    }

    fn visit(&mut self, node: &SyntaxNode, scope: ScopeId) -> Result<(), ParseError> {
        match node.tag() {
            "namespace" => self.namespace(node, scope),
            tag if TypeKind::from_tag(tag).is_some() => self.type_definition(node, scope),
            tag if is_method_tag(tag) => self.method(node, scope),
            tag if is_control_tag(tag) => self.control(node, scope),
            "block" => {
                let block = self.new_scope(ScopeKind::Block, "", node);
                let id = self.tree.add_child(scope, block);
                self.visit_children(node, id)
            }
            "lambda" => self.lambda(node, scope),
            "decl_stmt" => self.decl_stmt(node, scope),
            "decl" => self.declaration(node, scope, &TypeUse::Unknown).map(|_| ()),
            "property" => {
                self.declaration(node, scope, &TypeUse::Unknown)?;
                match node.child("block") {
                    Some(block) => self.visit_children(block, scope),
                    None => Ok(()),
                }
            }
            "using" | "import" => {
                self.import(node, scope);
                Ok(())
            }
            "expr" => self.expression(node, scope),
            "call" => self.call(node, scope, false, None),
            "template" => {
                for child in node.child_nodes().filter(|c| !c.is("parameter_list")) {
                    self.visit(child, scope)?;
                }
                Ok(())
            }
            "comment" | "literal" | "operator" | "name" | "type" | "specifier" | "super_list"
            | "super" => Ok(()),
            tag if tag.starts_with("cpp:") => Ok(()),
            _ => self.visit_children(node, scope),
        }
    }

    /// Get or create the namespace chain `segments` below `scope`.
    fn open_namespaces(
        &mut self,
        scope: ScopeId,
        segments: &[SmolStr],
        location: &SourceLocation,
    ) -> ScopeId {
        let mut current = scope;
        for segment in segments {
            let existing = self
                .tree
                .named_children(current, ScopeKind::Namespace, segment)
                .next();
            current = match existing {
                Some(id) => {
                    self.tree[id].add_location(location.clone());
                    id
                }
                None => self.tree.add_child(
                    current,
                    Scope::new(ScopeKind::Namespace, segment.clone(), self.language)
                        .with_location(location.clone()),
                ),
            };
        }
        current
    }

    fn namespace(&mut self, node: &SyntaxNode, scope: ScopeId) -> Result<(), ParseError> {
        if node.child("init").is_some() {
            self.import(node, scope);
            return Ok(());
        }
        let segments = node
            .child("name")
            .map(|n| self.parser.split_name(&n.text()))
            .unwrap_or_default();
        let location = self.location(node);
        let inner = self.open_namespaces(scope, &segments, &location);
        match node.child("block") {
            Some(block) => self.visit_children(block, inner),
            None => Ok(()),
        }
    }

    /// `package a.b;` or `namespace A.B;`: extends from the statement to the end of `parent`.
    fn file_scoped_namespace(
        &mut self,
        node: &SyntaxNode,
        parent: &SyntaxNode,
        scope: ScopeId,
    ) -> Result<ScopeId, ParseError> {
        let name = node
            .child("name")
            .ok_or_else(|| self.error(node, format!("{} without a name", node.tag())))?;
        let segments = self.parser.split_name(&name.text());
        let location = SourceLocation::from_range(self.file.clone(), node.start(), parent.end())
            .with_xpath(node.xpath());
        Ok(self.open_namespaces(scope, &segments, &location))
    }

    /// Scopes named by the prefix of an out-of-line definition (`A` in `void A::f()`).
    ///
    /// Existing types or namespaces are reused and gain `location`; missing
    /// ones become placeholder types of unknown kind.
    fn qualifier_scopes(
        &mut self,
        scope: ScopeId,
        segments: &[SmolStr],
        location: &SourceLocation,
    ) -> ScopeId {
        let mut current = scope;
        for segment in segments {
            let existing = self.tree.children(current).iter().copied().find(|c| {
                let s = &self.tree[*c];
                s.name == *segment && matches!(s.kind, ScopeKind::Type | ScopeKind::Namespace)
            });
            current = match existing {
                Some(id) => {
                    self.tree[id].add_location(location.clone());
                    id
                }
                None => {
                    let placeholder = Scope::new(ScopeKind::Type, segment.clone(), self.language)
                        .with_detail(ScopeDetail::Type(TypeDefinition::new(
                            TypeKind::Unknown,
                            Vec::new(),
                            false,
                        )))
                        .with_location(location.clone());
                    self.tree.add_child(current, placeholder)
                }
            };
        }
        current
    }

    fn type_definition(&mut self, node: &SyntaxNode, scope: ScopeId) -> Result<(), ParseError> {
        let Some(kind) = TypeKind::from_tag(node.tag()) else {
            return self.visit_children(node, scope);
        };
        let mut segments = node
            .child("name")
            .map(|n| self.parser.split_name(&n.text()))
            .unwrap_or_default();
        let name = segments.pop().unwrap_or_default();
        let base_types = self.base_types(node);
        let is_partial = node
            .children_tagged("specifier")
            .any(|s| s.text().trim() == "partial");
        let location = self.location(node);

        let parent = self.qualifier_scopes(scope, &segments, &location);
        let existing = if name.is_empty() {
            None
        } else {
            self.tree
                .named_children(parent, ScopeKind::Type, &name)
                .find(|c| {
                    self.tree[*c]
                        .as_type()
                        .is_some_and(|def| def.kind.is_compatible(kind))
                })
        };

        let id = match existing {
            Some(id) => {
                let scope = &mut self.tree[id];
                scope.add_location(location);
                if let Some(def) = scope.as_type_mut() {
                    if def.kind == TypeKind::Unknown {
                        def.kind = kind;
                    }
                    def.is_partial |= is_partial;
                    for base in base_types {
                        if !def.base_types.contains(&base) {
                            def.base_types.push(base);
                        }
                    }
                }
                id
            }
            None => {
                let scope = Scope::new(ScopeKind::Type, name.clone(), self.language)
                    .with_detail(ScopeDetail::Type(TypeDefinition::new(kind, base_types, is_partial)))
                    .with_location(location);
                self.tree.add_child(parent, scope)
            }
        };

        if let Some(block) = node.child("block") {
            self.visit_children(block, id)?;
        }
        if kind == TypeKind::Enum && !name.is_empty() {
            let enum_type = TypeUse::named(name);
            for constant in &mut self.tree[id].variables {
                if constant.declared_type.is_unknown() {
                    constant.declared_type = enum_type.clone();
                }
            }
        }
        Ok(())
    }

    fn base_types(&self, node: &SyntaxNode) -> Vec<TypeUse> {
        let mut out = Vec::new();
        for child in node.child_nodes() {
            if matches!(child.tag(), "super_list" | "super" | "extends" | "implements") {
                self.collect_base_types(child, &mut out);
            }
        }
        out
    }

    fn collect_base_types(&self, node: &SyntaxNode, out: &mut Vec<TypeUse>) {
        for child in node.child_nodes() {
            match child.tag() {
                "name" => {
                    let base = self.parser.parse_type(&child.text());
                    if !base.is_unknown() {
                        out.push(base);
                    }
                }
                "super" | "extends" | "implements" => self.collect_base_types(child, out),
                _ => {}
            }
        }
    }

    fn method(&mut self, node: &SyntaxNode, scope: ScopeId) -> Result<(), ParseError> {
        let name_node = node
            .child("name")
            .ok_or_else(|| self.error(node, format!("{} without a name", node.tag())))?;
        let text = name_node.text();
        let (prefix, name) = self.method_name(&text);
        if name.is_empty() {
            return Err(self.error(node, format!("cannot read method name '{}'", text.trim())));
        }

        let tag = node.tag();
        let kind_tag = tag.strip_suffix("_decl").unwrap_or(tag);
        let is_constructor = kind_tag == "constructor";
        let is_destructor = kind_tag == "destructor";
        let return_type = if is_constructor || is_destructor {
            TypeUse::Unknown
        } else {
            node.child("type")
                .map(|t| self.parser.parse_type(&t.text()))
                .unwrap_or_default()
        };
        let has_body = node.child("block").is_some();
        let location = self.location(node);
        let mut parameters = self.parameters(node);
        if self.language == Language::Python
            && self.tree[scope].kind == ScopeKind::Type
            && parameters.first().is_some_and(|(p, _)| p.name == "self")
        {
            parameters.remove(0);
        }

        let parent = self.qualifier_scopes(scope, &prefix, &location);
        let existing = self
            .tree
            .named_children(parent, ScopeKind::Method, &name)
            .find(|c| {
                self.tree[*c].as_method().is_some_and(|m| {
                    m.arity() == parameters.len()
                        && (!m.has_body || !has_body)
                        && m.parameters.iter().zip(&parameters).all(|(a, (b, _))| {
                            a.declared_type == b.declared_type
                                || a.declared_type.is_unknown()
                                || b.declared_type.is_unknown()
                        })
                })
            });

        let id = match existing {
            Some(id) => {
                let scope = &mut self.tree[id];
                scope.add_location(location.clone());
                if let Some(def) = scope.as_method_mut() {
                    def.definition_locations.push(location);
                    def.has_body |= has_body;
                    for (existing, (incoming, _)) in def.parameters.iter_mut().zip(&parameters) {
                        existing.has_default |= incoming.has_default;
                    }
                }
                id
            }
            None => {
                let def = MethodDefinition {
                    name: name.clone(),
                    parameters: parameters.iter().map(|(p, _)| p.clone()).collect(),
                    return_type,
                    is_constructor,
                    is_destructor,
                    has_body,
                    definition_locations: vec![location.clone()],
                };
                let scope = Scope::new(ScopeKind::Method, name, self.language)
                    .with_detail(ScopeDetail::Method(def))
                    .with_location(location);
                self.tree.add_child(parent, scope)
            }
        };

        self.declare_parameters(id, parameters);
        if let Some(block) = node.child("block") {
            self.visit_children(block, id)?;
        }
        Ok(())
    }

    /// Split a method name into qualifier and simple name, keeping `~A` and `operator+` intact.
    fn method_name(&self, text: &str) -> (Vec<SmolStr>, SmolStr) {
        let text = text.trim();
        let last = text.rsplit("::").next().unwrap_or(text).trim();
        let qualifier_text = text[..text.len() - last.len()].trim_end_matches(':');
        let prefix = self.parser.split_name(qualifier_text);

        if last.starts_with("operator") {
            let name: String = last.chars().filter(|c| !c.is_whitespace()).collect();
            return (prefix, SmolStr::from(name));
        }
        let mut segments = self.parser.split_name(last);
        let simple = segments.pop().unwrap_or_default();
        let mut full_prefix = prefix;
        full_prefix.extend(segments);
        if last.starts_with('~') {
            return (full_prefix, SmolStr::from(format!("~{}", simple)));
        }
        (full_prefix, simple)
    }

    fn parameters(&self, node: &SyntaxNode) -> Vec<(Parameter, SourceLocation)> {
        let Some(list) = node.child("parameter_list") else {
            return Vec::new();
        };
        list.child_nodes()
            .filter(|p| p.is("parameter") || p.is("param"))
            .filter_map(|p| {
                let decl = p.child("decl").unwrap_or(p);
                let name = decl.child("name").map(identifier).unwrap_or_default();
                let type_text = decl.child("type").map(|t| t.text()).unwrap_or_default();
                if name.is_empty() && matches!(type_text.trim(), "" | "void" | "...") {
                    return None;
                }
                let has_default = ["init", "default"]
                    .iter()
                    .any(|tag| decl.child(tag).is_some() || p.child(tag).is_some());
                let parameter = Parameter {
                    name,
                    declared_type: self.parser.parse_type(&type_text),
                    has_default,
                };
                Some((parameter, self.location(decl)))
            })
            .collect()
    }

    fn declare_parameters(&mut self, scope: ScopeId, parameters: Vec<(Parameter, SourceLocation)>) {
        for (parameter, location) in parameters {
            if parameter.name.is_empty() {
                continue;
            }
            let declaration = VariableDeclaration {
                name: parameter.name,
                declared_type: parameter.declared_type,
                is_global: false,
                location,
                owner: scope,
            };
            let variables = &mut self.tree[scope].variables;
            if !variables.contains(&declaration) {
                variables.push(declaration);
            }
        }
    }

    /// Control statements own a block scope; their body block is flattened into it.
    fn control(&mut self, node: &SyntaxNode, scope: ScopeId) -> Result<(), ParseError> {
        let block = self.new_scope(ScopeKind::Block, "", node);
        let id = self.tree.add_child(scope, block);
        for child in node.child_nodes() {
            if child.is("block") {
                self.visit_children(child, id)?;
            } else {
                self.visit(child, id)?;
            }
        }
        Ok(())
    }

    fn lambda(&mut self, node: &SyntaxNode, scope: ScopeId) -> Result<(), ParseError> {
        let location = self.location(node);
        let name = format!("lambda@{}:{}", location.start_line(), location.start_column());
        let id = self.tree.add_child(
            scope,
            Scope::new(ScopeKind::Generic, name, self.language).with_location(location),
        );
        let parameters = self.parameters(node);
        self.declare_parameters(id, parameters);
        for child in node.child_nodes() {
            match child.tag() {
                "parameter_list" | "capture" => {}
                "block" => self.visit_children(child, id)?,
                _ => self.visit(child, id)?,
            }
        }
        Ok(())
    }

    fn decl_stmt(&mut self, node: &SyntaxNode, scope: ScopeId) -> Result<(), ParseError> {
        let mut previous = TypeUse::Unknown;
        for child in node.child_nodes() {
            if child.is("decl") {
                previous = self.declaration(child, scope, &previous)?;
            } else {
                self.visit(child, scope)?;
            }
        }
        Ok(())
    }

    /// Record one declarator; returns its type for a following `<type ref="prev"/>`.
    fn declaration(
        &mut self,
        node: &SyntaxNode,
        scope: ScopeId,
        previous: &TypeUse,
    ) -> Result<TypeUse, ParseError> {
        let declared_type = match node.child("type") {
            Some(t) if t.attribute("ref") == Some("prev") => previous.clone(),
            Some(t) => self.parser.parse_type(&t.text()),
            None => TypeUse::Unknown,
        };
        let name = node.child("name").map(identifier).unwrap_or_default();
        if name.is_empty() {
            return Ok(declared_type);
        }

        let declaration = VariableDeclaration {
            name,
            declared_type: declared_type.clone(),
            is_global: self.tree[scope].kind == ScopeKind::Namespace,
            location: self.location(node),
            owner: scope,
        };
        self.tree[scope].variables.push(declaration);

        for child in node.child_nodes() {
            match child.tag() {
                "init" | "range" => self.expression(child, scope)?,
                // `T t(a, b);`
                "argument_list" => {
                    if let Some(type_name) = declared_type.as_named() {
                        let call = MethodCall {
                            name: type_name.name.clone(),
                            arguments: self.arguments(child, scope),
                            calling_object: (!type_name.prefix.is_empty())
                                .then(|| CallingObject::Path(type_name.prefix.clone())),
                            is_constructor: true,
                            location: self.location(node),
                            caller: scope,
                        };
                        self.tree[scope].calls.push(call);
                    }
                    self.expression(child, scope)?;
                }
                _ => {}
            }
        }
        Ok(declared_type)
    }

    fn import(&mut self, node: &SyntaxNode, scope: ScopeId) {
        if let Some(init) = node.child("init") {
            self.alias(node, init, scope);
            return;
        }
        let name = node
            .child("namespace")
            .and_then(|ns| ns.child("name"))
            .or_else(|| node.child("name"));
        let Some(name) = name else {
            return;
        };
        let text = name.text();
        let path = self.parser.split_name(&text);
        if path.is_empty() {
            return;
        }
        let wildcard = node.text().contains("namespace")
            || text.trim_end().ends_with('*')
            || (self.language == Language::CSharp && node.is("using"));
        let import = NamespaceImport {
            path,
            wildcard,
            alias: None,
            location: self.location(node),
        };
        self.tree[scope].imports.push(import);
    }

    /// `namespace fs = std::filesystem;` or `using Alias = Type;`.
    fn alias(&mut self, node: &SyntaxNode, init: &SyntaxNode, scope: ScopeId) {
        let Some(alias) = node
            .child("name")
            .and_then(|n| self.parser.split_name(&n.text()).pop())
        else {
            return;
        };
        let target = init
            .child("name")
            .or_else(|| init.child("type").and_then(|t| t.child("name")))
            .or_else(|| init.child("expr").and_then(|e| e.child("name")));
        let Some(target) = target else {
            return;
        };
        let path = self.parser.split_name(&target.text());
        if path.is_empty() {
            return;
        }
        trace!(%alias, target = %target.text(), "alias");
        let import = NamespaceImport {
            path,
            wildcard: false,
            alias: Some(alias),
            location: self.location(node),
        };
        self.tree[scope].imports.push(import);
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn expression(&mut self, node: &SyntaxNode, scope: ScopeId) -> Result<(), ParseError> {
        let mut after_new = false;
        let mut member_access = false;
        let mut last_call: Option<MethodCall> = None;

        for child in node.child_nodes() {
            match child.tag() {
                "operator" => {
                    let op = child.text();
                    let op = op.trim();
                    after_new = matches!(op, "new" | "gcnew");
                    member_access = matches!(op, "." | "->" | "?.");
                    if !member_access {
                        last_call = None;
                    }
                    continue;
                }
                "call" => {
                    let receiver = match last_call.take() {
                        Some(previous) if member_access => Some(CallingObject::Call(Box::new(previous))),
                        _ => None,
                    };
                    last_call = self.method_call(child, scope, after_new, receiver.clone());
                    self.call(child, scope, after_new, receiver)?;
                }
                "name" => {
                    self.name_use(child, scope)?;
                    last_call = None;
                }
                "lambda" => self.lambda(child, scope)?,
                "literal" | "comment" | "type" | "specifier" => {}
                tag if is_structural_tag(tag) => self.visit(child, scope)?,
                _ => self.expression(child, scope)?,
            }
            after_new = false;
            member_access = false;
        }
        Ok(())
    }

    fn name_use(&mut self, node: &SyntaxNode, scope: ScopeId) -> Result<(), ParseError> {
        let head = node.child("name");
        let (name, location) = match head {
            Some(inner) => (identifier(inner), self.location(inner)),
            None => (identifier(node), self.location(node)),
        };
        if !name.is_empty() && !self.is_keyword(&name) && !name.starts_with(|c: char| c.is_ascii_digit()) {
            self.tree[scope].uses.push(VariableUse {
                name,
                location,
                scope,
            });
        }
        for child in node.child_nodes() {
            if !matches!(child.tag(), "name" | "operator" | "argument_list") {
                self.expression(child, scope)?;
            }
        }
        Ok(())
    }

    fn call(
        &mut self,
        node: &SyntaxNode,
        scope: ScopeId,
        is_new: bool,
        receiver: Option<CallingObject>,
    ) -> Result<(), ParseError> {
        if let Some(call) = self.method_call(node, scope, is_new, receiver) {
            self.tree[scope].calls.push(call);
        }
        if let Some(name) = node.child("name") {
            // The object of `a.f()` is a use of `a`.
            if name.child("name").is_some() && !is_new {
                self.name_use(name, scope)?;
            }
        }
        if let Some(arguments) = node.child("argument_list") {
            self.expression(arguments, scope)?;
        }
        Ok(())
    }

    /// Describe a `<call>` element without recording anything.
    fn method_call(
        &self,
        node: &SyntaxNode,
        scope: ScopeId,
        is_new: bool,
        receiver: Option<CallingObject>,
    ) -> Option<MethodCall> {
        let text = node.child("name")?.text();
        let mut segments = self.parser.split_name(&text);
        let name = segments.pop()?;

        let this_keyword = self.parser.this_keyword();
        let base_keyword = self.parser.base_keyword();
        let (calling_object, is_constructor) = match segments.as_slice() {
            [] if receiver.is_some() => (receiver, is_new),
            // `super(...)` / `this(...)` constructor chaining
            [] if Some(name.as_str()) == base_keyword => (Some(CallingObject::Base), true),
            [] if name == this_keyword && self.language != Language::Python => {
                (Some(CallingObject::This), true)
            }
            [] => (None, is_new),
            [only] if only == this_keyword => (Some(CallingObject::This), is_new),
            [only] if Some(only.as_str()) == base_keyword => (Some(CallingObject::Base), is_new),
            _ => (Some(CallingObject::Path(segments)), is_new),
        };

        let arguments = node
            .child("argument_list")
            .map(|list| self.arguments(list, scope))
            .unwrap_or_default();

        Some(MethodCall {
            name,
            arguments,
            calling_object,
            is_constructor,
            location: self.location(node),
            caller: scope,
        })
    }

    fn arguments(&self, list: &SyntaxNode, scope: ScopeId) -> Vec<Argument> {
        list.children_tagged("argument")
            .map(|argument| self.classify_argument(argument, scope))
            .collect()
    }

    fn classify_argument(&self, argument: &SyntaxNode, scope: ScopeId) -> Argument {
        let expr = argument.child("expr").unwrap_or(argument);
        let nodes: Vec<&SyntaxNode> = expr.child_nodes().filter(|n| !n.is("comment")).collect();
        match nodes.as_slice() {
            [literal] if literal.is("literal") => {
                let kind = literal.attribute("type").and_then(LiteralKind::from_srcml);
                match kind {
                    Some(kind) => Argument::Literal {
                        kind,
                        text: SmolStr::from(literal.text().trim()),
                    },
                    None => Argument::Other,
                }
            }
            [name] if name.is("name") && name.child_nodes().next().is_none() => {
                Argument::Name(identifier(name))
            }
            [call] if call.is("call") => self
                .method_call(call, scope, false, None)
                .map(|c| Argument::Call(Box::new(c)))
                .unwrap_or(Argument::Other),
            [op, call] if op.is("operator") && op.text().trim() == "new" && call.is("call") => self
                .method_call(call, scope, true, None)
                .map(|c| Argument::Call(Box::new(c)))
                .unwrap_or(Argument::Other),
            _ => Argument::Other,
        }
    }
}
