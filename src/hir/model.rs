//! Program-data entities: scopes, declarations, definitions and use sites.
//!
//! Everything here is plain data. Back-references (a declaration's owner, a
//! call's caller, a scope's parent) are [`ScopeId`] handles into the
//! [`ScopeTree`](super::ScopeTree) that holds the entity, never pointers.

use std::fmt;

use smol_str::SmolStr;

use super::ids::ScopeId;
use crate::base::SourceLocation;
use crate::syntax::Language;

// ============================================================================
// TYPE USES
// ============================================================================

/// A reference to a type as written in a declaration or signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeUse {
    /// Untyped or inferred (`auto`, `var`, Python names); compatible with anything.
    #[default]
    Unknown,
    Named(NamedType),
}

/// A named type, e.g. `std::vector<int>` = prefix `[std]`, name `vector`, one argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedType {
    pub name: SmolStr,
    pub prefix: Vec<SmolStr>,
    pub arguments: Vec<TypeUse>,
    /// A primitive of the declaring language (`int`, `unsigned long`, `boolean`).
    pub builtin: bool,
}

impl TypeUse {
    pub fn named(name: impl Into<SmolStr>) -> Self {
        TypeUse::Named(NamedType {
            name: name.into(),
            prefix: Vec::new(),
            arguments: Vec::new(),
            builtin: false,
        })
    }

    pub fn builtin(name: impl Into<SmolStr>) -> Self {
        TypeUse::Named(NamedType {
            name: name.into(),
            prefix: Vec::new(),
            arguments: Vec::new(),
            builtin: true,
        })
    }

    pub fn with_prefix(self, prefix: Vec<SmolStr>) -> Self {
        match self {
            TypeUse::Named(mut named) => {
                named.prefix = prefix;
                TypeUse::Named(named)
            }
            TypeUse::Unknown => TypeUse::Unknown,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeUse::Unknown)
    }

    /// The unqualified type name.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeUse::Named(named) => Some(&named.name),
            TypeUse::Unknown => None,
        }
    }

    pub fn as_named(&self) -> Option<&NamedType> {
        match self {
            TypeUse::Named(named) => Some(named),
            TypeUse::Unknown => None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, TypeUse::Named(named) if named.builtin)
    }
}

impl NamedType {
    /// Prefix segments followed by the name.
    pub fn path(&self) -> Vec<SmolStr> {
        let mut path = self.prefix.clone();
        path.push(self.name.clone());
        path
    }
}

impl fmt::Display for TypeUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeUse::Unknown => f.write_str("?"),
            TypeUse::Named(named) => {
                for segment in &named.prefix {
                    write!(f, "{}::", segment)?;
                }
                f.write_str(&named.name)?;
                if !named.arguments.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in named.arguments.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// SCOPES
// ============================================================================

/// The kind of lexical region a [`Scope`] represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScopeKind {
    Namespace,
    Type,
    Method,
    Block,
    /// Lambdas and other anonymous regions.
    Generic,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScopeKind::Namespace => "namespace",
            ScopeKind::Type => "type",
            ScopeKind::Method => "method",
            ScopeKind::Block => "block",
            ScopeKind::Generic => "scope",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeKind {
    Class,
    Struct,
    Union,
    Interface,
    Enum,
    /// Placeholder synthesized from an out-of-line definition such as `A::f`.
    Unknown,
}

impl TypeKind {
    /// Map a srcML element name (with or without `_decl`) to a type kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.strip_suffix("_decl").unwrap_or(tag) {
            "class" => Some(TypeKind::Class),
            "struct" => Some(TypeKind::Struct),
            "union" => Some(TypeKind::Union),
            "interface" => Some(TypeKind::Interface),
            "enum" => Some(TypeKind::Enum),
            _ => None,
        }
    }

    /// Whether two same-named types of these kinds may share one scope.
    pub fn is_compatible(self, other: TypeKind) -> bool {
        self == other || self == TypeKind::Unknown || other == TypeKind::Unknown
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Union => "union",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Unknown => "type",
        };
        f.write_str(s)
    }
}

/// Type-specific data of a [`ScopeKind::Type`] scope.
///
/// In a merged tree the public fields are folded from what each contributing
/// file declared, so dropping a file also drops its base types and kind.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeDefinition {
    pub kind: TypeKind,
    pub base_types: Vec<TypeUse>,
    pub is_partial: bool,
    pub(crate) parts: Vec<TypePart>,
}

/// One file's declaration of a merged type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct TypePart {
    pub(crate) file: SmolStr,
    pub(crate) kind: TypeKind,
    pub(crate) base_types: Vec<TypeUse>,
    pub(crate) is_partial: bool,
}

impl TypeDefinition {
    pub fn new(kind: TypeKind, base_types: Vec<TypeUse>, is_partial: bool) -> Self {
        Self {
            kind,
            base_types,
            is_partial,
            parts: Vec::new(),
        }
    }

    /// Fold `file`'s declaration of this type into the merged definition.
    pub(crate) fn add_part(&mut self, file: &str, declared: &TypeDefinition) {
        match self.parts.iter_mut().find(|p| p.file == file) {
            Some(part) => {
                if part.kind == TypeKind::Unknown {
                    part.kind = declared.kind;
                }
                part.is_partial |= declared.is_partial;
                for base in &declared.base_types {
                    if !part.base_types.contains(base) {
                        part.base_types.push(base.clone());
                    }
                }
            }
            None => self.parts.push(TypePart {
                file: file.into(),
                kind: declared.kind,
                base_types: declared.base_types.clone(),
                is_partial: declared.is_partial,
            }),
        }
        self.refold();
    }

    /// Drop `file`'s declaration; returns whether anything changed.
    pub(crate) fn remove_part(&mut self, file: &str) -> bool {
        let before = self.parts.len();
        self.parts.retain(|p| p.file != file);
        let changed = self.parts.len() != before;
        if changed {
            self.refold();
        }
        changed
    }

    /// This definition as it would be without `file`'s declaration.
    pub(crate) fn without(&self, file: &str) -> TypeDefinition {
        let mut def = self.clone();
        def.remove_part(file);
        def
    }

    fn refold(&mut self) {
        self.kind = self
            .parts
            .iter()
            .map(|p| p.kind)
            .find(|k| *k != TypeKind::Unknown)
            .unwrap_or(TypeKind::Unknown);
        self.is_partial = self.parts.iter().any(|p| p.is_partial);
        self.base_types.clear();
        for base in self.parts.iter().flat_map(|p| &p.base_types) {
            if !self.base_types.contains(base) {
                self.base_types.push(base.clone());
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    pub name: SmolStr,
    pub declared_type: TypeUse,
    pub has_default: bool,
}

/// Method-specific data of a [`ScopeKind::Method`] scope.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodDefinition {
    pub name: SmolStr,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeUse,
    pub is_constructor: bool,
    pub is_destructor: bool,
    pub has_body: bool,
    /// Every prototype and definition merged into this method.
    pub definition_locations: Vec<SourceLocation>,
}

impl MethodDefinition {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Fewest arguments a call may pass (parameters without defaults).
    pub fn min_arity(&self) -> usize {
        self.parameters.iter().filter(|p| !p.has_default).count()
    }

    pub fn accepts_arity(&self, arguments: usize) -> bool {
        self.min_arity() <= arguments && arguments <= self.arity()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScopeDetail {
    #[default]
    None,
    Type(TypeDefinition),
    Method(MethodDefinition),
}

/// A lexical region owning declarations, use sites and child scopes.
#[derive(Clone, Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Empty for blocks and the global namespace.
    pub name: SmolStr,
    pub language: Language,
    pub detail: ScopeDetail,
    pub(crate) parent: Option<ScopeId>,
    pub(crate) children: Vec<ScopeId>,
    /// Primary location first; further entries come from partial or split declarations.
    pub(crate) locations: Vec<SourceLocation>,
    pub variables: Vec<VariableDeclaration>,
    pub calls: Vec<MethodCall>,
    pub uses: Vec<VariableUse>,
    pub imports: Vec<NamespaceImport>,
}

impl Scope {
    pub fn new(kind: ScopeKind, name: impl Into<SmolStr>, language: Language) -> Self {
        Self {
            kind,
            name: name.into(),
            language,
            detail: ScopeDetail::None,
            parent: None,
            children: Vec::new(),
            locations: Vec::new(),
            variables: Vec::new(),
            calls: Vec::new(),
            uses: Vec::new(),
            imports: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: ScopeDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.locations.push(location);
        self
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.locations.first()
    }

    pub fn additional_locations(&self) -> &[SourceLocation] {
        self.locations.get(1..).unwrap_or(&[])
    }

    pub fn locations(&self) -> &[SourceLocation] {
        &self.locations
    }

    /// Add a location unless an equal one is already recorded.
    pub fn add_location(&mut self, location: SourceLocation) {
        if !self.locations.contains(&location) {
            self.locations.push(location);
        }
    }

    /// The location of this scope inside `file`, if it has one there.
    pub fn location_in(&self, file: &str) -> Option<&SourceLocation> {
        self.locations.iter().find(|l| l.file() == file)
    }

    /// Whether any location of this scope contains `location`.
    pub fn contains(&self, location: &SourceLocation) -> bool {
        self.locations.iter().any(|l| l.contains(location))
    }

    pub fn is_in_file(&self, file: &str) -> bool {
        self.locations.iter().any(|l| l.file() == file)
    }

    pub fn as_type(&self) -> Option<&TypeDefinition> {
        match &self.detail {
            ScopeDetail::Type(def) => Some(def),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodDefinition> {
        match &self.detail {
            ScopeDetail::Method(def) => Some(def),
            _ => None,
        }
    }

    pub(crate) fn as_method_mut(&mut self) -> Option<&mut MethodDefinition> {
        match &mut self.detail {
            ScopeDetail::Method(def) => Some(def),
            _ => None,
        }
    }

    pub(crate) fn as_type_mut(&mut self) -> Option<&mut TypeDefinition> {
        match &mut self.detail {
            ScopeDetail::Type(def) => Some(def),
            _ => None,
        }
    }

    /// A short human-readable description, e.g. `class Widget`.
    pub fn describe(&self) -> String {
        match &self.detail {
            ScopeDetail::Type(def) => format!("{} {}", def.kind, self.name),
            ScopeDetail::Method(def) => format!("method {}/{}", self.name, def.arity()),
            ScopeDetail::None if self.name.is_empty() => self.kind.to_string(),
            ScopeDetail::None => format!("{} {}", self.kind, self.name),
        }
    }
}

// ============================================================================
// DECLARATIONS AND USE SITES
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableDeclaration {
    pub name: SmolStr,
    pub declared_type: TypeUse,
    /// Declared at namespace level.
    pub is_global: bool,
    pub location: SourceLocation,
    pub owner: ScopeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LiteralKind {
    Number,
    String,
    Character,
    Boolean,
    Null,
}

impl LiteralKind {
    /// Parse the `type` attribute of a srcML `<literal>`.
    pub fn from_srcml(kind: &str) -> Option<Self> {
        match kind {
            "number" => Some(LiteralKind::Number),
            "string" => Some(LiteralKind::String),
            "char" => Some(LiteralKind::Character),
            "boolean" => Some(LiteralKind::Boolean),
            "null" => Some(LiteralKind::Null),
            _ => None,
        }
    }
}

/// Best-effort classification of one call argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Argument {
    Literal { kind: LiteralKind, text: SmolStr },
    /// A plain variable name.
    Name(SmolStr),
    Call(Box<MethodCall>),
    Other,
}

/// What a call is invoked on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallingObject {
    /// `this`/`self`.
    This,
    /// `base`/`super`.
    Base,
    /// A member-access chain such as `a.b` in `a.b.f()` or `A` in `A::f()`.
    Path(Vec<SmolStr>),
    /// The result of the preceding call in a chain such as `a.b().c()`.
    Call(Box<MethodCall>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodCall {
    pub name: SmolStr,
    pub arguments: Vec<Argument>,
    pub calling_object: Option<CallingObject>,
    /// `new T(...)`, `T t(...)`, `super(...)` and `this(...)`.
    pub is_constructor: bool,
    pub location: SourceLocation,
    pub caller: ScopeId,
}

/// A plain name used as a value (`x` in `f(x)`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableUse {
    pub name: SmolStr,
    pub location: SourceLocation,
    pub scope: ScopeId,
}

/// `using namespace a::b;`, `import a.b.*;`, `using A.B;` or `import a.b.C;`.
///
/// Aliases (`namespace fs = std::filesystem;`, `using Map = a.b.Map;`) carry
/// the alias name and make `path` reachable under it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamespaceImport {
    pub path: Vec<SmolStr>,
    /// Imports every member of `path` rather than the single entity it names.
    pub wildcard: bool,
    pub alias: Option<SmolStr>,
    pub location: SourceLocation,
}

impl NamespaceImport {
    /// The full path that `used` names through this import, if it goes through it.
    pub fn expand(&self, used: &[SmolStr]) -> Option<Vec<SmolStr>> {
        let (first, rest) = used.split_first()?;
        match &self.alias {
            Some(alias) if alias == first => Some(self.path.iter().chain(rest).cloned().collect()),
            Some(_) => None,
            None if self.wildcard => Some(self.path.iter().chain(used).cloned().collect()),
            None if self.path.last() == Some(first) => {
                let stem = &self.path[..self.path.len() - 1];
                Some(stem.iter().chain(used).cloned().collect())
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(params: &[(&str, bool)]) -> MethodDefinition {
        MethodDefinition {
            name: "f".into(),
            parameters: params
                .iter()
                .map(|(name, has_default)| Parameter {
                    name: (*name).into(),
                    declared_type: TypeUse::builtin("int"),
                    has_default: *has_default,
                })
                .collect(),
            return_type: TypeUse::builtin("void"),
            is_constructor: false,
            is_destructor: false,
            has_body: true,
            definition_locations: Vec::new(),
        }
    }

    #[test]
    fn test_arity_with_defaults() {
        let m = method(&[("a", false), ("b", true), ("c", true)]);
        assert_eq!(m.arity(), 3);
        assert_eq!(m.min_arity(), 1);
        assert!(!m.accepts_arity(0));
        assert!(m.accepts_arity(1));
        assert!(m.accepts_arity(3));
        assert!(!m.accepts_arity(4));
    }

    #[test]
    fn test_type_kind_compatibility() {
        assert_eq!(TypeKind::from_tag("class_decl"), Some(TypeKind::Class));
        assert_eq!(TypeKind::from_tag("function"), None);
        assert!(TypeKind::Class.is_compatible(TypeKind::Class));
        assert!(TypeKind::Unknown.is_compatible(TypeKind::Interface));
        assert!(!TypeKind::Class.is_compatible(TypeKind::Interface));
    }

    #[test]
    fn test_type_parts_fold_and_unfold() {
        let mut merged = TypeDefinition::new(TypeKind::Unknown, Vec::new(), false);
        merged.add_part("b.cpp", &TypeDefinition::new(TypeKind::Unknown, Vec::new(), false));
        merged.add_part("a.h", &TypeDefinition::new(TypeKind::Class, vec![TypeUse::named("A")], false));
        assert_eq!(merged.kind, TypeKind::Class);
        assert_eq!(merged.base_types, vec![TypeUse::named("A")]);
        assert_eq!(merged.without("a.h").kind, TypeKind::Unknown);

        assert!(merged.remove_part("a.h"));
        assert_eq!(merged.kind, TypeKind::Unknown);
        assert!(merged.base_types.is_empty());
        assert!(!merged.remove_part("a.h"));
    }

    #[test]
    fn test_import_expansion() {
        let at = SourceLocation::new("a.cpp", 1, 1);
        let import = |path: &[&str], wildcard: bool, alias: Option<&str>| NamespaceImport {
            path: path.iter().map(|s| SmolStr::from(*s)).collect(),
            wildcard,
            alias: alias.map(SmolStr::from),
            location: at.clone(),
        };
        let used = |path: &[&str]| -> Vec<SmolStr> { path.iter().map(|s| SmolStr::from(*s)).collect() };

        let alias = import(&["std", "filesystem"], false, Some("fs"));
        assert_eq!(alias.expand(&used(&["fs", "path"])), Some(used(&["std", "filesystem", "path"])));
        assert_eq!(alias.expand(&used(&["filesystem", "path"])), None);

        let wildcard = import(&["java", "util"], true, None);
        assert_eq!(wildcard.expand(&used(&["List"])), Some(used(&["java", "util", "List"])));

        let single = import(&["java", "util", "List"], false, None);
        assert_eq!(single.expand(&used(&["List"])), Some(used(&["java", "util", "List"])));
        assert_eq!(single.expand(&used(&["Map"])), None);
    }

    #[test]
    fn test_type_use_display() {
        let vector = TypeUse::Named(NamedType {
            name: "vector".into(),
            prefix: vec!["std".into()],
            arguments: vec![TypeUse::builtin("int")],
            builtin: false,
        });
        assert_eq!(vector.to_string(), "std::vector<int>");
        assert_eq!(TypeUse::Unknown.to_string(), "?");
    }

    #[test]
    fn test_scope_locations() {
        let primary = SourceLocation::new("a.cpp", 1, 1).with_end(3, 1);
        let other = SourceLocation::new("b.cpp", 1, 1).with_end(9, 1);
        let mut scope = Scope::new(ScopeKind::Type, "A", Language::CPlusPlus)
            .with_location(primary.clone());
        scope.add_location(other.clone());
        scope.add_location(other.clone());

        assert_eq!(scope.location(), Some(&primary));
        assert_eq!(scope.additional_locations(), &[other]);
        assert!(scope.contains(&SourceLocation::new("b.cpp", 4, 2)));
        assert!(!scope.contains(&SourceLocation::new("c.cpp", 1, 1)));
    }
}
