//! Language-aware signature parsing.
//!
//! Type names and qualified names arrive as raw source text (`const std::vector<int>&`,
//! `java.util.List<String>`, `unsigned long`). A [`SignatureParser`] turns them
//! into [`TypeUse`]s and name paths following the conventions of one
//! [`Language`]. [`parser_for`] hands out the built-in parser for each tag.

use logos::Logos;
use smol_str::SmolStr;

use super::model::{LiteralKind, NamedType, TypeUse};
use crate::syntax::Language;

/// Pluggable per-language parsing of type and name text.
pub trait SignatureParser: Send + Sync {
    fn language(&self) -> Language;

    /// Parse the text of a srcML `<type>` element.
    fn parse_type(&self, text: &str) -> TypeUse;

    /// Split a possibly qualified name into segments, dropping generic arguments.
    fn split_name(&self, text: &str) -> Vec<SmolStr>;

    /// The type of a literal of the given kind, e.g. `3.0f` is `float`.
    fn literal_type(&self, kind: LiteralKind, text: &str) -> TypeUse;

    fn is_builtin(&self, name: &str) -> bool;

    /// Whether values of the builtin `name` convert implicitly between each other.
    fn is_numeric(&self, name: &str) -> bool;

    /// `this` or `self`.
    fn this_keyword(&self) -> &'static str;

    /// `base`, `super` or nothing.
    fn base_keyword(&self) -> Option<&'static str>;
}

/// The built-in parser for `language`.
pub fn parser_for(language: Language) -> &'static dyn SignatureParser {
    match language {
        Language::C => &C_RULES,
        Language::CPlusPlus | Language::Any => &CPP_RULES,
        Language::Java | Language::AspectJ => &JAVA_RULES,
        Language::CSharp => &CSHARP_RULES,
        Language::Python => &PYTHON_RULES,
    }
}

// ============================================================================
// TOKENS
// ============================================================================

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[\t\n\r\f ]+")]
enum Token<'a> {
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident(&'a str),
    #[token("::")]
    PathSep,
    #[token(".")]
    Dot,
    #[token("->")]
    Arrow,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(",")]
    Comma,
    #[token("*")]
    Star,
    #[token("&")]
    Amp,
    #[token("&&")]
    AmpAmp,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("?")]
    Question,
    #[token("^")]
    Caret,
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    // Unknown characters (digits in array bounds, `~`, operators) carry no type information.
    Token::lexer(text).filter_map(|token| token.ok()).collect()
}

// ============================================================================
// LANGUAGE RULES
// ============================================================================

struct LanguageRules {
    language: Language,
    builtins: &'static [&'static str],
    numeric: &'static [&'static str],
    /// Words that qualify a type without changing its identity.
    modifiers: &'static [&'static str],
    /// Words that ask the compiler to infer the type.
    inferred: &'static [&'static str],
    /// Whether builtin words combine (`unsigned long int`).
    compound_builtins: bool,
    this_keyword: &'static str,
    base_keyword: Option<&'static str>,
    string_type: &'static str,
    boolean_type: &'static str,
    untyped: bool,
}

const C_FAMILY_MODIFIERS: &[&str] = &[
    "const", "volatile", "static", "extern", "inline", "virtual", "mutable", "register",
    "struct", "class", "union", "enum", "typename", "restrict", "constexpr", "explicit",
];

static C_RULES: LanguageRules = LanguageRules {
    language: Language::C,
    builtins: &[
        "void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "_Bool",
    ],
    numeric: &["char", "short", "int", "long", "float", "double", "signed", "unsigned", "_Bool"],
    modifiers: C_FAMILY_MODIFIERS,
    inferred: &[],
    compound_builtins: true,
    this_keyword: "this",
    base_keyword: None,
    string_type: "char",
    boolean_type: "int",
    untyped: false,
};

static CPP_RULES: LanguageRules = LanguageRules {
    language: Language::CPlusPlus,
    builtins: &[
        "void", "bool", "char", "wchar_t", "char16_t", "char32_t", "short", "int", "long",
        "float", "double", "signed", "unsigned",
    ],
    numeric: &[
        "bool", "char", "wchar_t", "char16_t", "char32_t", "short", "int", "long", "float",
        "double", "signed", "unsigned",
    ],
    modifiers: C_FAMILY_MODIFIERS,
    inferred: &["auto", "decltype"],
    compound_builtins: true,
    this_keyword: "this",
    base_keyword: None,
    string_type: "char",
    boolean_type: "bool",
    untyped: false,
};

static JAVA_RULES: LanguageRules = LanguageRules {
    language: Language::Java,
    builtins: &["void", "byte", "short", "int", "long", "float", "double", "boolean", "char"],
    numeric: &["byte", "short", "int", "long", "float", "double", "char"],
    modifiers: &["final", "static", "transient", "volatile", "public", "private", "protected"],
    inferred: &["var"],
    compound_builtins: false,
    this_keyword: "this",
    base_keyword: Some("super"),
    string_type: "String",
    boolean_type: "boolean",
    untyped: false,
};

static CSHARP_RULES: LanguageRules = LanguageRules {
    language: Language::CSharp,
    builtins: &[
        "void", "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "float",
        "double", "decimal", "char", "string", "bool", "object",
    ],
    numeric: &[
        "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "float", "double",
        "decimal", "char",
    ],
    modifiers: &[
        "const", "static", "readonly", "volatile", "ref", "out", "in", "params", "this",
        "public", "private", "protected", "internal", "unsafe",
    ],
    inferred: &["var", "dynamic"],
    compound_builtins: false,
    this_keyword: "this",
    base_keyword: Some("base"),
    string_type: "string",
    boolean_type: "bool",
    untyped: false,
};

static PYTHON_RULES: LanguageRules = LanguageRules {
    language: Language::Python,
    builtins: &["int", "float", "complex", "str", "bool", "bytes", "None"],
    numeric: &["int", "float", "complex", "bool"],
    modifiers: &[],
    inferred: &[],
    compound_builtins: false,
    this_keyword: "self",
    base_keyword: Some("super"),
    string_type: "str",
    boolean_type: "bool",
    untyped: true,
};

impl LanguageRules {
    fn is_modifier(&self, word: &str) -> bool {
        self.modifiers.contains(&word)
    }

    /// Parse one type starting at `tokens[*pos]`, advancing past it.
    fn parse_named(&self, tokens: &[Token<'_>], pos: &mut usize) -> TypeUse {
        let mut builtin_words: Vec<&str> = Vec::new();
        let mut segments: Vec<SmolStr> = Vec::new();
        let mut arguments = Vec::new();

        while let Some(token) = tokens.get(*pos) {
            match *token {
                Token::Ident(word) if self.is_modifier(word) => *pos += 1,
                Token::Ident(word) if self.inferred.contains(&word) => {
                    *pos += 1;
                    return TypeUse::Unknown;
                }
                Token::Ident(word)
                    if segments.is_empty() && self.builtins.contains(&word) =>
                {
                    *pos += 1;
                    builtin_words.push(word);
                    if !self.compound_builtins {
                        break;
                    }
                }
                Token::Ident(word) if builtin_words.is_empty() => {
                    *pos += 1;
                    segments.push(SmolStr::from(word));
                    arguments.clear();
                    if tokens.get(*pos) == Some(&Token::Lt) {
                        *pos += 1;
                        arguments = self.parse_arguments(tokens, pos);
                    }
                    match tokens.get(*pos) {
                        Some(Token::PathSep | Token::Dot) => *pos += 1,
                        _ => break,
                    }
                }
                _ => break,
            }
        }

        // Pointers, references, arrays and nullable markers are not part of the identity.
        while let Some(
            Token::Star
            | Token::Amp
            | Token::AmpAmp
            | Token::LBracket
            | Token::RBracket
            | Token::Question
            | Token::Caret,
        ) = tokens.get(*pos)
        {
            *pos += 1;
        }

        if !builtin_words.is_empty() {
            return TypeUse::builtin(builtin_words.join(" "));
        }
        match segments.pop() {
            Some(name) => TypeUse::Named(NamedType {
                name,
                prefix: segments,
                arguments,
                builtin: false,
            }),
            None => TypeUse::Unknown,
        }
    }

    fn parse_arguments(&self, tokens: &[Token<'_>], pos: &mut usize) -> Vec<TypeUse> {
        let mut arguments = Vec::new();
        loop {
            let before = *pos;
            arguments.push(self.parse_named(tokens, pos));
            match tokens.get(*pos) {
                Some(Token::Comma) => *pos += 1,
                Some(Token::Gt) => {
                    *pos += 1;
                    return arguments;
                }
                None => return arguments,
                Some(_) if *pos == before => {
                    // Unparseable argument (e.g. a template value); skip one token.
                    *pos += 1;
                }
                Some(_) => {}
            }
        }
    }
}

impl SignatureParser for LanguageRules {
    fn language(&self) -> Language {
        self.language
    }

    fn parse_type(&self, text: &str) -> TypeUse {
        if self.untyped {
            return TypeUse::Unknown;
        }
        let tokens = tokenize(text);
        let mut pos = 0;
        self.parse_named(&tokens, &mut pos)
    }

    fn split_name(&self, text: &str) -> Vec<SmolStr> {
        let tokens = tokenize(text);
        let mut segments = Vec::new();
        let mut depth = 0usize;
        for token in tokens {
            match token {
                Token::Lt => depth += 1,
                Token::Gt => depth = depth.saturating_sub(1),
                Token::Ident(word) if depth == 0 => segments.push(SmolStr::from(word)),
                _ => {}
            }
        }
        segments
    }

    fn literal_type(&self, kind: LiteralKind, text: &str) -> TypeUse {
        match kind {
            LiteralKind::Boolean => TypeUse::builtin(self.boolean_type),
            LiteralKind::Character => TypeUse::builtin("char"),
            LiteralKind::String if self.builtins.contains(&self.string_type) => {
                TypeUse::builtin(self.string_type)
            }
            LiteralKind::String => TypeUse::named(self.string_type),
            LiteralKind::Number => TypeUse::builtin(number_literal_type(self.language, text)),
            LiteralKind::Null => TypeUse::Unknown,
        }
    }

    fn is_builtin(&self, name: &str) -> bool {
        name.split_whitespace().all(|part| self.builtins.contains(&part))
    }

    fn is_numeric(&self, name: &str) -> bool {
        name.split_whitespace().all(|part| self.numeric.contains(&part))
    }

    fn this_keyword(&self) -> &'static str {
        self.this_keyword
    }

    fn base_keyword(&self) -> Option<&'static str> {
        self.base_keyword
    }
}

fn number_literal_type(language: Language, text: &str) -> &'static str {
    let lower = text.to_ascii_lowercase();
    let is_hex = lower.starts_with("0x");
    if language == Language::Python {
        return if lower.contains('.') || (!is_hex && lower.contains('e')) {
            "float"
        } else {
            "int"
        };
    }
    if !is_hex && lower.ends_with('f') {
        return "float";
    }
    if lower.ends_with('m') && language == Language::CSharp {
        return "decimal";
    }
    if lower.contains('.') || (!is_hex && (lower.contains('e') || lower.ends_with('d'))) {
        return "double";
    }
    if lower.ends_with('l') {
        return "long";
    }
    "int"
}
