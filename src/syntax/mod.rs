//! Syntax trees for parsed translation units.
//!
//! A [`ParsedUnit`] is one file as delivered by the external srcML step: a
//! path, a [`Language`] tag and a tree of [`SyntaxNode`]s mirroring the srcML
//! elements. The core never sees how the markup was produced; with the
//! `srcml` feature the [`srcml`] module reads it from XML.

#[cfg(feature = "srcml")]
pub mod srcml;

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::{LineCol, LineIndex, SourceLocation, TextSize};

/// Source language of a translation unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Language {
    /// Unknown or mixed; handled with C++-like rules.
    #[default]
    Any,
    C,
    CPlusPlus,
    Java,
    AspectJ,
    CSharp,
    Python,
}

impl Language {
    /// Parse the value of a srcML `language` attribute.
    pub fn from_srcml_name(name: &str) -> Self {
        match name {
            "C" => Language::C,
            "C++" => Language::CPlusPlus,
            "Java" => Language::Java,
            "AspectJ" => Language::AspectJ,
            "C#" => Language::CSharp,
            "Python" => Language::Python,
            _ => Language::Any,
        }
    }

    /// Guess the language from a source file extension.
    pub fn from_extension(path: &str) -> Self {
        let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        match ext.to_ascii_lowercase().as_str() {
            "c" => Language::C,
            "h" | "hh" | "hpp" | "hxx" | "cc" | "cpp" | "cxx" | "c++" => Language::CPlusPlus,
            "java" => Language::Java,
            "aj" => Language::AspectJ,
            "cs" => Language::CSharp,
            "py" => Language::Python,
            _ => Language::Any,
        }
    }

    pub fn srcml_name(self) -> &'static str {
        match self {
            Language::Any => "Any",
            Language::C => "C",
            Language::CPlusPlus => "C++",
            Language::Java => "Java",
            Language::AspectJ => "AspectJ",
            Language::CSharp => "C#",
            Language::Python => "Python",
        }
    }

    /// Separator between the segments of a qualified name.
    pub fn scope_separator(self) -> &'static str {
        match self {
            Language::Java | Language::AspectJ | Language::CSharp | Language::Python => ".",
            Language::C | Language::CPlusPlus | Language::Any => "::",
        }
    }

    /// Whether types of this language are nominal and unique per qualified name.
    pub fn has_unique_types(self) -> bool {
        matches!(self, Language::Java | Language::AspectJ | Language::CSharp)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.srcml_name())
    }
}

/// A child of a [`SyntaxNode`]: either a nested element or source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxElement {
    Node(SyntaxNode),
    Text(SmolStr),
}

/// One srcML element with its position in the original source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxNode {
    tag: SmolStr,
    attributes: Vec<(SmolStr, SmolStr)>,
    children: Vec<SyntaxElement>,
    start: LineCol,
    end: LineCol,
    xpath: Arc<str>,
}

impl SyntaxNode {
    /// Create an element with no children at `1:1`.
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            start: LineCol::default(),
            end: LineCol::default(),
            xpath: Arc::from(""),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: SyntaxNode) -> Self {
        self.children.push(SyntaxElement::Node(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<SmolStr>) -> Self {
        self.children.push(SyntaxElement::Text(text.into()));
        self
    }

    /// Set the span (0-indexed, end inclusive).
    pub fn with_span(mut self, start: LineCol, end: LineCol) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_xpath(mut self, xpath: impl Into<Arc<str>>) -> Self {
        self.xpath = xpath.into();
        self
    }

    pub(crate) fn push(&mut self, element: SyntaxElement) {
        self.children.push(element);
    }

    /// Element name; preprocessor elements keep their `cpp:` prefix.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[SyntaxElement] {
        &self.children
    }

    /// Child elements, skipping text.
    pub fn child_nodes(&self) -> impl Iterator<Item = &SyntaxNode> + '_ {
        self.children.iter().filter_map(|c| match c {
            SyntaxElement::Node(n) => Some(n),
            SyntaxElement::Text(_) => None,
        })
    }

    /// First child element with the given tag.
    pub fn child(&self, tag: &str) -> Option<&SyntaxNode> {
        self.child_nodes().find(|n| n.tag == tag)
    }

    pub fn children_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a SyntaxNode> + 'a {
        self.child_nodes().filter(move |n| n.tag == tag)
    }

    /// All descendant elements in document order (excluding `self`).
    pub fn descendants(&self) -> Vec<&SyntaxNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&SyntaxNode> = self.child_nodes().collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut children: Vec<&SyntaxNode> = node.child_nodes().collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Concatenated source text of this element.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                SyntaxElement::Text(t) => out.push_str(t),
                SyntaxElement::Node(n) => n.collect_text(out),
            }
        }
    }

    pub fn start(&self) -> LineCol {
        self.start
    }

    pub fn end(&self) -> LineCol {
        self.end
    }

    pub fn xpath(&self) -> &str {
        &self.xpath
    }

    /// The location of this element inside `file`.
    pub fn location(&self, file: &Arc<str>) -> SourceLocation {
        SourceLocation::from_range(file.clone(), self.start, self.end).with_xpath(self.xpath.clone())
    }

    pub(crate) fn set_span(&mut self, start: LineCol, end: LineCol) {
        self.start = start;
        self.end = end;
    }
}

/// One translation unit: the element of the parsed-unit feed.
#[derive(Clone, Debug)]
pub struct ParsedUnit {
    pub path: Arc<str>,
    pub language: Language,
    pub root: SyntaxNode,
    source: Arc<str>,
}

impl ParsedUnit {
    pub fn new(path: impl Into<Arc<str>>, language: Language, root: SyntaxNode) -> Self {
        let source: Arc<str> = Arc::from(root.text());
        Self {
            path: path.into(),
            language,
            root,
            source,
        }
    }

    /// The original source text (all text nodes concatenated).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Location of the `nth` (0-based) occurrence of `needle` in the source.
    pub fn find_text(&self, needle: &str, nth: usize) -> Option<SourceLocation> {
        let (byte_offset, _) = self.source.match_indices(needle).nth(nth)?;
        let char_offset = self.source[..byte_offset].chars().count() as u32;
        let len = needle.chars().count().max(1) as u32;
        let index = LineIndex::new(&self.source);
        let start = index.line_col(TextSize::from(char_offset));
        let end = index.line_col(TextSize::from(char_offset + len - 1));
        Some(SourceLocation::from_range(self.path.clone(), start, end))
    }
}
