//! Reading srcML documents into [`ParsedUnit`]s.
//!
//! Accepts either a single `<unit>` or an archive whose root `<unit>` holds
//! one nested `<unit filename="...">` per file. Element positions are derived
//! from the reconstructed source text rather than `pos:` attributes, so every
//! element gets an exact start and (inclusive) end.

use std::path::Path;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::{Language, ParsedUnit, SyntaxElement, SyntaxNode};
use crate::base::{LineCol, LineIndex, TextSize};
use crate::error::{Error, ParseError, Result};

/// Read a srcML file from disk.
pub fn parse_file(path: &Path) -> Result<Vec<ParsedUnit>> {
    let xml = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    let fallback = path.to_string_lossy();
    Ok(parse_str(&xml, Some(fallback.as_ref()))?)
}

/// Read a srcML document.
///
/// `fallback_path` names the unit when a single (non-archive) unit carries no
/// `filename` attribute.
pub fn parse_str(xml: &str, fallback_path: Option<&str>) -> Result<Vec<ParsedUnit>, ParseError> {
    let document = fallback_path.unwrap_or("<srcml>");
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut state = ReaderState::default();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_error(document, reader.error_position(), e))?;
        match event {
            Event::Start(start) => {
                let frame = state.open(&start, document)?;
                state.stack.push(frame);
            }
            Event::Empty(start) => {
                let frame = state.open(&start, document)?;
                state.stack.push(frame);
                state.close(fallback_path)?;
            }
            Event::End(_) => state.close(fallback_path)?,
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| xml_error(document, reader.buffer_position(), e))?;
                state.text(&text);
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                let text = String::from_utf8_lossy(&bytes);
                state.text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !state.stack.is_empty() {
        return Err(ParseError::new(document, "unexpected end of document"));
    }
    if state.units.is_empty() {
        return Err(ParseError::new(document, "document contains no srcML unit"));
    }
    Ok(state.units)
}

fn xml_error(document: &str, position: u64, err: impl std::fmt::Display) -> ParseError {
    ParseError::new(document, format!("malformed srcML at byte {}: {}", position, err))
}

struct Frame {
    node: SyntaxNode,
    /// Character offset (relative to the enclosing file unit) where the element starts.
    start: u32,
    child_counts: FxHashMap<SmolStr, u32>,
    /// Character offset base for `<unit>` frames.
    unit_base: Option<u32>,
    /// Set on the root unit once a nested unit has been seen.
    is_archive: bool,
}

#[derive(Default)]
struct ReaderState {
    stack: Vec<Frame>,
    units: Vec<ParsedUnit>,
    /// Characters of source text seen so far (whole document).
    offset: u32,
}

impl ReaderState {
    fn unit_base(&self) -> u32 {
        self.stack
            .iter()
            .rev()
            .find_map(|f| f.unit_base)
            .unwrap_or(0)
    }

    fn open(&mut self, start: &BytesStart<'_>, document: &str) -> Result<Frame, ParseError> {
        let local = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let prefix = start
            .name()
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());

        let tag: SmolStr = match prefix.as_deref() {
            Some("cpp") => SmolStr::from(format!("cpp:{}", local)),
            _ => SmolStr::from(local.as_str()),
        };

        if self.stack.is_empty() && tag != "unit" {
            return Err(ParseError::new(
                document,
                format!("expected <unit> root element, found <{}>", tag),
            ));
        }

        let is_unit = tag == "unit";
        if is_unit {
            if let Some(parent) = self.stack.last_mut() {
                if parent.node.is("unit") {
                    parent.is_archive = true;
                }
            }
        }

        let xpath_step = format!("{}:{}", prefix.as_deref().unwrap_or("src"), local);
        let xpath: Arc<str> = match self.stack.last_mut() {
            Some(parent) if !(is_unit && parent.node.is("unit")) => {
                let count = parent.child_counts.entry(tag.clone()).or_insert(0);
                *count += 1;
                Arc::from(format!("{}/{}[{}]", parent.node.xpath(), xpath_step, count))
            }
            _ => Arc::from(format!("/{}", xpath_step)),
        };

        let mut node = SyntaxNode::new(tag).with_xpath(xpath);
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::new(document, format!("malformed attribute: {}", e)))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::new(document, format!("malformed attribute value: {}", e)))?;
            node = node.with_attribute(key, value.as_ref());
        }

        let unit_base = is_unit.then_some(self.offset);
        let base = unit_base.unwrap_or_else(|| self.unit_base());
        Ok(Frame {
            node,
            start: self.offset - base,
            child_counts: FxHashMap::default(),
            unit_base,
            is_archive: false,
        })
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(frame) = self.stack.last_mut() {
            frame.node.push(SyntaxElement::Text(SmolStr::from(text)));
        }
        self.offset += text.chars().count() as u32;
    }

    fn close(&mut self, fallback_path: Option<&str>) -> Result<(), ParseError> {
        let Some(frame) = self.stack.pop() else {
            return Err(ParseError::new(
                fallback_path.unwrap_or("<srcml>"),
                "unbalanced closing tag",
            ));
        };
        let base = frame.unit_base.unwrap_or_else(|| self.unit_base());
        let end = self.offset - base;
        let mut node = frame.node;
        // Spans are stored as raw offsets until the whole unit is known.
        node.set_span(
            LineCol::new(0, frame.start),
            LineCol::new(0, end.saturating_sub(1).max(frame.start)),
        );

        let is_file_unit = node.is("unit") && !frame.is_archive;
        if is_file_unit {
            let parent_language = self
                .stack
                .first()
                .and_then(|root| root.node.attribute("language"))
                .map(Language::from_srcml_name);
            self.units
                .push(finish_unit(node, parent_language, fallback_path)?);
            return Ok(());
        }

        // The archive root has no parent; its file units were already emitted.
        if let Some(parent) = self.stack.last_mut() {
            parent.node.push(SyntaxElement::Node(node));
        }
        Ok(())
    }
}

fn finish_unit(
    mut root: SyntaxNode,
    inherited_language: Option<Language>,
    fallback_path: Option<&str>,
) -> Result<ParsedUnit, ParseError> {
    let path: Arc<str> = match root.attribute("filename").or(fallback_path) {
        Some(path) => Arc::from(path),
        None => return Err(ParseError::new("<srcml>", "unit has no filename")),
    };
    let language = root
        .attribute("language")
        .map(Language::from_srcml_name)
        .or(inherited_language)
        .unwrap_or_else(|| Language::from_extension(&path));

    let source = root.text();
    let index = LineIndex::new(&source);
    resolve_spans(&mut root, &index);
    Ok(ParsedUnit::new(path, language, root))
}

fn resolve_spans(node: &mut SyntaxNode, index: &LineIndex) {
    let start = index.line_col(TextSize::from(node.start().col));
    let end = index.line_col(TextSize::from(node.end().col));
    node.set_span(start, end);
    for child in node.children_mut() {
        if let SyntaxElement::Node(child) = child {
            resolve_spans(child, index);
        }
    }
}

impl SyntaxNode {
    fn children_mut(&mut self) -> &mut [SyntaxElement] {
        &mut self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<unit xmlns="http://www.srcML.org/srcML/src" revision="1.0.0" language="C++" filename="a.cpp"><decl_stmt><decl><type><name>int</name></type> <name>x</name></decl>;</decl_stmt>
<function><type><name>void</name></type> <name>f</name><parameter_list>()</parameter_list>
<block>{<block_content>
  <expr_stmt><expr><name>x</name> <operator>&lt;</operator> <literal type="number">1</literal></expr>;</expr_stmt>
</block_content>}</block></function>
</unit>"#;

    #[test]
    fn test_single_unit() {
        let units = parse_str(SINGLE, None).expect("valid srcML");
        assert_eq!(units.len(), 1);

        let unit = &units[0];
        assert_eq!(unit.path.as_ref(), "a.cpp");
        assert_eq!(unit.language, Language::CPlusPlus);
        assert!(unit.source().contains("x < 1;"));

        let function = unit.root.child("function").expect("function element");
        assert_eq!(function.start(), LineCol::new(1, 0));
        assert_eq!(function.end().line, 4);
        assert_eq!(function.xpath(), "/src:unit/src:function[1]");

        let name = function.child("name").expect("function name");
        assert_eq!(name.text(), "f");
        assert_eq!(name.start(), LineCol::new(1, 5));
        assert_eq!(name.end(), LineCol::new(1, 5));
    }

    #[test]
    fn test_archive_units() {
        let xml = r#"<unit xmlns="http://www.srcML.org/srcML/src" revision="1.0.0">
<unit language="Java" filename="A.java"><class>class <name>A</name> <block>{}</block></class></unit>
<unit language="C#" filename="B.cs"><class>class <name>B</name> <block>{}</block></class></unit>
</unit>"#;
        let units = parse_str(xml, None).expect("valid archive");
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].language, Language::Java);
        assert_eq!(units[1].path.as_ref(), "B.cs");

        // Positions restart for every file unit.
        let class = units[1].root.child("class").expect("class");
        assert_eq!(class.start(), LineCol::new(0, 0));
        assert_eq!(class.xpath(), "/src:unit/src:class[1]");
    }

    #[test]
    fn test_missing_filename_uses_fallback() {
        let xml = r#"<unit xmlns="http://www.srcML.org/srcML/src" language="C"><name>x</name></unit>"#;
        let units = parse_str(xml, Some("x.c")).expect("valid");
        assert_eq!(units[0].path.as_ref(), "x.c");
        assert!(parse_str(xml, None).is_err());
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse_str("<unit filename=\"a.c\"><block></unit>", None).unwrap_err();
        assert!(err.reason.contains("malformed") || err.reason.contains("unbalanced"));
    }

    #[test]
    fn test_wrong_root() {
        let err = parse_str("<block/>", Some("a.c")).unwrap_err();
        assert!(err.reason.contains("expected <unit>"));
    }

    #[test]
    fn test_preprocessor_prefix_kept() {
        let xml = r#"<unit xmlns="http://www.srcML.org/srcML/src" xmlns:cpp="http://www.srcML.org/srcML/cpp" filename="a.h"><cpp:include>#<cpp:directive>include</cpp:directive></cpp:include>
</unit>"#;
        let units = parse_str(xml, None).expect("valid");
        let include = units[0].root.child_nodes().next().expect("include");
        assert_eq!(include.tag(), "cpp:include");
        assert_eq!(include.xpath(), "/src:unit/cpp:include[1]");
    }
}
