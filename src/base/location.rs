//! Source positions and the `SourceLocation` addressing unit.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use text_size::TextSize;

/// A line and column position in source text.
///
/// Both line and column are 0-indexed internally, but displayed as 1-indexed
/// (srcML and every editor count from 1).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column (in characters)
    pub col: u32,
}

impl LineCol {
    /// Create a new LineCol position.
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Create from 1-indexed line and column (as displayed to users).
    #[inline]
    pub const fn from_one_indexed(line: u32, col: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            col: col.saturating_sub(1),
        }
    }

    /// Get 1-indexed line number (for display).
    #[inline]
    pub const fn line_one_indexed(self) -> u32 {
        self.line + 1
    }

    /// Get 1-indexed column number (for display).
    #[inline]
    pub const fn col_one_indexed(self) -> u32 {
        self.col + 1
    }
}

impl fmt::Debug for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_one_indexed(), self.col_one_indexed())
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_one_indexed(), self.col_one_indexed())
    }
}

/// Index for converting between offsets and line/column positions.
///
/// Offsets are counted in characters so that columns match what srcML
/// reports for the reconstructed source text.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Offset of the start of each line
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];

        for (offset, c) in text.chars().enumerate() {
            if c == '\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }

        Self { line_starts }
    }

    /// Convert an offset to a line/column position.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);

        let line_start = self.line_starts[line];
        let col = offset - line_start;

        LineCol {
            line: line as u32,
            col: col.into(),
        }
    }

    /// Convert a line/column position to an offset.
    pub fn offset(&self, line_col: LineCol) -> Option<TextSize> {
        let line_start = self.line_starts.get(line_col.line as usize)?;
        Some(*line_start + TextSize::from(line_col.col))
    }

    /// Get the number of lines.
    pub fn len(&self) -> usize {
        self.line_starts.len()
    }

    /// Check if there are no lines.
    pub fn is_empty(&self) -> bool {
        self.line_starts.is_empty()
    }
}

/// A position (and optionally an extent) inside one source file.
///
/// Locations order by file, then by start `(line, column)`, then by end, so a
/// sorted list of locations inside one file is in source order. Equality is
/// structural.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceLocation {
    file: Arc<str>,
    start: LineCol,
    end: Option<LineCol>,
    xpath: Arc<str>,
}

impl SourceLocation {
    /// Create a point location from a 1-indexed line and column.
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            start: LineCol::from_one_indexed(line, column),
            end: None,
            xpath: Arc::from(""),
        }
    }

    /// Create a location spanning `start..=end` (0-indexed positions).
    pub fn from_range(file: impl Into<Arc<str>>, start: LineCol, end: LineCol) -> Self {
        Self {
            file: file.into(),
            start,
            end: Some(end),
            xpath: Arc::from(""),
        }
    }

    /// Set the 1-indexed end position.
    pub fn with_end(mut self, line: u32, column: u32) -> Self {
        self.end = Some(LineCol::from_one_indexed(line, column));
        self
    }

    /// Attach the XPath of the srcML element this location came from.
    pub fn with_xpath(mut self, xpath: impl Into<Arc<str>>) -> Self {
        self.xpath = xpath.into();
        self
    }

    /// The same position in another file (used when a file is renamed).
    pub fn with_file(mut self, file: impl Into<Arc<str>>) -> Self {
        self.file = file.into();
        self
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub(crate) fn file_arc(&self) -> &Arc<str> {
        &self.file
    }

    pub fn start(&self) -> LineCol {
        self.start
    }

    pub fn end(&self) -> Option<LineCol> {
        self.end
    }

    pub fn xpath(&self) -> &str {
        &self.xpath
    }

    /// 1-indexed start line.
    pub fn start_line(&self) -> u32 {
        self.start.line_one_indexed()
    }

    /// 1-indexed start column.
    pub fn start_column(&self) -> u32 {
        self.start.col_one_indexed()
    }

    /// 1-indexed end line, if the location has an extent.
    pub fn end_line(&self) -> Option<u32> {
        self.end.map(LineCol::line_one_indexed)
    }

    /// 1-indexed end column, if the location has an extent.
    pub fn end_column(&self) -> Option<u32> {
        self.end.map(LineCol::col_one_indexed)
    }

    fn end_or_start(&self) -> LineCol {
        self.end.unwrap_or(self.start)
    }

    /// Whether `other` lies inside this location.
    ///
    /// Locations with an extent use `(line, column)` intervals. A point
    /// location falls back to XPath prefix containment when both sides carry
    /// an XPath, and to position equality otherwise.
    pub fn contains(&self, other: &SourceLocation) -> bool {
        if self.file != other.file {
            return false;
        }
        match self.end {
            Some(end) => self.start <= other.start && other.end_or_start() <= end,
            None if !self.xpath.is_empty() && !other.xpath.is_empty() => {
                xpath_contains(&self.xpath, &other.xpath)
            }
            None => self.start == other.start,
        }
    }

    /// Whether this location starts strictly before `other` in the same file.
    pub fn precedes(&self, other: &SourceLocation) -> bool {
        self.file == other.file && self.start < other.start
    }

    /// Compare only the start `(line, column)` positions.
    pub fn position_cmp(&self, other: &SourceLocation) -> Ordering {
        self.start.cmp(&other.start)
    }
}

fn xpath_contains(outer: &str, inner: &str) -> bool {
    match inner.strip_prefix(outer) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl PartialOrd for SourceLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourceLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file
            .cmp(&other.file)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
            .then(self.xpath.cmp(&other.xpath))
    }
}

impl fmt::Debug for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}:{}-{}", self.file, self.start, end),
            None => write!(f, "{}:{}", self.file, self.start),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: line {}, column {}",
            self.file,
            self.start_line(),
            self.start_column()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_display() {
        let pos = LineCol::new(0, 0);
        assert_eq!(format!("{}", pos), "1:1");

        let pos = LineCol::new(5, 10);
        assert_eq!(format!("{}", pos), "6:11");
    }

    #[test]
    fn test_line_index_multi_line() {
        let index = LineIndex::new("int x;\n{\n  f(x);\n}");

        assert_eq!(index.line_col(TextSize::from(0)), LineCol::new(0, 0));
        assert_eq!(index.line_col(TextSize::from(7)), LineCol::new(1, 0));
        assert_eq!(index.line_col(TextSize::from(11)), LineCol::new(2, 2));
        assert_eq!(index.offset(LineCol::new(2, 2)), Some(TextSize::from(11)));
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_line_index_counts_characters() {
        let index = LineIndex::new("é\nx");
        assert_eq!(index.line_col(TextSize::from(2)), LineCol::new(1, 0));
    }

    #[test]
    fn test_location_contains_interval() {
        let outer = SourceLocation::new("a.cpp", 1, 1).with_end(10, 1);
        let inner = SourceLocation::new("a.cpp", 3, 5).with_end(3, 9);
        let elsewhere = SourceLocation::new("b.cpp", 3, 5);

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(!outer.contains(&elsewhere));
        assert!(outer.contains(&outer));
    }

    #[test]
    fn test_location_contains_by_xpath() {
        let outer = SourceLocation::new("a.cpp", 1, 1).with_xpath("/src:unit/src:class[1]");
        let inner = SourceLocation::new("a.cpp", 2, 1)
            .with_xpath("/src:unit/src:class[1]/src:block[1]");
        let sibling = SourceLocation::new("a.cpp", 9, 1).with_xpath("/src:unit/src:class[10]");

        assert!(outer.contains(&inner));
        assert!(!outer.contains(&sibling));
    }

    #[test]
    fn test_location_ordering() {
        let mut locations = vec![
            SourceLocation::new("b.cpp", 1, 1),
            SourceLocation::new("a.cpp", 4, 2),
            SourceLocation::new("a.cpp", 4, 1),
        ];
        locations.sort();

        assert_eq!(locations[0], SourceLocation::new("a.cpp", 4, 1));
        assert_eq!(locations[1], SourceLocation::new("a.cpp", 4, 2));
        assert_eq!(locations[2].file(), "b.cpp");
        assert!(locations[0].precedes(&locations[1]));
        assert!(!locations[1].precedes(&locations[2]));
    }

    #[test]
    fn test_location_display() {
        let loc = SourceLocation::new("a.cpp", 3, 7);
        assert_eq!(loc.to_string(), "a.cpp: line 3, column 7");
        assert_eq!(loc.start_line(), 3);
        assert_eq!(loc.start_column(), 7);
        assert_eq!(loc.end_line(), None);
    }
}
