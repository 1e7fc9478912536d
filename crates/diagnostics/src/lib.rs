//! Diagnostics for the peglint pipeline.
//!
//! Provides [`Diagnostic`], [`Stage`], [`Position`], and [`LineIndex`] types
//! used to report analyzer findings and to map them back onto the grammar or
//! code buffer they came from. [`resolve_target`] converts a diagnostic's
//! human-facing position into the 0-based coordinates editors expect.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};

// ── LineIndex ────────────────────────────────────────────────────────────

/// Maps between byte offsets and line/column positions in a source string.
///
/// Lines and columns are **0-indexed**. Columns returned by
/// [`LineIndex::line_col`] are byte columns; [`LineIndex::offset`] takes a
/// character column, which is how analyzers and editor widgets count.
///
/// The index is built in O(n) time and each lookup is O(log n) via binary
/// search.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    /// `line_starts[0]` is always 0.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build a `LineIndex` from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0usize];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 0-indexed `(line, byte column)` pair.
    ///
    /// If `offset` is past the end of the source, the last line is returned
    /// with the column extending past the line end.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next.saturating_sub(1),
        };
        let col = offset.saturating_sub(self.line_starts[line]);
        (line, col)
    }

    /// Byte offset of the start of the given 0-indexed line.
    ///
    /// Returns `None` if `line` is out of bounds.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Total number of lines (at least 1, even for empty input).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of a 0-indexed `(line, char column)` position in `text`.
    ///
    /// Out-of-range positions are clamped: a line past the end resolves to
    /// the last line, and a column past the line end resolves to the end of
    /// that line (before its newline). `text` must be the string this index
    /// was built from.
    pub fn offset(&self, text: &str, line: usize, column: usize) -> usize {
        let line = line.min(self.line_starts.len() - 1);
        let start = self.line_starts[line];
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(text.len(), |next| next - 1);
        let line_text = &text[start..end];
        let line_text = line_text.strip_suffix('\r').unwrap_or(line_text);
        start
            + line_text
                .char_indices()
                .nth(column)
                .map_or(line_text.len(), |(i, _)| i)
    }
}

// ── Stage ────────────────────────────────────────────────────────────────

/// The validation stage a diagnostic belongs to.
///
/// Grammar diagnostics point into the grammar buffer, code diagnostics into
/// the code buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// The grammar source.
    Grammar,
    /// The code parsed with the grammar.
    Code,
}

impl Stage {
    /// Both stages in evaluation order.
    pub const ALL: [Stage; 2] = [Stage::Grammar, Stage::Code];

    /// Lowercase name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Grammar => "grammar",
            Stage::Code => "code",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grammar" => Ok(Stage::Grammar),
            "code" => Ok(Stage::Code),
            other => Err(format!("unknown stage '{other}' (expected 'grammar' or 'code')")),
        }
    }
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A positioned message produced by the analyzer.
///
/// `line` and `column` are **1-based**, as reported to users. The wire form
/// uses the analyzer's short field names: `{ "ln": 3, "col": 7, "msg": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line number.
    #[serde(rename = "ln")]
    pub line: u32,
    /// 1-based column number.
    #[serde(rename = "col")]
    pub column: u32,
    /// Human-readable message.
    #[serde(rename = "msg")]
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic at a 1-based `line`/`column`.
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }

    /// 0-based position this diagnostic points at. See [`resolve_target`].
    pub fn target(&self) -> Position {
        resolve_target(self)
    }

    /// Byte span of the diagnostic in `source`, one character wide when the
    /// position lands on a character and empty at line ends.
    ///
    /// Used to anchor source-annotated reports.
    pub fn span_in(&self, source: &str, index: &LineIndex) -> std::ops::Range<usize> {
        let Position { line, column } = self.target();
        let start = index.offset(source, line as usize, column as usize);
        let end = source[start..]
            .chars()
            .next()
            .filter(|c| *c != '\n' && *c != '\r')
            .map_or(start, |c| start + c.len_utf8());
        start..end
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} {}", self.line, self.column, self.message)
    }
}

// ── Navigation ───────────────────────────────────────────────────────────

/// A 0-based cursor position in an editor buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 0-based line.
    pub line: u32,
    /// 0-based column.
    pub column: u32,
}

impl Position {
    /// Create a position from 0-based coordinates.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Map a diagnostic to the editor position it refers to.
///
/// Subtracts one from the analyzer's 1-based line and column. No bounds
/// checking against the buffer is done; out-of-range targets are the editor's
/// concern. A zero coordinate (never produced by a well-behaved analyzer)
/// saturates to 0.
pub fn resolve_target(diagnostic: &Diagnostic) -> Position {
    Position {
        line: diagnostic.line.saturating_sub(1),
        column: diagnostic.column.saturating_sub(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── LineIndex ────────────────────────────────────────────────────────

    #[test]
    fn line_index_single_line() {
        let idx = LineIndex::new("hello");
        assert_eq!(idx.line_count(), 1);
        assert_eq!(idx.line_col(0), (0, 0));
        assert_eq!(idx.line_col(4), (0, 4));
    }

    #[test]
    fn line_index_two_lines() {
        let idx = LineIndex::new("ab\ncd");
        assert_eq!(idx.line_count(), 2);
        assert_eq!(idx.line_col(2), (0, 2)); // '\n'
        assert_eq!(idx.line_col(3), (1, 0)); // 'c'
        assert_eq!(idx.line_col(4), (1, 1)); // 'd'
    }

    #[test]
    fn line_index_empty_input() {
        let idx = LineIndex::new("");
        assert_eq!(idx.line_count(), 1);
        assert_eq!(idx.line_col(0), (0, 0));
        assert_eq!(idx.offset("", 3, 9), 0);
    }

    #[test]
    fn line_index_line_start() {
        let idx = LineIndex::new("ab\ncd\nef");
        assert_eq!(idx.line_start(0), Some(0));
        assert_eq!(idx.line_start(1), Some(3));
        assert_eq!(idx.line_start(2), Some(6));
        assert_eq!(idx.line_start(3), None);
    }

    #[test]
    fn offset_counts_chars_not_bytes() {
        // '€' is 3 bytes in UTF-8
        let text = "a€b\nxy";
        let idx = LineIndex::new(text);
        assert_eq!(idx.offset(text, 0, 0), 0);
        assert_eq!(idx.offset(text, 0, 1), 1);
        assert_eq!(idx.offset(text, 0, 2), 4); // 'b'
        assert_eq!(idx.offset(text, 1, 1), 7); // 'y'
    }

    #[test]
    fn offset_clamps_past_line_end_and_last_line() {
        let text = "ab\r\ncd";
        let idx = LineIndex::new(text);
        assert_eq!(idx.offset(text, 0, 50), 2); // before "\r\n"
        assert_eq!(idx.offset(text, 9, 0), 4); // clamped to last line
        assert_eq!(idx.offset(text, 9, 9), 6);
    }

    // ── Stage ────────────────────────────────────────────────────────────

    #[test]
    fn stage_display_and_parse() {
        assert_eq!(Stage::Grammar.to_string(), "grammar");
        assert_eq!(Stage::Code.to_string(), "code");
        assert_eq!("code".parse::<Stage>(), Ok(Stage::Code));
        assert!("ast".parse::<Stage>().is_err());
    }

    // ── Diagnostic ───────────────────────────────────────────────────────

    #[test]
    fn diagnostic_display_is_list_item_form() {
        let d = Diagnostic::new(3, 14, "syntax error, unexpected '<-'.");
        assert_eq!(d.to_string(), "3:14 syntax error, unexpected '<-'.");
    }

    #[test]
    fn diagnostic_uses_analyzer_wire_names() {
        let d: Diagnostic =
            serde_json::from_str(r#"{"ln": 2, "col": 5, "msg": "'Foo' is not defined."}"#)
                .unwrap();
        assert_eq!(d, Diagnostic::new(2, 5, "'Foo' is not defined."));
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"ln":2,"col":5,"msg":"'Foo' is not defined."}"#);
    }

    #[test]
    fn diagnostic_rejects_negative_positions() {
        let r = serde_json::from_str::<Diagnostic>(r#"{"ln": -1, "col": 1, "msg": "x"}"#);
        assert!(r.is_err());
    }

    #[test]
    fn span_in_covers_one_char() {
        let src = "A <- 'a'\nB <- C\n";
        let idx = LineIndex::new(src);
        let d = Diagnostic::new(2, 6, "'C' is not defined.");
        let span = d.span_in(src, &idx);
        assert_eq!(&src[span], "C");
    }

    #[test]
    fn span_in_is_empty_at_line_end() {
        let src = "A <- 'a'\n";
        let idx = LineIndex::new(src);
        let d = Diagnostic::new(1, 9, "expected ';'");
        let span = d.span_in(src, &idx);
        assert_eq!(span, 8..8);
    }

    // ── Navigation ───────────────────────────────────────────────────────

    #[test]
    fn first_position_resolves_to_origin() {
        let d = Diagnostic::new(1, 1, "x");
        assert_eq!(resolve_target(&d), Position::new(0, 0));
    }

    #[test]
    fn resolve_target_is_unchecked() {
        let d = Diagnostic::new(400, 80, "way past the end");
        assert_eq!(d.target(), Position::new(399, 79));
    }

    #[test]
    fn resolve_target_saturates_zero() {
        let d = Diagnostic::new(0, 0, "bad analyzer");
        assert_eq!(d.target(), Position::new(0, 0));
    }
}
