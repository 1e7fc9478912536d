//! In-memory model of the two editor buffers.

use peglint_diagnostics::{LineIndex, Position, Stage};

/// A named, versioned text buffer.
///
/// The buffer is the controller's view of an editor widget: hosts mirror
/// widget edits into it with [`SourceBuffer::edit`] and apply cursor moves
/// back to the widget from [`SourceBuffer::cursor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    name: Stage,
    text: String,
    version: u64,
    cursor: Position,
    focused: bool,
}

impl SourceBuffer {
    /// Create an empty buffer at version 0.
    pub fn new(name: Stage) -> Self {
        Self {
            name,
            text: String::new(),
            version: 0,
            cursor: Position::default(),
            focused: false,
        }
    }

    /// Which buffer this is.
    pub fn name(&self) -> Stage {
        self.name
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Edit counter. Increases by one on every [`SourceBuffer::edit`].
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Current 0-based cursor position, as last navigated to.
    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Whether the buffer was focused by the last navigation.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Restore persisted text at startup.
    ///
    /// Moves the cursor to the origin and does not count as an edit.
    pub fn load(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = Position::default();
    }

    /// Replace the text, bumping the version even when the text is unchanged.
    pub fn edit(&mut self, text: impl Into<String>) -> u64 {
        self.text = text.into();
        self.version += 1;
        self.version
    }

    /// Move the cursor to a 0-based position. Not bounds-checked.
    pub fn navigate_to(&mut self, target: Position) {
        self.cursor = target;
    }

    /// Give this buffer input focus.
    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Drop input focus.
    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Byte offset of the cursor, clamped into the text.
    pub fn cursor_offset(&self) -> usize {
        LineIndex::new(&self.text).offset(
            &self.text,
            self.cursor.line as usize,
            self.cursor.column as usize,
        )
    }
}

/// Consistent copy of both buffers taken at the start of an analysis cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Grammar text.
    pub grammar: String,
    /// Code text.
    pub code: String,
    /// Grammar buffer version at snapshot time.
    pub grammar_version: u64,
    /// Code buffer version at snapshot time.
    pub code_version: u64,
}

impl Snapshot {
    /// Capture both buffers.
    pub fn capture(grammar: &SourceBuffer, code: &SourceBuffer) -> Self {
        Self {
            grammar: grammar.text().to_owned(),
            code: code.text().to_owned(),
            grammar_version: grammar.version(),
            code_version: code.version(),
        }
    }
}
