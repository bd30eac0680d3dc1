//! Core types for language-server communication
//!
//! Wire-facing shapes (Position, severity codes) plus the normalized
//! forms handed to the consumer (Diagnostic, CompletionItem).

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// A position in a text document (0-indexed, as on the wire)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-indexed)
    pub line: u32,
    /// Character offset in the line (0-indexed)
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Convert from 1-indexed (user-facing) to 0-indexed (LSP)
    pub fn from_one_indexed(line: u32, character: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            character: character.saturating_sub(1),
        }
    }

    /// Convert to 1-indexed (user-facing) from 0-indexed (LSP)
    pub fn to_one_indexed(&self) -> (u32, u32) {
        (self.line + 1, self.character + 1)
    }
}

/// Diagnostic severity (integers per LSP spec)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
            Severity::Information => "INFO",
            Severity::Hint => "HINT",
        }
    }
}

/// Range in a document as published by the server
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct WireRange {
    pub start: Position,
    pub end: Position,
}

/// A single diagnostic as it appears inside `publishDiagnostics` params.
/// Items that fail to decode (no range, out-of-range severity) are skipped
/// individually rather than poisoning the whole push.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireDiagnostic {
    pub range: WireRange,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// A server-reported issue, normalized for the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Line the issue starts on (0-indexed)
    pub line: u32,
    /// First column of the highlighted span
    pub column_start: u32,
    /// Column one past the end of the span
    pub column_end: u32,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    /// Format for logs and status lines: `ERROR [12:5] expected ';'`
    pub fn pretty(&self) -> String {
        let (line, col) = Position::new(self.line, self.column_start).to_one_indexed();
        format!("{} [{}:{}] {}", self.severity.as_str(), line, col, self.message)
    }
}

impl From<WireDiagnostic> for Diagnostic {
    fn from(raw: WireDiagnostic) -> Self {
        Self {
            line: raw.range.start.line,
            column_start: raw.range.start.character,
            column_end: raw.range.end.character,
            message: raw.message,
            // Servers may omit severity; treat those as errors
            severity: raw.severity.unwrap_or(Severity::Error),
        }
    }
}

/// A single completion suggestion, normalized from the wire shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    /// Text shown in the popup
    pub label: String,
    /// Secondary text (type signature, namespace)
    pub detail: String,
    /// Text inserted when the item is accepted
    pub insert_text: String,
}
