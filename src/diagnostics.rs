//! Diagnostics storage
//!
//! Keeps the latest server-published set per document. Every push replaces
//! the previous set for that path wholesale; the server owns the truth.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::{Diagnostic, Severity};

/// Thread-safe store of published diagnostics, keyed by file path.
///
/// Writes come from the reader thread (via the diagnostics callback);
/// reads come from the UI loop.
#[derive(Debug, Default)]
pub struct DiagnosticsStore {
    by_path: RwLock<HashMap<String, Vec<Diagnostic>>>,
}

impl DiagnosticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the diagnostics for a path. An empty push clears the entry.
    pub fn replace(&self, path: &str, diagnostics: Vec<Diagnostic>) {
        let mut by_path = self.by_path.write().unwrap_or_else(|e| e.into_inner());
        if diagnostics.is_empty() {
            by_path.remove(path);
        } else {
            by_path.insert(path.to_string(), diagnostics);
        }
    }

    /// Current diagnostics for a path (empty when the file is clean)
    pub fn for_path(&self, path: &str) -> Vec<Diagnostic> {
        let by_path = self.by_path.read().unwrap_or_else(|e| e.into_inner());
        by_path.get(path).cloned().unwrap_or_default()
    }

    /// Total error count across all files
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Total warning count across all files
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        let by_path = self.by_path.read().unwrap_or_else(|e| e.into_inner());
        by_path
            .values()
            .flat_map(|diags| diags.iter())
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Format everything for a problems panel or log dump
    pub fn format_for_display(&self) -> String {
        let by_path = self.by_path.read().unwrap_or_else(|e| e.into_inner());
        let mut output = String::new();
        for (path, diagnostics) in by_path.iter() {
            for diag in diagnostics {
                output.push_str(&format!("{}: {}\n", path, diag.pretty()));
            }
        }
        output
    }

    pub fn clear(&self) {
        let mut by_path = self.by_path.write().unwrap_or_else(|e| e.into_inner());
        by_path.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(message: &str, severity: Severity) -> Diagnostic {
        Diagnostic {
            line: 0,
            column_start: 0,
            column_end: 1,
            message: message.into(),
            severity,
        }
    }

    #[test]
    fn test_push_replaces_wholesale() {
        let store = DiagnosticsStore::new();
        store.replace(
            "a.cpp",
            vec![diag("one", Severity::Error), diag("two", Severity::Warning)],
        );
        assert_eq!(store.for_path("a.cpp").len(), 2);

        store.replace("a.cpp", vec![diag("three", Severity::Error)]);
        let current = store.for_path("a.cpp");
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].message, "three");
    }

    #[test]
    fn test_empty_push_clears_path() {
        let store = DiagnosticsStore::new();
        store.replace(
            "a.cpp",
            vec![diag("d1", Severity::Error), diag("d2", Severity::Error)],
        );
        store.replace("a.cpp", Vec::new());
        assert!(store.for_path("a.cpp").is_empty());
        assert_eq!(store.error_count(), 0);
    }

    #[test]
    fn test_paths_are_independent() {
        let store = DiagnosticsStore::new();
        store.replace("a.cpp", vec![diag("a", Severity::Error)]);
        store.replace("b.cpp", vec![diag("b", Severity::Warning)]);

        store.replace("a.cpp", Vec::new());
        assert!(store.for_path("a.cpp").is_empty());
        assert_eq!(store.for_path("b.cpp").len(), 1);
    }

    #[test]
    fn test_severity_counts() {
        let store = DiagnosticsStore::new();
        store.replace(
            "a.cpp",
            vec![
                diag("e1", Severity::Error),
                diag("w1", Severity::Warning),
                diag("h1", Severity::Hint),
            ],
        );
        store.replace("b.cpp", vec![diag("e2", Severity::Error)]);

        assert_eq!(store.error_count(), 2);
        assert_eq!(store.warning_count(), 1);
    }

    #[test]
    fn test_display_format() {
        let store = DiagnosticsStore::new();
        store.replace("src/a.cpp", vec![diag("missing ';'", Severity::Error)]);

        let text = store.format_for_display();
        assert!(text.contains("src/a.cpp"));
        assert!(text.contains("ERROR"));
        assert!(text.contains("missing ';'"));
    }
}
