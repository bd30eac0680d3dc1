//! Open-document tracking
//!
//! Versions each document for didOpen/didChange notifications and owns the
//! path ↔ `file://` URI mapping used on the wire.

use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone)]
struct DocumentState {
    version: i32,
    language_id: String,
}

/// Tracks which documents the server has been told about
#[derive(Debug, Default)]
pub struct DocumentTracker {
    open_docs: HashMap<String, DocumentState>,
}

impl DocumentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, uri: &str) -> bool {
        self.open_docs.contains_key(uri)
    }

    /// Register a document and return the version for its didOpen.
    /// Reopening resets the version to 1.
    pub fn open(&mut self, uri: &str, language_id: &str) -> i32 {
        self.open_docs.insert(
            uri.to_string(),
            DocumentState {
                version: 1,
                language_id: language_id.to_string(),
            },
        );
        1
    }

    /// Bump and return the version for a didChange notification.
    ///
    /// Unknown documents are registered on the fly so a missed didOpen
    /// still produces strictly increasing versions.
    pub fn change(&mut self, uri: &str) -> i32 {
        let state = self
            .open_docs
            .entry(uri.to_string())
            .or_insert_with(|| DocumentState {
                version: 1,
                language_id: language_id_for_path(uri).to_string(),
            });
        state.version += 1;
        state.version
    }

    pub fn close(&mut self, uri: &str) {
        self.open_docs.remove(uri);
    }

    pub fn version(&self, uri: &str) -> Option<i32> {
        self.open_docs.get(uri).map(|s| s.version)
    }

    pub fn language_id(&self, uri: &str) -> Option<&str> {
        self.open_docs.get(uri).map(|s| s.language_id.as_str())
    }

    pub fn open_documents(&self) -> Vec<&str> {
        self.open_docs.keys().map(|s| s.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.open_docs.clear();
    }
}

/// Convert a file path to a `file://` URI.
/// Backslashes are normalized so Windows paths produce sane URIs.
pub fn path_to_uri(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    if normalized.starts_with("file://") {
        return normalized;
    }
    let absolute = if normalized.starts_with('/') {
        normalized
    } else {
        Path::new(&normalized)
            .canonicalize()
            .map(|p| p.display().to_string())
            .unwrap_or(normalized)
    };
    format!("file://{}", absolute)
}

/// Extract the file path from a `file://` URI
pub fn uri_to_path(uri: &str) -> &str {
    uri.strip_prefix("file://").unwrap_or(uri)
}

/// Get the LSP language id from a file extension
pub fn language_id_for_path(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match ext.to_lowercase().as_str() {
        "c" => "c",
        "h" | "hpp" | "hh" | "hxx" => "cpp",
        "cpp" | "cc" | "cxx" | "c++" => "cpp",
        "rs" => "rust",
        "py" | "pyi" => "python",
        "ts" => "typescript",
        "tsx" => "typescriptreact",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "go" => "go",
        "java" => "java",
        "json" => "json",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        _ => "plaintext",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lifecycle() {
        let mut tracker = DocumentTracker::new();
        let uri = "file:///test.cpp";

        assert!(!tracker.is_open(uri));

        assert_eq!(tracker.open(uri, "cpp"), 1);
        assert!(tracker.is_open(uri));
        assert_eq!(tracker.language_id(uri), Some("cpp"));

        assert_eq!(tracker.change(uri), 2);
        assert_eq!(tracker.change(uri), 3);
        assert_eq!(tracker.version(uri), Some(3));

        tracker.close(uri);
        assert!(!tracker.is_open(uri));
    }

    #[test]
    fn test_reopen_resets_version() {
        let mut tracker = DocumentTracker::new();
        let uri = "file:///test.rs";
        tracker.open(uri, "rust");
        tracker.change(uri);
        assert_eq!(tracker.open(uri, "rust"), 1);
        assert_eq!(tracker.version(uri), Some(1));
    }

    #[test]
    fn test_change_registers_unknown_document() {
        let mut tracker = DocumentTracker::new();
        assert_eq!(tracker.change("file:///late.cpp"), 2);
        assert!(tracker.is_open("file:///late.cpp"));
    }

    #[test]
    fn test_path_to_uri() {
        assert_eq!(path_to_uri("/home/user/test.rs"), "file:///home/user/test.rs");
        // Already a URI: untouched
        assert_eq!(path_to_uri("file:///x.c"), "file:///x.c");
        // Windows separators are normalized
        assert_eq!(path_to_uri("\\proj\\a.cpp"), "file:///proj/a.cpp");
    }

    #[test]
    fn test_uri_to_path() {
        assert_eq!(uri_to_path("file:///home/user/test.rs"), "/home/user/test.rs");
        assert_eq!(uri_to_path("/already/a/path"), "/already/a/path");
    }

    #[test]
    fn test_language_id() {
        assert_eq!(language_id_for_path("main.cpp"), "cpp");
        assert_eq!(language_id_for_path("lib.rs"), "rust");
        assert_eq!(language_id_for_path("script.PY"), "python");
        assert_eq!(language_id_for_path("notes.txt"), "plaintext");
    }
}
