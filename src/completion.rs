//! Completion result normalization
//!
//! Servers answer `textDocument/completion` with either a bare item array
//! or a CompletionList object; both collapse to the same fixed item shape
//! so the editor never sees the difference.

use serde_json::Value;

use crate::types::CompletionItem;

/// Normalize a raw completion `result` into a flat item list.
/// Any shape that is neither an array nor `{items: [...]}` yields an
/// empty list; callers are still invoked either way.
pub fn normalize_result(result: &Value) -> Vec<CompletionItem> {
    let items = if let Some(items) = result.as_array() {
        items
    } else if let Some(items) = result.get("items").and_then(Value::as_array) {
        items
    } else {
        return Vec::new();
    };

    items.iter().map(normalize_item).collect()
}

fn normalize_item(raw: &Value) -> CompletionItem {
    let label = raw
        .get("label")
        .and_then(Value::as_str)
        .unwrap_or("???")
        .to_string();
    let detail = raw
        .get("detail")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let insert_text = raw
        .get("insertText")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| label.clone());

    CompletionItem {
        label,
        detail,
        insert_text,
    }
}
