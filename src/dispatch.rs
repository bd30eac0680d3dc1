//! Frame routing: responses to pending callbacks, pushes to handlers
//!
//! The registry of in-flight requests lives here. A one-shot callback is
//! registered before its request hits the wire and removed exactly once,
//! either when the matching response arrives or when the client stops.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::document;
use crate::types::{Diagnostic, WireDiagnostic};

/// One-shot continuation invoked with the response's `result` value.
/// Runs on the reader thread.
pub type ResponseHandler = Box<dyn FnOnce(Value) + Send>;

/// Push callback invoked with `(path, diagnostics)` on every publish.
/// Runs on the reader thread; each push replaces the previous set wholesale.
pub type DiagnosticsHandler = dyn Fn(&str, Vec<Diagnostic>) + Send + Sync;

/// Routes decoded frames to their continuations
pub struct MessageRouter {
    pending: Mutex<HashMap<i64, ResponseHandler>>,
    diagnostics: Mutex<Option<Arc<DiagnosticsHandler>>>,
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRouter {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            diagnostics: Mutex::new(None),
        }
    }

    /// Register the continuation for an outgoing request id
    pub fn register(&self, id: i64, handler: ResponseHandler) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.insert(id, handler);
    }

    /// Take back a registration whose request never made it onto the wire
    pub fn unregister(&self, id: i64) -> Option<ResponseHandler> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.remove(&id)
    }

    /// Install the diagnostics push callback, replacing any previous one
    pub fn set_diagnostics_handler<F>(&self, handler: F)
    where
        F: Fn(&str, Vec<Diagnostic>) + Send + Sync + 'static,
    {
        let mut slot = self.diagnostics.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(handler));
    }

    /// Number of requests still waiting for a response
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Drop every in-flight registration without invoking it
    pub fn clear(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.clear();
    }

    /// Route one decoded frame.
    ///
    /// Diagnostics pushes go to the registered handler; frames with an id
    /// (numeric or string-encoded) resolve a pending callback, invoked
    /// outside the registry lock; everything else is dropped.
    pub fn dispatch(&self, frame: Value) {
        match frame.get("method").and_then(Value::as_str) {
            Some("textDocument/publishDiagnostics") => {
                self.publish_diagnostics(frame.get("params"));
                return;
            }
            Some("window/logMessage") | Some("window/showMessage") => {
                if let Some(msg) = frame.pointer("/params/message").and_then(Value::as_str) {
                    tracing::debug!("server message: {}", msg);
                }
                return;
            }
            _ => {}
        }

        if let Some(id) = response_id(&frame) {
            let handler = {
                let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
                pending.remove(&id)
            };
            let Some(handler) = handler else {
                tracing::debug!("response for unknown or abandoned id {}", id);
                return;
            };
            let result = match frame {
                Value::Object(mut map) => map.remove("result"),
                _ => None,
            };
            match result {
                Some(result) => handler(result),
                // Error responses and empty responses consume the
                // registration but never reach the continuation
                None => tracing::debug!("response {} carried no result", id),
            }
            return;
        }

        tracing::trace!("dropping unroutable frame");
    }

    fn publish_diagnostics(&self, params: Option<&Value>) {
        let Some(uri) = params.and_then(|p| p.get("uri")).and_then(Value::as_str) else {
            tracing::warn!("publishDiagnostics without a uri");
            return;
        };

        let list: Vec<Diagnostic> = params
            .and_then(|p| p.get("diagnostics"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        serde_json::from_value::<WireDiagnostic>(item.clone()).ok()
                    })
                    .map(Diagnostic::from)
                    .collect()
            })
            .unwrap_or_default();

        let handler = {
            let slot = self.diagnostics.lock().unwrap_or_else(|e| e.into_inner());
            slot.clone()
        };
        match handler {
            Some(handler) => handler(document::uri_to_path(uri), list),
            None => tracing::trace!("diagnostics push with no handler installed"),
        }
    }
}

fn response_id(frame: &Value) -> Option<i64> {
    match frame.get("id") {
        Some(Value::Number(n)) => n.as_i64(),
        // Some servers echo ids back as strings; a string that is not an
        // integer matches nothing
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}
