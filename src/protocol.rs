//! JSON-RPC protocol handling
//!
//! Implements the JSON-RPC 2.0 message format used by language servers:
//! outgoing envelopes with Content-Length framing, and an incremental
//! decoder that reassembles frames from arbitrarily chunked pipe reads.

use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};

/// JSON-RPC version constant
pub const JSONRPC_VERSION: &str = "2.0";

const HEADER_MARKER: &[u8] = b"Content-Length:";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// JSON-RPC request message
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: i64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: i64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }

    /// Encode to the wire format with Content-Length header
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        encode_body(self)
    }
}

/// JSON-RPC notification (no id, no response expected)
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
        }
    }

    /// Encode to the wire format with Content-Length header
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        encode_body(self)
    }
}

fn encode_body<T: Serialize>(message: &T) -> Result<Vec<u8>, serde_json::Error> {
    let body = serde_json::to_string(message)?;
    let framed = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);
    Ok(framed.into_bytes())
}

/// Atomic id generator for outgoing requests.
/// Ids start at 1, strictly increase, and are never reused.
pub struct IdGenerator(AtomicI64);

impl IdGenerator {
    pub fn new() -> Self {
        Self(AtomicI64::new(1))
    }

    pub fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental decoder for Content-Length framed messages.
///
/// Bytes arrive in whatever chunks the pipe hands out; partial frames are
/// carried over between [`feed`](Self::feed) calls. Decoding the same total
/// byte sequence yields the same frames regardless of how it was split.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every complete frame out of the buffer.
    ///
    /// A header whose length fails to parse is discarded through its
    /// separator so one corrupt header cannot wedge the stream; a payload
    /// that is not valid JSON drops only that frame.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        loop {
            let Some(marker) = find(&self.buf, HEADER_MARKER) else {
                break;
            };
            let Some(header_end) = find(&self.buf[marker..], HEADER_END) else {
                break;
            };
            let body_start = marker + header_end + HEADER_END.len();

            // The declared length is the remainder of the Content-Length
            // line; later headers (Content-Type) sit on their own lines.
            let value = &self.buf[marker + HEADER_MARKER.len()..marker + header_end];
            let first_line = value
                .split(|&b| b == b'\r' || b == b'\n')
                .next()
                .unwrap_or(&[]);
            let declared = std::str::from_utf8(first_line)
                .ok()
                .and_then(|s| s.trim().parse::<usize>().ok());

            let Some(length) = declared else {
                tracing::warn!("discarding corrupt Content-Length header");
                self.buf.drain(..body_start);
                continue;
            };

            if self.buf.len() < body_start + length {
                // Wait for the rest of the payload
                break;
            }

            match serde_json::from_slice(&self.buf[body_start..body_start + length]) {
                Ok(frame) => frames.push(frame),
                Err(e) => tracing::warn!("dropping unparseable frame: {}", e),
            }
            self.buf.drain(..body_start + length);
        }
        frames
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
