//! Language-server client
//!
//! One instance per server process. Requests and notifications go out on
//! the calling thread; a dedicated reader thread decodes every frame the
//! server writes back and routes it through the message router.
//!
//! There is no blocking wait for a response anywhere: results arrive by
//! callback on the reader thread, keyed by request id. A pending callback
//! simply never fires if the server dies first.

use serde_json::{json, Value};
use std::io::Read;
use std::path::Path;
use std::process::ChildStdout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::completion;
use crate::config::ServerConfig;
use crate::dispatch::{MessageRouter, ResponseHandler};
use crate::document::{self, DocumentTracker};
use crate::error::{LspError, Result};
use crate::process::ProcessHost;
use crate::protocol::{FrameDecoder, IdGenerator, JsonRpcNotification, JsonRpcRequest};
use crate::types::{CompletionItem, Diagnostic};

const READ_BUF_SIZE: usize = 4096;

/// Client for a single language server.
///
/// All methods are called from the initiating thread (normally the UI
/// loop). [`stop`](Self::stop) joins the reader thread and therefore must
/// never be called from inside a completion or diagnostics callback.
pub struct LspClient {
    host: ProcessHost,
    router: Arc<MessageRouter>,
    ids: IdGenerator,
    /// Cleared by the reader thread when the server's pipe closes
    alive: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    documents: DocumentTracker,
}

impl Default for LspClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LspClient {
    pub fn new() -> Self {
        Self {
            host: ProcessHost::new(),
            router: Arc::new(MessageRouter::new()),
            ids: IdGenerator::new(),
            alive: Arc::new(AtomicBool::new(false)),
            reader: None,
            documents: DocumentTracker::new(),
        }
    }

    /// Spawn the server and start the reader thread.
    pub fn start(&mut self, config: &ServerConfig) -> Result<()> {
        let stdout = self.host.start(config)?;

        let alive = Arc::new(AtomicBool::new(true));
        let router = self.router.clone();
        let reader_alive = alive.clone();
        let reader = thread::Builder::new()
            .name("lsp-reader".to_string())
            .spawn(move || {
                reader_loop(stdout, &router);
                reader_alive.store(false, Ordering::SeqCst);
            })
            .map_err(|e| {
                self.host.stop();
                LspError::Io(e)
            })?;

        self.alive = alive;
        self.reader = Some(reader);
        Ok(())
    }

    /// Shut the server down and join the reader thread. Idempotent.
    ///
    /// Outstanding request callbacks are discarded without being invoked;
    /// callers must not assume their continuation always runs.
    pub fn stop(&mut self) {
        if self.host.is_running() {
            // Best-effort graceful shutdown before the kill; the reply is
            // discarded along with every other pending registration below
            let _ = self.send_request("shutdown", None, Box::new(|_| {}));
            let _ = self.send_notification("exit", None);
        }

        self.host.stop();
        if let Some(reader) = self.reader.take() {
            if let Err(e) = reader.join() {
                tracing::error!("reader thread panicked: {:?}", e);
            }
        }
        self.alive.store(false, Ordering::SeqCst);

        self.router.clear();
        self.documents.clear();
    }

    /// True while the server process is up and its pipe is still open.
    ///
    /// Flips to false on its own when the server dies; no restart is
    /// attempted; the owner decides whether to build a new client.
    pub fn is_running(&self) -> bool {
        self.host.is_running() && self.alive.load(Ordering::SeqCst)
    }

    /// Install the callback invoked (on the reader thread) with
    /// `(path, diagnostics)` for every publish. Each push replaces the
    /// previous set for that path wholesale.
    pub fn set_diagnostics_handler<F>(&self, handler: F)
    where
        F: Fn(&str, Vec<Diagnostic>) + Send + Sync + 'static,
    {
        self.router.set_diagnostics_handler(handler);
    }

    /// Send the `initialize` handshake for a workspace root, followed by
    /// the `initialized` notification.
    pub fn initialize(&mut self, root_path: &Path) -> Result<()> {
        let root = root_path.display().to_string();
        let root_uri = document::path_to_uri(&root);
        let params = json!({
            "processId": std::process::id(),
            "rootPath": root,
            "rootUri": root_uri,
            "capabilities": {}
        });

        self.send_request(
            "initialize",
            Some(params),
            Box::new(|result| {
                let name = result
                    .pointer("/serverInfo/name")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let version = result
                    .pointer("/serverInfo/version")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                tracing::info!("language server initialized: {} {}", name, version);
            }),
        )?;
        self.send_notification("initialized", Some(json!({})))
    }

    /// Tell the server a document was opened with the given full text.
    pub fn did_open(&mut self, path: &str, text: &str) -> Result<()> {
        let uri = document::path_to_uri(path);
        let language_id = document::language_id_for_path(path);
        let version = self.documents.open(&uri, language_id);
        tracing::debug!("didOpen {} ({} bytes)", uri, text.len());

        let params = json!({
            "textDocument": {
                "uri": uri,
                "languageId": language_id,
                "version": version,
                "text": text
            }
        });
        self.send_notification("textDocument/didOpen", Some(params))
    }

    /// Send the full replacement text for a changed document.
    pub fn did_change(&mut self, path: &str, text: &str) -> Result<()> {
        let uri = document::path_to_uri(path);
        let version = self.documents.change(&uri);

        let params = json!({
            "textDocument": { "uri": uri, "version": version },
            "contentChanges": [{ "text": text }]
        });
        self.send_notification("textDocument/didChange", Some(params))
    }

    /// Tell the server a document was closed.
    pub fn did_close(&mut self, path: &str) -> Result<()> {
        let uri = document::path_to_uri(path);
        self.documents.close(&uri);

        let params = json!({
            "textDocument": { "uri": uri }
        });
        self.send_notification("textDocument/didClose", Some(params))
    }

    /// Ask for completions at a cursor position (0-indexed).
    ///
    /// `on_result` runs on the reader thread with the normalized item
    /// list, possibly empty. It is always invoked when a response with a
    /// result arrives, whatever shape the server chose for it.
    pub fn request_completion<F>(
        &mut self,
        path: &str,
        line: u32,
        character: u32,
        on_result: F,
    ) -> Result<()>
    where
        F: FnOnce(Vec<CompletionItem>) + Send + 'static,
    {
        let uri = document::path_to_uri(path);
        tracing::debug!("requesting completion at {}:{}:{}", uri, line, character);

        let params = json!({
            "textDocument": { "uri": uri },
            "position": { "line": line, "character": character }
        });
        self.send_request(
            "textDocument/completion",
            Some(params),
            Box::new(move |result| {
                let items = completion::normalize_result(&result);
                tracing::debug!("completion returned {} items", items.len());
                on_result(items);
            }),
        )
    }

    /// Send a request, registering its one-shot continuation first so a
    /// fast response can never miss it.
    fn send_request(
        &mut self,
        method: &str,
        params: Option<Value>,
        handler: ResponseHandler,
    ) -> Result<()> {
        if !self.host.is_running() {
            return Err(LspError::NotRunning);
        }

        let id = self.ids.next();
        let encoded = JsonRpcRequest::new(id, method, params).encode()?;

        self.router.register(id, handler);
        if let Err(e) = self.host.write(&encoded) {
            // Never leave an orphaned registration behind a failed write
            self.router.unregister(id);
            return Err(e);
        }
        Ok(())
    }

    /// Send a fire-and-forget notification.
    fn send_notification(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        if !self.host.is_running() {
            return Err(LspError::NotRunning);
        }
        let encoded = JsonRpcNotification::new(method, params).encode()?;
        self.host.write(&encoded)
    }
}

/// Reader loop: block on the pipe, feed the decoder, dispatch frames.
///
/// Runs until the pipe closes (server exit or [`LspClient::stop`]) or a
/// hard read error. A panicking callback is caught and logged so one bad
/// frame cannot take the loop down.
fn reader_loop(mut stdout: ChildStdout, router: &MessageRouter) {
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; READ_BUF_SIZE];

    loop {
        match stdout.read(&mut buf) {
            Ok(0) => {
                tracing::debug!("language server closed its output pipe");
                break;
            }
            Ok(n) => {
                for frame in decoder.feed(&buf[..n]) {
                    let dispatched = std::panic::catch_unwind(std::panic::AssertUnwindSafe(
                        || router.dispatch(frame),
                    ));
                    if dispatched.is_err() {
                        tracing::error!("panic in message handler; frame dropped");
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::error!("read from language server failed: {}", e);
                break;
            }
        }
    }
}
