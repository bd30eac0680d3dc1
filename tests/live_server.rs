//! End-to-end tests against a scripted fake language server.
//!
//! The "server" is a shell one-liner: it waits for the first request line
//! (so every client registration is in place), replays a canned byte
//! stream through the real pipes, then drains stdin until it is killed.

#![cfg(unix)]

use std::io::Write;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use serial_test::serial;

use glyph_lsp::{CompletionItem, Diagnostic, DiagnosticsStore, LspClient, ServerConfig};

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glyph_lsp=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

fn frame(body: &str) -> String {
    format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
}

/// Build a ServerConfig that replays `canned` once `wait_lines` lines of
/// client input have arrived. Framed bodies carry no trailing newline, so
/// waiting for the n-th line means waiting for the n-th chunk of input;
/// the replay can never overtake the request that should precede it.
fn scripted_server(canned: &str, wait_lines: usize) -> (ServerConfig, tempfile::NamedTempFile) {
    let mut reply_file = tempfile::NamedTempFile::new().unwrap();
    reply_file.write_all(canned.as_bytes()).unwrap();
    reply_file.flush().unwrap();

    let reads = "read -r line; ".repeat(wait_lines);
    let mut config = ServerConfig::new("sh");
    config.args = vec![
        "-c".to_string(),
        format!(r#"{}cat "$GLYPH_REPLY_FILE"; cat >/dev/null"#, reads),
    ];
    config.env.insert(
        "GLYPH_REPLY_FILE".to_string(),
        reply_file.path().display().to_string(),
    );
    (config, reply_file)
}

#[test]
#[serial]
fn completion_and_diagnostics_flow_through_real_pipes() {
    init_tracing();

    // Scripted session: completion response for id 1, a diagnostics push,
    // a corrupt header the decoder must skip, the wholesale-replacing
    // empty push, and a response for an id nobody registered.
    let canned = [
        frame(
            r#"{"jsonrpc":"2.0","id":1,"result":{"items":[{"label":"push_back","detail":"void (T)"},{"label":"size"}]}}"#,
        ),
        frame(
            r#"{"jsonrpc":"2.0","method":"textDocument/publishDiagnostics","params":{"uri":"file:///tmp/live.cpp","diagnostics":[{"range":{"start":{"line":0,"character":4},"end":{"line":0,"character":9}},"message":"expected ';'","severity":1},{"range":{"start":{"line":2,"character":0},"end":{"line":2,"character":3}},"message":"unused variable","severity":2}]}}"#,
        ),
        "Content-Length: junk\r\n\r\n".to_string(),
        frame(
            r#"{"jsonrpc":"2.0","method":"textDocument/publishDiagnostics","params":{"uri":"file:///tmp/live.cpp","diagnostics":[]}}"#,
        ),
        frame(r#"{"jsonrpc":"2.0","id":99,"result":null}"#),
    ]
    .concat();
    // Three lines = didOpen header, its blank separator, then the line
    // completed by the completion request's header, by which point the
    // completion callback is registered.
    let (config, _reply_file) = scripted_server(&canned, 3);

    let store = Arc::new(DiagnosticsStore::new());
    let (diag_tx, diag_rx) = mpsc::channel::<(String, usize)>();
    let (completion_tx, completion_rx) = mpsc::channel::<Vec<CompletionItem>>();

    let mut client = LspClient::new();
    client.start(&config).unwrap();
    assert!(client.is_running());

    let push_store = store.clone();
    client.set_diagnostics_handler(move |path: &str, diagnostics: Vec<Diagnostic>| {
        push_store.replace(path, diagnostics.clone());
        let _ = diag_tx.send((path.to_string(), diagnostics.len()));
    });

    client.did_open("/tmp/live.cpp", "int main() {}\n").unwrap();
    client
        .request_completion("/tmp/live.cpp", 0, 4, move |items| {
            let _ = completion_tx.send(items);
        })
        .unwrap();

    // Completion result, normalized end to end
    let items = completion_rx.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].label, "push_back");
    assert_eq!(items[0].detail, "void (T)");
    // insertText was absent: falls back to the label
    assert_eq!(items[0].insert_text, "push_back");
    assert_eq!(items[1].label, "size");

    // First push carries both diagnostics
    let (path, count) = diag_rx.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(path, "/tmp/live.cpp");
    assert_eq!(count, 2);

    // Second (empty) push replaces the first wholesale, and the corrupt
    // header between them did not wedge the stream
    let (_, count) = diag_rx.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(count, 0);
    assert!(store.for_path("/tmp/live.cpp").is_empty());
    assert_eq!(store.error_count(), 0);

    client.stop();
    assert!(!client.is_running());
}

#[test]
#[serial]
fn bare_array_completion_result_is_normalized() {
    init_tracing();

    let canned = frame(
        r#"{"jsonrpc":"2.0","id":1,"result":[{"label":"begin","insertText":"begin()"},{"detail":"no label here"}]}"#,
    );
    let (config, _reply_file) = scripted_server(&canned, 1);

    let (tx, rx) = mpsc::channel::<Vec<CompletionItem>>();

    let mut client = LspClient::new();
    client.start(&config).unwrap();
    client
        .request_completion("/tmp/live.cpp", 3, 7, move |items| {
            let _ = tx.send(items);
        })
        .unwrap();

    let items = rx.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].insert_text, "begin()");
    assert_eq!(items[1].label, "???");

    client.stop();
}

#[test]
#[serial]
fn pending_callback_never_fires_after_server_death() {
    init_tracing();

    // A server that dies without answering anything
    let mut config = ServerConfig::new("sh");
    config.args = vec!["-c".to_string(), "read -r line; exit 0".to_string()];

    let (tx, rx) = mpsc::channel::<Vec<CompletionItem>>();

    let mut client = LspClient::new();
    client.start(&config).unwrap();
    client
        .request_completion("/tmp/live.cpp", 0, 0, move |items| {
            let _ = tx.send(items);
        })
        .unwrap();

    // The continuation silently never runs; the client notices the death
    assert!(rx.recv_timeout(Duration::from_secs(2)).is_err());

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while client.is_running() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(!client.is_running());

    client.stop();
}
