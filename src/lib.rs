//! Language-server client engine for the Glyph editor
//!
//! Talks to an external language server over stdio using Content-Length
//! framed JSON-RPC, correlates responses to callbacks by request id, and
//! bridges results from the background reader thread to a single-threaded
//! editor loop.
//!
//! # Components
//!
//! - [`protocol`] - wire framing and JSON-RPC envelopes
//! - [`process`] - child-process lifecycle and pipes
//! - [`dispatch`] - response/notification routing
//! - [`client`] - the per-server client API
//! - [`completion`] - completion result normalization
//! - [`autocomplete`] - UI-side completion mailbox
//! - [`diagnostics`] - per-document diagnostics store
//! - [`document`] - open-document versioning and URI mapping
//! - [`config`] - server launch configuration
//!
//! # Threading
//!
//! Exactly two threads matter per client: the thread calling the public
//! API and one reader thread per running server. Completion and
//! diagnostics callbacks run on the reader thread. Hand results to the
//! UI through [`autocomplete::CompletionMailbox`] or
//! [`diagnostics::DiagnosticsStore`], never by touching UI state from a
//! callback directly.

pub mod autocomplete;
pub mod client;
pub mod completion;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod process;
pub mod protocol;
pub mod types;

pub use autocomplete::{AutocompleteState, CompletionMailbox};
pub use client::LspClient;
pub use config::{LspSettings, ServerConfig};
pub use diagnostics::DiagnosticsStore;
pub use error::{LspError, Result};
pub use types::{CompletionItem, Diagnostic, Position, Severity};
