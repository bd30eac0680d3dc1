// Error types for the language-server client.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LspError {
    #[error("language server not running")]
    NotRunning,

    #[error("language server already running")]
    AlreadyRunning,

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("pipe I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("message encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LspError>;
