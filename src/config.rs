//! Language-server launch configuration
//!
//! Which binary to spawn per language, loaded from a TOML file or built
//! from the compiled-in defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{LspError, Result};

/// Configuration for a single language server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Path to the server binary (resolved via $PATH)
    pub command: String,

    /// Arguments to pass to the server
    pub args: Vec<String>,

    /// File extensions this server handles
    pub extensions: Vec<String>,

    /// Environment variables to set for the child process
    pub env: HashMap<String, String>,

    /// Working directory for the child; defaults to the editor's cwd
    pub working_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            extensions: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
        }
    }
}

impl ServerConfig {
    /// Config that just runs `command` with no arguments
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }
}

/// Top-level LSP settings: a named server table plus a global switch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LspSettings {
    /// Whether language-server integration is enabled at all
    pub enabled: bool,

    /// Per-language server configurations
    pub servers: HashMap<String, ServerConfig>,
}

impl Default for LspSettings {
    fn default() -> Self {
        let mut servers = HashMap::new();

        // C/C++
        servers.insert(
            "clangd".to_string(),
            ServerConfig {
                command: "clangd".to_string(),
                args: vec!["--log=error".to_string()],
                extensions: vec![
                    "c".to_string(),
                    "h".to_string(),
                    "cpp".to_string(),
                    "hpp".to_string(),
                    "cc".to_string(),
                    "cxx".to_string(),
                ],
                env: HashMap::new(),
                working_dir: None,
            },
        );

        // Rust
        servers.insert(
            "rust".to_string(),
            ServerConfig {
                command: "rust-analyzer".to_string(),
                args: vec![],
                extensions: vec!["rs".to_string()],
                env: HashMap::new(),
                working_dir: None,
            },
        );

        Self {
            enabled: true,
            servers,
        }
    }
}

impl LspSettings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| LspError::Config(e.to_string()))
    }

    /// Save settings to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| LspError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the server config for a file extension
    pub fn server_for_extension(&self, ext: &str) -> Option<(&str, &ServerConfig)> {
        let ext_lower = ext.to_lowercase();
        self.servers
            .iter()
            .find(|(_, cfg)| cfg.extensions.iter().any(|e| e.to_lowercase() == ext_lower))
            .map(|(name, cfg)| (name.as_str(), cfg))
    }

    /// Get the server config for a file path
    pub fn server_for_file(&self, file_path: &str) -> Option<(&str, &ServerConfig)> {
        let ext = Path::new(file_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        self.server_for_extension(ext)
    }
}
