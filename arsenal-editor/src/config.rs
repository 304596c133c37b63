//! Editor Server Configuration
//!
//! Configuration is loaded from environment variables with development
//! defaults.

use std::path::PathBuf;

/// Editor server configuration.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Configuration file each new session binds to. When the file exists
    /// the session loads it; otherwise a fresh document is created and
    /// saved there. `None` starts sessions on unbound in-memory documents.
    pub config_path: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            config_path: None,
        }
    }
}

impl EditorConfig {
    /// Create EditorConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ARSENAL_EDITOR_BIND`: Bind host (default: 127.0.0.1)
    /// - `PORT` / `ARSENAL_EDITOR_PORT`: Bind port (default: 8080)
    /// - `ARSENAL_EDITOR_CONFIG`: Configuration file path for new sessions
    pub fn from_env() -> Self {
        let host = std::env::var("ARSENAL_EDITOR_BIND")
            .unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("ARSENAL_EDITOR_PORT").ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or(8080);

        let config_path = std::env::var("ARSENAL_EDITOR_CONFIG")
            .ok()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Self {
            host,
            port,
            config_path,
        }
    }

    /// The bind address string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
