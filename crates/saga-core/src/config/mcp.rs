//! MCP surface configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the MCP JSON-RPC surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// Whether `/mcp` is mounted on the HTTP server.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether `/mcp` sits behind the bearer-token gate (when auth is enabled).
    #[serde(default = "default_true")]
    pub require_auth: bool,

    /// Server name reported by `initialize`.
    #[serde(default = "default_server_name")]
    pub server_name: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            require_auth: true,
            server_name: default_server_name(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_server_name() -> String {
    "saga".to_string()
}
