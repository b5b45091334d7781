//! HTTP listener configuration.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the HTTP server and the chat cycle it drives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Upper bound on one chat cycle (oracle calls plus tool execution).
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,

    /// Whether to answer cross-origin requests.
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            turn_timeout_secs: default_turn_timeout_secs(),
            cors: true,
        }
    }
}

impl ServerConfig {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    /// Replace the port of `bind` with `port`, keeping the host.
    pub fn apply_port_override(&mut self, port: &str) -> Result<(), ConfigError> {
        let port: u16 = port
            .parse()
            .map_err(|_| ConfigError::Config(format!("invalid PORT value: {port}")))?;
        let host = match self.bind.rsplit_once(':') {
            Some((host, _)) => host.to_string(),
            None => self.bind.clone(),
        };
        self.bind = format!("{host}:{port}");
        Ok(())
    }
}

fn default_bind() -> String {
    "0.0.0.0:10000".to_string()
}

fn default_turn_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}
