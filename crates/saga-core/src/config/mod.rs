//! Configuration types for Saga.
//!
//! Configuration comes from a single YAML file (`saga.yaml` by convention).
//! Every section and every field has a default, so an empty or absent file
//! yields a runnable configuration. Secrets are never written into the file:
//! each is named by an environment variable (or a key file path) and resolved
//! at startup through the `resolve_*` methods on the section that owns it.
//!
//! ```yaml
//! server:
//!   bind: 0.0.0.0:10000
//!   turn_timeout_secs: 120
//! store:
//!   backend: rest
//!   schema: persona_split
//!   extra_tables: [quests]
//! oracle:
//!   model: gpt-4o-mini
//!   system_prompt_file: prompts/narrator.txt
//! auth:
//!   token_lifetime: 8h
//! ```

pub mod auth;
pub mod mcp;
pub mod oracle;
pub mod server;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use auth::AuthConfig;
pub use mcp::McpConfig;
pub use oracle::OracleConfig;
pub use server::ServerConfig;
pub use store::{StoreBackend, StoreConfig};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "SAGA_CONFIG";

/// Environment variable overriding the listening port.
pub const PORT_ENV: &str = "PORT";

/// Complete Saga configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SagaConfig {
    /// HTTP listener and chat-cycle settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote store connection and schema shape.
    #[serde(default)]
    pub store: StoreConfig,

    /// Language model endpoint.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Password gate and session tokens.
    #[serde(default)]
    pub auth: AuthConfig,

    /// MCP surface.
    #[serde(default)]
    pub mcp: McpConfig,
}

/// Error type for configuration loading and secret resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing required secret {what}: set the {source_name} environment variable")]
    MissingSecret {
        what: &'static str,
        source_name: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SagaConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    ///
    /// An empty document is the default configuration.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from `path` and rebase relative file references
    /// (system prompt, key file) onto the configuration file's directory.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        if let Some(file) = &config.oracle.system_prompt_file {
            config.oracle.system_prompt_file = Some(rebase(&base_dir, file));
        }
        if let Some(file) = &config.auth.private_key_file {
            config.auth.private_key_file = Some(rebase(&base_dir, file));
        }

        Ok(config)
    }

    /// Resolve the configuration the process should run with.
    ///
    /// `path` is the explicit `--config` argument; when it is `None` the
    /// `SAGA_CONFIG` variable is consulted. With neither set the defaults are
    /// used. The `PORT` variable then overrides the listening port.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = read_env(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load_with_context(path)?,
            None => Self::default(),
        };
        if let Some(port) = read_env(PORT_ENV) {
            config.server.apply_port_override(&port)?;
        }
        Ok(config)
    }
}

fn rebase(base_dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base_dir.join(file)
    }
}

/// Read an environment variable, treating empty values as unset.
pub(crate) fn read_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve a required secret held in the environment variable `env_var`.
pub(crate) fn require_env(what: &'static str, env_var: &str) -> Result<String, ConfigError> {
    read_env(env_var).ok_or_else(|| ConfigError::MissingSecret {
        what,
        source_name: env_var.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaCapability;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        let config = SagaConfig::from_yaml("").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:10000");
        assert_eq!(config.store.backend, StoreBackend::Rest);
        assert_eq!(config.store.schema, SchemaCapability::PersonaSplit);
        assert!(config.auth.enabled);
        assert!(config.mcp.require_auth);
    }

    #[test]
    fn test_parse_sections() {
        let yaml = r#"
server:
  bind: 127.0.0.1:8080
  turn_timeout_secs: 30
store:
  backend: memory
  schema: flat
  extra_tables: [quests]
oracle:
  model: local-model
  api_key_env: null
auth:
  enabled: false
  token_lifetime: 2h
mcp:
  require_auth: false
"#;
        let config = SagaConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.server.turn_timeout_secs, 30);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.schema, SchemaCapability::Flat);
        assert_eq!(config.store.extra_tables, vec!["quests".to_string()]);
        assert_eq!(config.oracle.model, "local-model");
        assert!(config.oracle.api_key_env.is_none());
        assert!(!config.auth.enabled);
        assert_eq!(
            config.auth.token_lifetime().unwrap(),
            std::time::Duration::from_secs(2 * 3600)
        );
        assert!(!config.mcp.require_auth);
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        let err = SagaConfig::from_yaml("server: [not, a, map]").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_load_with_context_rebases_relative_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saga.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "oracle:\n  system_prompt_file: prompt.txt").unwrap();

        let config = SagaConfig::load_with_context(&path).unwrap();
        assert_eq!(
            config.oracle.system_prompt_file,
            Some(dir.path().join("prompt.txt"))
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SagaConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let example = include_str!("../../../../saga.example.yaml");
        let config = SagaConfig::from_yaml(example).unwrap();
        let defaults = SagaConfig::default();

        assert_eq!(config.server.bind, defaults.server.bind);
        assert_eq!(config.store.schema, defaults.store.schema);
        assert_eq!(config.oracle.model, defaults.oracle.model);
        assert_eq!(config.auth.token_lifetime, defaults.auth.token_lifetime);
        assert_eq!(config.mcp.server_name, defaults.mcp.server_name);
    }
}
