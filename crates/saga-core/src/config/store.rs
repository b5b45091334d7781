//! Remote store configuration.

use super::{ConfigError, require_env};
use crate::SchemaCapability;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which gateway implementation backs the tools.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// The remote HTTP store.
    #[default]
    Rest,
    /// An in-process store; contents are lost when the process exits.
    Memory,
}

/// Configuration for the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Environment variable holding the store base URL.
    #[serde(default = "default_url_env")]
    pub url_env: String,

    /// Environment variable holding the service key.
    #[serde(default = "default_key_env")]
    pub key_env: String,

    /// NPC schema shape the store carries.
    #[serde(default)]
    pub schema: SchemaCapability,

    /// Tables allowed in addition to the ones the schema shape implies.
    #[serde(default)]
    pub extra_tables: Vec<String>,

    /// HTTP client timeout for a single store request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url_env: default_url_env(),
            key_env: default_key_env(),
            schema: SchemaCapability::default(),
            extra_tables: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl StoreConfig {
    pub fn resolve_url(&self) -> Result<String, ConfigError> {
        require_env("store URL", &self.url_env)
    }

    pub fn resolve_key(&self) -> Result<String, ConfigError> {
        require_env("store service key", &self.key_env)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Table names callers may reference by name.
    pub fn allowed_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self
            .schema
            .known_tables()
            .into_iter()
            .map(str::to_string)
            .collect();
        for extra in &self.extra_tables {
            if !tables.contains(extra) {
                tables.push(extra.clone());
            }
        }
        tables
    }
}

fn default_url_env() -> String {
    "SUPABASE_URL".to_string()
}

fn default_key_env() -> String {
    "SUPABASE_SERVICE_ROLE_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_tables_include_extras_once() {
        let config = StoreConfig {
            schema: SchemaCapability::Flat,
            extra_tables: vec!["quests".to_string(), "npcs".to_string()],
            ..Default::default()
        };
        let tables = config.allowed_tables();
        assert_eq!(tables.iter().filter(|t| *t == "npcs").count(), 1);
        assert!(tables.contains(&"quests".to_string()));
        assert!(!tables.contains(&"npc_personas".to_string()));
    }

    #[test]
    fn test_missing_key_is_reported_by_name() {
        let config = StoreConfig {
            key_env: "SAGA_TEST_UNSET_STORE_KEY".to_string(),
            ..Default::default()
        };
        match config.resolve_key() {
            Err(ConfigError::MissingSecret { source_name, .. }) => {
                assert_eq!(source_name, "SAGA_TEST_UNSET_STORE_KEY")
            }
            other => panic!("expected MissingSecret, got {other:?}"),
        }
    }
}
