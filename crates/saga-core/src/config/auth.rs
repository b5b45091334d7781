//! Password gate and session token configuration.

use super::{ConfigError, read_env, require_env};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for `/login` and bearer-token verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When false, `/chat` and `/mcp` are open and `/login` is not mounted.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Environment variable holding the access password.
    #[serde(default = "default_password_env")]
    pub password_env: String,

    /// Environment variable containing the token signing key (hex-encoded).
    #[serde(default = "default_private_key_env")]
    pub private_key_env: Option<String>,

    /// Path to a file containing the token signing key.
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,

    /// Lifetime of issued tokens (e.g., "8h", "30m").
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            password_env: default_password_env(),
            private_key_env: default_private_key_env(),
            private_key_file: None,
            token_lifetime: default_token_lifetime(),
        }
    }
}

impl AuthConfig {
    pub fn resolve_password(&self) -> Result<String, ConfigError> {
        require_env("access password", &self.password_env)
    }

    /// Resolve the signing key from environment or file.
    pub fn resolve_private_key(&self) -> Result<String, ConfigError> {
        // Try environment variable first
        if let Some(key) = self.private_key_env.as_deref().and_then(read_env) {
            return Ok(key);
        }

        // Try file path
        if let Some(path) = self.private_key_file.as_ref().filter(|p| p.exists()) {
            let key = std::fs::read_to_string(path)?;
            return Ok(key.trim().to_string());
        }

        Err(ConfigError::MissingSecret {
            what: "token signing key",
            source_name: self
                .private_key_env
                .clone()
                .unwrap_or_else(|| "private_key_file".to_string()),
        })
    }

    pub fn token_lifetime(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.token_lifetime).map_err(|e| {
            ConfigError::Config(format!(
                "invalid token_lifetime '{}': {e}",
                self.token_lifetime
            ))
        })
    }
}

fn default_true() -> bool {
    true
}

fn default_password_env() -> String {
    "SAGA_ACCESS_PASSWORD".to_string()
}

fn default_private_key_env() -> Option<String> {
    Some("SAGA_TOKEN_KEY".to_string())
}

fn default_token_lifetime() -> String {
    "8h".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lifetime_is_eight_hours() {
        let config = AuthConfig::default();
        assert_eq!(config.token_lifetime().unwrap(), Duration::from_secs(8 * 3600));
    }

    #[test]
    fn test_bad_lifetime() {
        let config = AuthConfig {
            token_lifetime: "forever".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.token_lifetime(), Err(ConfigError::Config(_))));
    }

    #[test]
    fn test_private_key_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.key");
        std::fs::write(&path, "abcdef\n").unwrap();

        let config = AuthConfig {
            private_key_env: None,
            private_key_file: Some(path),
            ..Default::default()
        };
        assert_eq!(config.resolve_private_key().unwrap(), "abcdef");
    }

    #[test]
    fn test_missing_private_key() {
        let config = AuthConfig {
            private_key_env: Some("SAGA_TEST_UNSET_TOKEN_KEY".to_string()),
            private_key_file: None,
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_private_key(),
            Err(ConfigError::MissingSecret { .. })
        ));
    }
}
