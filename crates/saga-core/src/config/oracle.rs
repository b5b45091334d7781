//! Language model endpoint configuration.

use super::{ConfigError, require_env};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SYSTEM_PROMPT: &str = "You are the narrator of an interactive story. \
Use the available tools to look up and record characters and world state \
whenever the story introduces or changes them, then continue the narration.";

/// Configuration for the OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Full URL of the chat completions endpoint.
    #[serde(default = "default_inference_url")]
    pub inference_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key. `null` for endpoints that
    /// take no key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Inline system prompt. Takes precedence over `system_prompt_file`.
    #[serde(default)]
    pub system_prompt: Option<String>,

    #[serde(default)]
    pub system_prompt_file: Option<PathBuf>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            inference_url: default_inference_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            system_prompt: None,
            system_prompt_file: None,
        }
    }
}

impl OracleConfig {
    /// Resolve the API key, if one is configured.
    pub fn resolve_api_key(&self) -> Result<Option<String>, ConfigError> {
        match &self.api_key_env {
            Some(env_var) => require_env("model API key", env_var).map(Some),
            None => Ok(None),
        }
    }

    /// Resolve the system prompt: inline text, then file, then the built-in one.
    pub fn resolve_system_prompt(&self) -> Result<String, ConfigError> {
        if let Some(prompt) = &self.system_prompt {
            return Ok(prompt.clone());
        }
        if let Some(path) = &self.system_prompt_file {
            return Ok(std::fs::read_to_string(path)?.trim().to_string());
        }
        Ok(DEFAULT_SYSTEM_PROMPT.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_inference_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

fn default_timeout_secs() -> u64 {
    60
}
