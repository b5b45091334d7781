//! # saga-core
//!
//! Types shared by every Saga crate:
//!
//! - [`SagaConfig`]: the YAML configuration file and the secrets it references
//! - [`SchemaCapability`]: which shape of NPC schema the remote store carries
//!
//! Secrets never appear in the configuration file itself. Each one is named by
//! an environment variable (or a file path) and resolved once at startup; a
//! missing secret is a [`ConfigError`] and the process refuses to start.

pub mod capability;
pub mod config;

pub use capability::{NPC_TABLE, PERSONA_TABLE, SchemaCapability};
pub use config::{
    AuthConfig, ConfigError, McpConfig, OracleConfig, SagaConfig, ServerConfig, StoreBackend,
    StoreConfig,
};
