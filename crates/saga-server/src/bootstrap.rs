//! Builds the runtime pieces from a loaded [`SagaConfig`].
//!
//! Every required secret is resolved here, before anything binds, so a
//! missing credential stops the process at startup.

use std::sync::Arc;

use anyhow::{Context, Result};
use saga_auth::{KeyPair, PasswordGate, SessionTokens};
use saga_core::{SagaConfig, StoreBackend};
use saga_mcp::{McpServer, ToolExecutor, ToolRegistry};
use saga_runtime::{OpenAiOracle, Orchestrator, SessionStore};
use saga_sql::TableAllowList;
use saga_store::{MemoryStore, RestStore, StoreGateway};
use tracing::{info, warn};

use crate::state::{AppState, AuthGate};

/// Connect the configured store backend.
pub fn build_store(config: &SagaConfig) -> Result<Arc<dyn StoreGateway>> {
    match config.store.backend {
        StoreBackend::Rest => {
            let url = config.store.resolve_url()?;
            let key = config.store.resolve_key()?;
            let store = RestStore::new(url, key, config.store.timeout())
                .context("failed to build store client")?;
            info!(base_url = %store.base_url(), "using REST store");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("using in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Tool registry for the configured schema capability.
pub fn build_registry(config: &SagaConfig) -> Result<Arc<ToolRegistry>> {
    let store = build_store(config)?;
    let allow_list = TableAllowList::new(config.store.allowed_tables());
    let executor = ToolExecutor::new(store, config.store.schema, allow_list);
    Ok(Arc::new(ToolRegistry::for_capability(executor)))
}

pub fn build_mcp_server(config: &SagaConfig, registry: Arc<ToolRegistry>) -> Arc<McpServer> {
    Arc::new(McpServer::new(config.mcp.server_name.clone(), registry))
}

/// Password gate and token issuer, or `None` when auth is disabled.
pub fn build_auth(config: &SagaConfig) -> Result<Option<AuthGate>> {
    if !config.auth.enabled {
        warn!("authentication disabled; /chat and /mcp are open");
        return Ok(None);
    }

    let password = config.auth.resolve_password()?;
    let key_hex = config.auth.resolve_private_key()?;
    let keypair = KeyPair::from_private_key_hex(&key_hex).context("invalid token signing key")?;
    let lifetime = config.auth.token_lifetime()?;

    info!(
        public_key = %keypair.public_key_hex(),
        lifetime = %config.auth.token_lifetime,
        "session tokens enabled"
    );
    Ok(Some(AuthGate::new(
        PasswordGate::new(password),
        SessionTokens::new(keypair, lifetime),
    )))
}

/// Everything `saga serve` needs.
pub fn build_state(config: &SagaConfig) -> Result<AppState> {
    let registry = build_registry(config)?;
    let mcp = build_mcp_server(config, registry.clone());

    let api_key = config.oracle.resolve_api_key()?;
    if api_key.is_none() {
        warn!(url = %config.oracle.inference_url, "no model API key configured");
    }
    let oracle = OpenAiOracle::new(
        config.oracle.inference_url.clone(),
        config.oracle.model.clone(),
        api_key,
        config.oracle.timeout(),
    )
    .context("failed to build model client")?;
    let system_prompt = config.oracle.resolve_system_prompt()?;

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(oracle),
        registry,
        Arc::new(SessionStore::new()),
        system_prompt,
    ));

    let mut state = AppState::new(orchestrator, mcp)
        .with_turn_timeout(config.server.turn_timeout())
        .with_mcp(config.mcp.enabled, config.mcp.require_auth)
        .with_cors(config.server.cors);
    if let Some(gate) = build_auth(config)? {
        state = state.with_auth(gate);
    }
    Ok(state)
}
