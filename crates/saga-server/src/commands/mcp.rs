//! `saga mcp` - the tool surface over stdio.

use std::path::Path;

use anyhow::{Context, Result};
use saga_core::SagaConfig;
use saga_server::bootstrap;
use tracing::info;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = SagaConfig::load(config_path).context("failed to load configuration")?;
    let registry = bootstrap::build_registry(&config)?;
    let server = bootstrap::build_mcp_server(&config, registry);

    info!(
        schema = %config.store.schema,
        tools = server.tools().len(),
        "serving MCP on stdio"
    );
    server.run_stdio().await?;
    Ok(())
}
