//! `saga tools` - print the catalogue offline.

use std::path::Path;

use anyhow::{Context, Result};
use saga_core::SagaConfig;
use saga_mcp::schema::catalogue;

pub fn list(config_path: Option<&Path>, as_json: bool) -> Result<()> {
    let config = SagaConfig::load(config_path).context("failed to load configuration")?;
    let capability = config.store.schema;

    // The catalogue depends only on the schema shape, so no store is needed.
    let tools = catalogue(capability);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("Schema: {capability}");
    println!("Tools ({}):", tools.len());
    for tool in &tools {
        let mode = if tool.is_read_only() { "read" } else { "write" };
        let required = tool.required_fields();
        let args = if required.is_empty() {
            String::new()
        } else {
            required.join(", ")
        };
        println!("  {:<20} [{mode}] ({args})", tool.name);
        if let Some(description) = &tool.description {
            println!("      {description}");
        }
    }
    Ok(())
}
