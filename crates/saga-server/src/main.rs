use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "saga", version, about = "Narrative game server with a tool-calling model")]
struct Cli {
    /// Path to saga.yaml (falls back to SAGA_CONFIG, then built-in defaults)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the chat and MCP HTTP surfaces.
    Serve {
        /// Override the configured bind address, e.g. 127.0.0.1:8080
        #[arg(long)]
        bind: Option<String>,
    },

    /// Serve MCP over stdio (newline-delimited JSON-RPC).
    Mcp,

    /// Print the tool catalogue for the configured schema.
    Tools {
        /// Print the catalogue as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Generate a token signing key.
    Keygen {
        /// Write the private key to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol in stdio mode, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Serve { bind } => commands::serve::run(cli.config.as_deref(), bind).await?,
        Command::Mcp => commands::mcp::run(cli.config.as_deref()).await?,
        Command::Tools { json } => commands::tools::list(cli.config.as_deref(), json)?,
        Command::Keygen { output } => commands::keygen::generate(output)?,
    }

    Ok(())
}
