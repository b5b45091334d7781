//! Error types for the MCP crate.

use crate::protocol::{INVALID_PARAMS, METHOD_NOT_FOUND, OPERATION_FAILED};
use saga_sql::GuardError;
use saga_store::StoreError;
use thiserror::Error;

/// Errors raised while invoking a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool is registered under this name.
    #[error("unknown tool: {name}")]
    UnknownOperation { name: String },

    /// Arguments are missing or have the wrong shape.
    #[error("{0}")]
    Validation(String),

    /// Statement text or a table name was refused before reaching the store.
    #[error("rejected: {0}")]
    Guard(#[from] GuardError),

    /// The store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ToolError {
    /// JSON-RPC error code for this failure.
    pub fn json_rpc_code(&self) -> i32 {
        match self {
            ToolError::UnknownOperation { .. } => METHOD_NOT_FOUND,
            ToolError::Validation(_) | ToolError::Guard(_) => INVALID_PARAMS,
            ToolError::Store(_) => OPERATION_FAILED,
        }
    }
}

/// Errors that can occur in the MCP server itself.
#[derive(Debug, Error)]
pub enum McpError {
    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
