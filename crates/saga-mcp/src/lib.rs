//! # saga-mcp
//!
//! The tool layer of Saga: the catalogue of store operations the model (and
//! any MCP client) may call, the registry that validates and dispatches calls,
//! and a JSON-RPC server exposing the registry over HTTP and stdio.
//!
//! ## Catalogue
//!
//! | Tool | Kind | Store access |
//! |------|------|--------------|
//! | `get_table_data` | read | guarded statement |
//! | `get_npc_data` | read | row select |
//! | `get_npc_persona` | read | row select (persona schema) |
//! | `create_npc` | write | row insert |
//! | `create_npc_persona` | write | row update + row insert (persona schema) |
//! | `update_npc_data` | write | row update |
//! | `list_tables` | read | introspection statement |
//! | `list_columns` | read | introspection statement |
//! | `execute_sql` | read/write | guarded statement |
//!
//! Which tools exist depends on the store's [`SchemaCapability`]; persona
//! tools are only registered for the persona-split schema.
//!
//! [`SchemaCapability`]: saga_core::SchemaCapability

pub mod call;
pub mod error;
pub mod executor;
pub mod http_transport;
pub mod protocol;
pub mod schema;
pub mod server;
pub mod tools;

pub use call::ToolCall;
pub use error::{McpError, ToolError};
pub use executor::{ToolExecutor, ToolOutput};
pub use protocol::{ToolAnnotations, ToolContent, ToolDefinition};
pub use schema::ToolKind;
pub use server::McpServer;
pub use tools::{ToolHandler, ToolOperation, ToolRegistry};
