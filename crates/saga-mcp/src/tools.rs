//! Tool registry.
//!
//! Maps tool names to a definition (name, description, input schema) and an
//! operation. Built-in operations are [`ToolKind`] variants whose arguments
//! are decoded into a typed [`ToolCall`]; additional operations can be
//! registered as [`ToolHandler`] implementations.

use crate::call::ToolCall;
use crate::error::ToolError;
use crate::executor::{ToolExecutor, ToolOutput};
use crate::protocol::ToolDefinition;
use crate::schema::ToolKind;
use async_trait::async_trait;
use saga_store::StoreGateway;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A tool operation registered outside the built-in catalogue.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(
        &self,
        store: &dyn StoreGateway,
        arguments: Value,
    ) -> Result<ToolOutput, ToolError>;
}

/// What runs when a tool is invoked.
#[derive(Clone)]
pub enum ToolOperation {
    Builtin(ToolKind),
    Custom(Arc<dyn ToolHandler>),
}

impl std::fmt::Debug for ToolOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolOperation::Builtin(kind) => f.debug_tuple("Builtin").field(kind).finish(),
            ToolOperation::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

struct RegisteredTool {
    definition: ToolDefinition,
    operation: ToolOperation,
}

/// Registry of available tools, bound to one executor.
pub struct ToolRegistry {
    executor: ToolExecutor,
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new(executor: ToolExecutor) -> Self {
        Self {
            executor,
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in catalogue for the executor's
    /// schema capability.
    pub fn for_capability(executor: ToolExecutor) -> Self {
        let capability = executor.capability();
        let mut registry = Self::new(executor);
        for kind in ToolKind::ALL {
            if kind.available_for(capability) {
                registry.register(kind.definition(capability), ToolOperation::Builtin(kind));
            }
        }
        tracing::info!(
            capability = %capability,
            tool_count = registry.len(),
            "registered tool catalogue"
        );
        registry
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, definition: ToolDefinition, operation: ToolOperation) {
        let tool = RegisteredTool {
            definition,
            operation,
        };
        match self.index.get(&tool.definition.name).copied() {
            Some(position) => self.tools[position] = tool,
            None => {
                self.index
                    .insert(tool.definition.name.clone(), self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get a tool definition by name.
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i].definition)
    }

    /// Check if a tool exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// List all tools, in registration order.
    pub fn list(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().map(|t| &t.definition).collect()
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.definition.name.as_str()).collect()
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Validate `arguments` against the tool's declared required fields and
    /// run it.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| ToolError::UnknownOperation {
                name: name.to_string(),
            })?;

        let arguments = validate_arguments(&tool.definition, arguments)?;
        tracing::debug!(tool = name, "invoking tool");

        let result = match &tool.operation {
            ToolOperation::Builtin(kind) => {
                let call = ToolCall::parse(*kind, arguments)?;
                self.executor.execute(call).await
            }
            ToolOperation::Custom(handler) => {
                handler.call(self.executor.store(), arguments).await
            }
        };

        if let Err(e) = &result {
            tracing::warn!(tool = name, error = %e, "tool invocation failed");
        }
        result
    }
}

/// Check that every required field is present and non-null.
fn validate_arguments(definition: &ToolDefinition, arguments: Value) -> Result<Value, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        Value::Object(map) => Value::Object(map),
        _ => {
            return Err(ToolError::Validation(
                "Arguments must be a JSON object".to_string(),
            ));
        }
    };

    for field in definition.required_fields() {
        if arguments.get(field).is_none_or(Value::is_null) {
            return Err(ToolError::Validation(format!(
                "Missing required field: {field}"
            )));
        }
    }

    Ok(arguments)
}
