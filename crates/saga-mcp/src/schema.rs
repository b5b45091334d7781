//! The built-in tool catalogue and its input schemas.

use crate::protocol::{ToolAnnotations, ToolDefinition};
use saga_core::SchemaCapability;
use serde_json::{Value, json};

/// Built-in store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetTableData,
    GetNpcData,
    GetNpcPersona,
    CreateNpc,
    CreateNpcPersona,
    UpdateNpcData,
    ListTables,
    ListColumns,
    ExecuteSql,
}

impl ToolKind {
    pub const ALL: [ToolKind; 9] = [
        ToolKind::GetTableData,
        ToolKind::GetNpcData,
        ToolKind::GetNpcPersona,
        ToolKind::CreateNpc,
        ToolKind::CreateNpcPersona,
        ToolKind::UpdateNpcData,
        ToolKind::ListTables,
        ToolKind::ListColumns,
        ToolKind::ExecuteSql,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::GetTableData => "get_table_data",
            ToolKind::GetNpcData => "get_npc_data",
            ToolKind::GetNpcPersona => "get_npc_persona",
            ToolKind::CreateNpc => "create_npc",
            ToolKind::CreateNpcPersona => "create_npc_persona",
            ToolKind::UpdateNpcData => "update_npc_data",
            ToolKind::ListTables => "list_tables",
            ToolKind::ListColumns => "list_columns",
            ToolKind::ExecuteSql => "execute_sql",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Whether the operation leaves the store unchanged.
    ///
    /// `execute_sql` may mutate, so it is not read-only.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            ToolKind::GetTableData
                | ToolKind::GetNpcData
                | ToolKind::GetNpcPersona
                | ToolKind::ListTables
                | ToolKind::ListColumns
        )
    }

    /// Whether the tool exists for a store with `capability`.
    pub fn available_for(&self, capability: SchemaCapability) -> bool {
        match self {
            ToolKind::GetNpcPersona | ToolKind::CreateNpcPersona => capability.has_personas(),
            _ => true,
        }
    }

    pub fn definition(&self, capability: SchemaCapability) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: Some(self.description(capability).to_string()),
            input_schema: self.input_schema(),
            annotations: Some(ToolAnnotations {
                read_only: Some(self.is_read_only()),
            }),
        }
    }

    fn description(&self, capability: SchemaCapability) -> &'static str {
        match self {
            ToolKind::GetTableData => {
                "Read rows from a world-state table, optionally filtered by a SQL condition such as \"location = 'market'\"."
            }
            ToolKind::GetNpcData => {
                "Look up NPCs by name. Without a name, returns every NPC."
            }
            ToolKind::GetNpcPersona => {
                "Get the persona details (mannerisms, desires, fears) of a primary NPC."
            }
            ToolKind::CreateNpc => match capability {
                SchemaCapability::Flat => "Create a new NPC when one is introduced in the story.",
                SchemaCapability::PersonaSplit => {
                    "Create a new non-primary NPC when one is introduced in the story."
                }
            },
            ToolKind::CreateNpcPersona => {
                "Give an existing NPC a persona and promote them to a primary NPC."
            }
            ToolKind::UpdateNpcData => {
                "Update an NPC's location, disposition or description, identified by npc_id or by name."
            }
            ToolKind::ListTables => "List the tables available to the tools.",
            ToolKind::ListColumns => "List the columns and data types of a table.",
            ToolKind::ExecuteSql => {
                "Execute a single SQL query or row mutation against the world-state tables."
            }
        }
    }

    fn input_schema(&self) -> Value {
        match self {
            ToolKind::GetTableData => object_schema(
                json!({
                    "table": {"type": "string", "description": "Table to read"},
                    "query": {"type": "string", "description": "Optional SQL condition for the WHERE clause"}
                }),
                &["table"],
            ),
            ToolKind::GetNpcData => object_schema(
                json!({
                    "npc_name": {"type": "string", "description": "Exact name of the NPC"}
                }),
                &[],
            ),
            ToolKind::GetNpcPersona => object_schema(
                json!({
                    "npc_id": {"type": "string", "description": "Identifier of the NPC"}
                }),
                &["npc_id"],
            ),
            ToolKind::CreateNpc => object_schema(
                json!({
                    "npc_id": {"type": "string", "description": "Identifier such as npc_barty_bumble; derived from the name when omitted"},
                    "name": {"type": "string"},
                    "description": {"type": "string"},
                    "location": {"type": "string"},
                    "disposition": {"type": "integer", "description": "Attitude toward the player, negative is hostile"},
                    "is_hostile": {"type": "boolean"}
                }),
                &["name", "description", "location"],
            ),
            ToolKind::CreateNpcPersona => object_schema(
                json!({
                    "npc_id": {"type": "string"},
                    "persona_description": {"type": "string"},
                    "mannerisms": {"type": "string"},
                    "desires": {"type": "string"},
                    "fears": {"type": "string"}
                }),
                &["npc_id", "persona_description", "mannerisms", "desires", "fears"],
            ),
            ToolKind::UpdateNpcData => object_schema(
                json!({
                    "npc_id": {"type": "string", "description": "Identifier of the NPC to update"},
                    "npc_name": {"type": "string", "description": "Name of the NPC, used when npc_id is not known"},
                    "new_location": {"type": "string"},
                    "new_disposition": {"type": "integer"},
                    "new_description": {"type": "string"}
                }),
                &[],
            ),
            ToolKind::ListTables => object_schema(json!({}), &[]),
            ToolKind::ListColumns => object_schema(
                json!({
                    "table": {"type": "string"}
                }),
                &["table"],
            ),
            ToolKind::ExecuteSql => object_schema(
                json!({
                    "query": {"type": "string", "description": "One SELECT, INSERT, UPDATE or DELETE statement"}
                }),
                &["query"],
            ),
        }
    }
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Tool definitions for a store with `capability`, in catalogue order.
pub fn catalogue(capability: SchemaCapability) -> Vec<ToolDefinition> {
    ToolKind::ALL
        .iter()
        .filter(|kind| kind.available_for(capability))
        .map(|kind| kind.definition(capability))
        .collect()
}
