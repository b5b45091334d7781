//! Typed tool arguments.
//!
//! Arguments arrive as a JSON object. After the registry has checked that the
//! required fields are present, they are deserialized into the [`ToolCall`]
//! variant for the tool, so handlers work with typed values only.

use crate::error::ToolError;
use crate::schema::ToolKind;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetTableDataArgs {
    pub table: String,
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetNpcDataArgs {
    #[serde(default)]
    pub npc_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetNpcPersonaArgs {
    pub npc_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateNpcArgs {
    #[serde(default)]
    pub npc_id: Option<String>,
    pub name: String,
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub disposition: Option<i64>,
    #[serde(default)]
    pub is_hostile: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateNpcPersonaArgs {
    pub npc_id: String,
    pub persona_description: String,
    pub mannerisms: String,
    pub desires: String,
    pub fears: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateNpcDataArgs {
    #[serde(default)]
    pub npc_id: Option<String>,
    #[serde(default)]
    pub npc_name: Option<String>,
    #[serde(default)]
    pub new_location: Option<String>,
    #[serde(default)]
    pub new_disposition: Option<i64>,
    #[serde(default)]
    pub new_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListColumnsArgs {
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecuteSqlArgs {
    pub query: String,
}

/// A built-in tool call with typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    GetTableData(GetTableDataArgs),
    GetNpcData(GetNpcDataArgs),
    GetNpcPersona(GetNpcPersonaArgs),
    CreateNpc(CreateNpcArgs),
    CreateNpcPersona(CreateNpcPersonaArgs),
    UpdateNpcData(UpdateNpcDataArgs),
    ListTables,
    ListColumns(ListColumnsArgs),
    ExecuteSql(ExecuteSqlArgs),
}

impl ToolCall {
    /// Deserialize `arguments` into the call for `kind`.
    pub fn parse(kind: ToolKind, arguments: Value) -> Result<Self, ToolError> {
        Ok(match kind {
            ToolKind::GetTableData => ToolCall::GetTableData(decode(kind, arguments)?),
            ToolKind::GetNpcData => ToolCall::GetNpcData(decode(kind, arguments)?),
            ToolKind::GetNpcPersona => ToolCall::GetNpcPersona(decode(kind, arguments)?),
            ToolKind::CreateNpc => ToolCall::CreateNpc(decode(kind, arguments)?),
            ToolKind::CreateNpcPersona => ToolCall::CreateNpcPersona(decode(kind, arguments)?),
            ToolKind::UpdateNpcData => ToolCall::UpdateNpcData(decode(kind, arguments)?),
            ToolKind::ListTables => ToolCall::ListTables,
            ToolKind::ListColumns => ToolCall::ListColumns(decode(kind, arguments)?),
            ToolKind::ExecuteSql => ToolCall::ExecuteSql(decode(kind, arguments)?),
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::GetTableData(_) => ToolKind::GetTableData,
            ToolCall::GetNpcData(_) => ToolKind::GetNpcData,
            ToolCall::GetNpcPersona(_) => ToolKind::GetNpcPersona,
            ToolCall::CreateNpc(_) => ToolKind::CreateNpc,
            ToolCall::CreateNpcPersona(_) => ToolKind::CreateNpcPersona,
            ToolCall::UpdateNpcData(_) => ToolKind::UpdateNpcData,
            ToolCall::ListTables => ToolKind::ListTables,
            ToolCall::ListColumns(_) => ToolKind::ListColumns,
            ToolCall::ExecuteSql(_) => ToolKind::ExecuteSql,
        }
    }
}

fn decode<T: DeserializeOwned>(kind: ToolKind, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::Validation(format!("Invalid arguments for {}: {e}", kind.name())))
}
