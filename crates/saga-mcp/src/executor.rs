//! Tool execution engine.
//!
//! Maps each built-in [`ToolCall`] onto store access:
//! - fixed-shape reads and writes use the row verbs
//! - free-form reads and `execute_sql` go through the statement guard
//! - introspection composes statements with escaped literals only

use crate::call::{
    CreateNpcArgs, CreateNpcPersonaArgs, ExecuteSqlArgs, GetNpcDataArgs, GetNpcPersonaArgs,
    GetTableDataArgs, ListColumnsArgs, ToolCall, UpdateNpcDataArgs,
};
use crate::error::ToolError;
use crate::protocol::ToolContent;
use saga_core::{NPC_TABLE, PERSONA_TABLE, SchemaCapability};
use saga_sql::{AccessMode, StatementGuard, TableAllowList, quote_str};
use saga_store::{Filter, Row, RowSet, StoreGateway};
use serde_json::{Value, json};
use std::sync::Arc;

/// Statement listing the tables of the public schema.
pub const LIST_TABLES_SQL: &str = "SELECT table_name FROM information_schema.tables \
WHERE table_schema = 'public' ORDER BY table_name";

/// Statement listing the columns of `table` (which must already be allow-listed).
pub fn list_columns_sql(table: &str) -> String {
    format!(
        "SELECT column_name, data_type FROM information_schema.columns \
WHERE table_schema = 'public' AND table_name = {} ORDER BY ordinal_position",
        quote_str(table)
    )
}

/// Result of a tool execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// A row set from a read.
    Rows(RowSet),
    /// A single row.
    Row(Row),
    /// A list of names.
    Names(Vec<String>),
    /// A human-readable confirmation.
    Text(String),
}

impl ToolOutput {
    /// Text form handed to the language model.
    pub fn to_text(&self) -> String {
        match self {
            ToolOutput::Text(text) => text.clone(),
            other => serde_json::to_string_pretty(&other.to_value()).unwrap_or_default(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ToolOutput::Rows(rows) => rows.to_value(),
            ToolOutput::Row(row) => Value::Object(row.clone()),
            ToolOutput::Names(names) => json!(names),
            ToolOutput::Text(text) => Value::String(text.clone()),
        }
    }

    /// MCP content: JSON for data, text for confirmations.
    pub fn to_content(&self) -> ToolContent {
        match self {
            ToolOutput::Text(text) => ToolContent::Text { text: text.clone() },
            other => ToolContent::Json {
                json: other.to_value(),
            },
        }
    }
}

/// Runs built-in tool calls against a store.
pub struct ToolExecutor {
    store: Arc<dyn StoreGateway>,
    capability: SchemaCapability,
    guard: StatementGuard,
}

impl ToolExecutor {
    pub fn new(
        store: Arc<dyn StoreGateway>,
        capability: SchemaCapability,
        allow_list: TableAllowList,
    ) -> Self {
        Self {
            store,
            capability,
            guard: StatementGuard::new(allow_list),
        }
    }

    pub fn store(&self) -> &dyn StoreGateway {
        self.store.as_ref()
    }

    pub fn capability(&self) -> SchemaCapability {
        self.capability
    }

    pub fn allow_list(&self) -> &TableAllowList {
        self.guard.allow_list()
    }

    pub async fn execute(&self, call: ToolCall) -> Result<ToolOutput, ToolError> {
        match call {
            ToolCall::GetTableData(args) => self.get_table_data(args).await,
            ToolCall::GetNpcData(args) => self.get_npc_data(args).await,
            ToolCall::GetNpcPersona(args) => self.get_npc_persona(args).await,
            ToolCall::CreateNpc(args) => self.create_npc(args).await,
            ToolCall::CreateNpcPersona(args) => self.create_npc_persona(args).await,
            ToolCall::UpdateNpcData(args) => self.update_npc_data(args).await,
            ToolCall::ListTables => self.list_tables().await,
            ToolCall::ListColumns(args) => self.list_columns(args).await,
            ToolCall::ExecuteSql(args) => self.execute_sql(args).await,
        }
    }

    async fn get_table_data(&self, args: GetTableDataArgs) -> Result<ToolOutput, ToolError> {
        let table = self.guard.allow_list().check(&args.table)?;
        let mut sql = format!("SELECT * FROM {table}");
        if let Some(condition) = args.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }
        let checked = self.guard.check(&sql, AccessMode::ReadOnly)?;
        Ok(ToolOutput::Rows(self.store.execute(&checked.sql).await?))
    }

    async fn get_npc_data(&self, args: GetNpcDataArgs) -> Result<ToolOutput, ToolError> {
        let filters: Vec<Filter> = args
            .npc_name
            .filter(|name| !name.is_empty())
            .map(|name| Filter::eq("name", name))
            .into_iter()
            .collect();
        let rows = self
            .store
            .select(NPC_TABLE, self.capability.npc_columns(), &filters)
            .await?;
        Ok(ToolOutput::Rows(rows))
    }

    async fn get_npc_persona(&self, args: GetNpcPersonaArgs) -> Result<ToolOutput, ToolError> {
        self.require_personas()?;
        let rows = self
            .store
            .select(PERSONA_TABLE, &[], &[Filter::eq("npc_id", args.npc_id.clone())])
            .await?;
        Ok(match rows.into_rows().into_iter().next() {
            Some(row) => ToolOutput::Row(row),
            None => ToolOutput::Text(format!("No persona found for {}.", args.npc_id)),
        })
    }

    async fn create_npc(&self, args: CreateNpcArgs) -> Result<ToolOutput, ToolError> {
        let npc_id = match args.npc_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => derive_npc_id(&args.name).ok_or_else(|| {
                ToolError::Validation(format!("Cannot derive an npc_id from name '{}'", args.name))
            })?,
        };

        let mut fields = Row::new();
        fields.insert("npc_id".into(), json!(npc_id));
        fields.insert("name".into(), json!(args.name));
        fields.insert("description".into(), json!(args.description));
        fields.insert("location".into(), json!(args.location));
        if let Some(disposition) = args.disposition {
            fields.insert("disposition".into(), json!(disposition));
        }
        if let Some(is_hostile) = args.is_hostile {
            fields.insert("is_hostile".into(), json!(is_hostile));
        }
        if self.capability.has_personas() {
            fields.insert("primary_npc".into(), json!(false));
            fields.insert("status".into(), json!("active"));
        }

        self.store.insert(NPC_TABLE, fields).await?;
        tracing::info!(npc_id = %npc_id, "created NPC");
        Ok(ToolOutput::Text(format!(
            "Successfully created NPC: {}",
            args.name
        )))
    }

    /// Promote the NPC, then insert its persona.
    ///
    /// The two mutations are not atomic: if the insert fails the promotion
    /// stays in place and the operation reports the insert's error.
    async fn create_npc_persona(&self, args: CreateNpcPersonaArgs) -> Result<ToolOutput, ToolError> {
        self.require_personas()?;

        let mut promotion = Row::new();
        promotion.insert("primary_npc".into(), json!(true));
        self.store
            .update(NPC_TABLE, "npc_id", &json!(args.npc_id), promotion)
            .await?;

        let mut persona = Row::new();
        persona.insert("npc_id".into(), json!(args.npc_id));
        persona.insert("persona_description".into(), json!(args.persona_description));
        persona.insert("mannerisms".into(), json!(args.mannerisms));
        persona.insert("desires".into(), json!(args.desires));
        persona.insert("fears".into(), json!(args.fears));
        if let Err(e) = self.store.insert(PERSONA_TABLE, persona).await {
            tracing::warn!(npc_id = %args.npc_id, error = %e, "persona insert failed after promotion");
            return Err(e.into());
        }

        Ok(ToolOutput::Text(format!(
            "Successfully created persona for {} and promoted them to a primary NPC.",
            args.npc_id
        )))
    }

    async fn update_npc_data(&self, args: UpdateNpcDataArgs) -> Result<ToolOutput, ToolError> {
        let (key_field, key_value) = match (non_empty(args.npc_id), non_empty(args.npc_name)) {
            (Some(id), _) => ("npc_id", id),
            (None, Some(name)) => ("name", name),
            (None, None) => {
                return Err(ToolError::Validation(
                    "Either npc_id or npc_name is required".to_string(),
                ));
            }
        };

        let mut fields = Row::new();
        if let Some(location) = non_empty(args.new_location) {
            fields.insert("location".into(), json!(location));
        }
        if let Some(disposition) = args.new_disposition {
            fields.insert("disposition".into(), json!(disposition));
        }
        if let Some(description) = non_empty(args.new_description) {
            fields.insert("description".into(), json!(description));
        }

        if fields.is_empty() {
            return Ok(ToolOutput::Text("No updates provided.".to_string()));
        }

        self.store
            .update(NPC_TABLE, key_field, &json!(key_value), fields)
            .await?;
        Ok(ToolOutput::Text(format!(
            "NPC {key_value}'s data has been successfully updated."
        )))
    }

    async fn list_tables(&self) -> Result<ToolOutput, ToolError> {
        let rows = self.store.execute(LIST_TABLES_SQL).await?;
        let names = rows
            .rows()
            .iter()
            .filter_map(|row| row.get("table_name").or_else(|| row.get("value")))
            .filter_map(Value::as_str)
            .filter(|name| self.guard.allow_list().contains(name))
            .map(str::to_string)
            .collect();
        Ok(ToolOutput::Names(names))
    }

    async fn list_columns(&self, args: ListColumnsArgs) -> Result<ToolOutput, ToolError> {
        let table = self.guard.allow_list().check(&args.table)?;
        let rows = self.store.execute(&list_columns_sql(&table)).await?;
        Ok(ToolOutput::Rows(rows))
    }

    async fn execute_sql(&self, args: ExecuteSqlArgs) -> Result<ToolOutput, ToolError> {
        let checked = self.guard.check(&args.query, AccessMode::ReadWrite)?;
        tracing::info!(kind = ?checked.kind, tables = ?checked.tables, "executing caller statement");
        Ok(ToolOutput::Rows(self.store.execute(&checked.sql).await?))
    }

    fn require_personas(&self) -> Result<(), ToolError> {
        if self.capability.has_personas() {
            Ok(())
        } else {
            Err(ToolError::Validation(format!(
                "The {} schema has no personas",
                self.capability
            )))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `npc_` followed by the snake-cased name, e.g. "Barty Bumble" becomes
/// `npc_barty_bumble`. `None` when the name has no letters or digits.
pub fn derive_npc_id(name: &str) -> Option<String> {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    (!slug.is_empty()).then(|| format!("npc_{slug}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use saga_store::{MemoryStore, Mutation, Verb};

    fn executor(store: Arc<MemoryStore>, capability: SchemaCapability) -> ToolExecutor {
        ToolExecutor::new(
            store,
            capability,
            TableAllowList::new(capability.known_tables()),
        )
    }

    #[test]
    fn test_derive_npc_id() {
        assert_eq!(derive_npc_id("Barty Bumble").as_deref(), Some("npc_barty_bumble"));
        assert_eq!(derive_npc_id("  Old  Tom-the-Fisher! ").as_deref(), Some("npc_old_tom_the_fisher"));
        assert_eq!(derive_npc_id("!!!"), None);
    }

    #[test]
    fn test_output_text_forms() {
        assert_eq!(ToolOutput::Text("done".into()).to_text(), "done");
        let names = ToolOutput::Names(vec!["npcs".into()]);
        assert_eq!(names.to_text(), "[\n  \"npcs\"\n]");
        assert_eq!(
            names.to_content(),
            ToolContent::Json {
                json: json!(["npcs"])
            }
        );
    }

    #[tokio::test]
    async fn test_flat_create_npc_has_no_persona_columns() {
        let store = Arc::new(MemoryStore::new());
        let executor = executor(store.clone(), SchemaCapability::Flat);
        executor
            .execute(ToolCall::CreateNpc(CreateNpcArgs {
                npc_id: None,
                name: "Barty".into(),
                description: "a baker".into(),
                location: "market".into(),
                disposition: Some(3),
                is_hostile: Some(false),
            }))
            .await
            .unwrap();

        let rows = store.rows("npcs").await;
        assert_eq!(rows[0]["npc_id"], json!("npc_barty"));
        assert_eq!(rows[0]["disposition"], json!(3));
        assert!(!rows[0].contains_key("primary_npc"));
    }

    #[tokio::test]
    async fn test_persona_tools_refused_on_flat_schema() {
        let store = Arc::new(MemoryStore::new());
        let executor = executor(store.clone(), SchemaCapability::Flat);
        let err = executor
            .execute(ToolCall::GetNpcPersona(GetNpcPersonaArgs {
                npc_id: "npc_barty".into(),
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_persona_is_text() {
        let store = Arc::new(MemoryStore::new());
        let executor = executor(store, SchemaCapability::PersonaSplit);
        let output = executor
            .execute(ToolCall::GetNpcPersona(GetNpcPersonaArgs {
                npc_id: "npc_ghost".into(),
            }))
            .await
            .unwrap();
        assert_eq!(output, ToolOutput::Text("No persona found for npc_ghost.".into()));
    }

    #[tokio::test]
    async fn test_update_by_name() {
        let store = Arc::new(MemoryStore::new());
        let executor = executor(store.clone(), SchemaCapability::PersonaSplit);
        let output = executor
            .execute(ToolCall::UpdateNpcData(UpdateNpcDataArgs {
                npc_id: None,
                npc_name: Some("Barty".into()),
                new_location: Some("docks".into()),
                new_disposition: None,
                new_description: Some("  ".into()),
            }))
            .await
            .unwrap();
        assert_eq!(
            output,
            ToolOutput::Text("NPC Barty's data has been successfully updated.".into())
        );

        match &store.mutations().await[..] {
            [Mutation::Update { key_field, fields, .. }] => {
                assert_eq!(key_field, "name");
                assert_eq!(fields.len(), 1);
                assert_eq!(fields["location"], json!("docks"));
            }
            other => panic!("unexpected mutations {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_table_data_composes_guarded_statement() {
        let store = Arc::new(MemoryStore::new().with_statement_result(
            "SELECT * FROM events WHERE location = 'market'",
            RowSet::from_value(json!([{"event": "fair"}])),
        ));
        let executor = executor(store.clone(), SchemaCapability::PersonaSplit);
        let output = executor
            .execute(ToolCall::GetTableData(GetTableDataArgs {
                table: "events".into(),
                query: Some("location = 'market'".into()),
            }))
            .await
            .unwrap();
        assert_eq!(output.to_value(), json!([{"event": "fair"}]));
    }

    #[tokio::test]
    async fn test_get_table_data_rejects_injection() {
        let store = Arc::new(MemoryStore::new());
        let executor = executor(store.clone(), SchemaCapability::PersonaSplit);
        let err = executor
            .execute(ToolCall::GetTableData(GetTableDataArgs {
                table: "events".into(),
                query: Some("1=1; DROP TABLE npcs".into()),
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Guard(_)));
        assert!(store.executed().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_tables_filters_to_allow_list() {
        let store = Arc::new(MemoryStore::new().with_statement_result(
            LIST_TABLES_SQL,
            RowSet::from_value(json!([
                {"table_name": "events"},
                {"table_name": "npcs"},
                {"table_name": "secrets"}
            ])),
        ));
        let executor = executor(store, SchemaCapability::Flat);
        let output = executor.execute(ToolCall::ListTables).await.unwrap();
        assert_eq!(
            output,
            ToolOutput::Names(vec!["events".into(), "npcs".into()])
        );
    }

    #[tokio::test]
    async fn test_list_columns_escapes_table_literal() {
        assert_eq!(
            list_columns_sql("npcs"),
            "SELECT column_name, data_type FROM information_schema.columns WHERE table_schema = 'public' AND table_name = 'npcs' ORDER BY ordinal_position"
        );
        let store = Arc::new(MemoryStore::new());
        let executor = executor(store.clone(), SchemaCapability::Flat);
        let err = executor
            .execute(ToolCall::ListColumns(ListColumnsArgs {
                table: "pg_authid".into(),
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Guard(_)));
        assert!(store.executed().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(MemoryStore::new());
        store.inject_failure(Verb::Select, Some("npcs"), 503).await;
        let executor = executor(store, SchemaCapability::Flat);
        let err = executor
            .execute(ToolCall::GetNpcData(GetNpcDataArgs { npc_name: None }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Store(_)));
    }
}
