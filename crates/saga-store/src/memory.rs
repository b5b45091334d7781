//! In-process store.
//!
//! Holds tables as vectors of JSON rows and implements the row verbs directly.
//! Statement execution has no SQL engine behind it: only statements registered
//! with [`MemoryStore::with_statement_result`] are answered. Every mutation is
//! recorded, and failures can be injected per verb and table.

use crate::{Filter, Row, RowSet, StoreError, StoreGateway};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

/// Store verbs, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Execute,
    Insert,
    Update,
    Select,
}

/// A mutation applied to a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Insert {
        table: String,
        fields: Row,
    },
    Update {
        table: String,
        key_field: String,
        key_value: Value,
        fields: Row,
    },
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    status: u16,
    body: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<String, Vec<Row>>,
    statements: HashMap<String, RowSet>,
    failures: HashMap<(Verb, Option<String>), InjectedFailure>,
    mutations: Vec<Mutation>,
    executed: Vec<String>,
}

impl MemoryState {
    fn check_failure(&self, verb: Verb, table: Option<&str>) -> Result<(), StoreError> {
        let specific = table.and_then(|t| self.failures.get(&(verb, Some(t.to_string()))));
        match specific.or_else(|| self.failures.get(&(verb, None))) {
            Some(failure) => Err(StoreError::Upstream {
                status: failure.status,
                body: failure.body.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `table` with `rows`.
    pub fn with_table(mut self, table: &str, rows: Vec<Row>) -> Self {
        self.state
            .get_mut()
            .tables
            .insert(table.to_string(), rows);
        self
    }

    /// Answer `statement` with `result` when it is executed.
    pub fn with_statement_result(mut self, statement: &str, result: RowSet) -> Self {
        self.state
            .get_mut()
            .statements
            .insert(normalize_statement(statement), result);
        self
    }

    /// Make `verb` fail with `status`. With `table` set, only requests on that
    /// table fail.
    pub async fn inject_failure(&self, verb: Verb, table: Option<&str>, status: u16) {
        let mut state = self.state.lock().await;
        state.failures.insert(
            (verb, table.map(str::to_string)),
            InjectedFailure {
                status,
                body: format!("injected {verb:?} failure"),
            },
        );
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    /// Current contents of `table`.
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Every mutation applied so far, in order.
    pub async fn mutations(&self) -> Vec<Mutation> {
        self.state.lock().await.mutations.clone()
    }

    /// Every statement submitted to `execute`, in order.
    pub async fn executed(&self) -> Vec<String> {
        self.state.lock().await.executed.clone()
    }

    pub async fn table_names(&self) -> Vec<String> {
        self.state.lock().await.tables.keys().cloned().collect()
    }
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn execute(&self, statement: &str) -> Result<RowSet, StoreError> {
        let mut state = self.state.lock().await;
        state.check_failure(Verb::Execute, None)?;
        state.executed.push(statement.to_string());
        match state.statements.get(&normalize_statement(statement)) {
            Some(result) => Ok(result.clone()),
            None => Err(StoreError::Upstream {
                status: 501,
                body: format!("in-memory store cannot execute statement: {statement}"),
            }),
        }
    }

    async fn insert(&self, table: &str, fields: Row) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.check_failure(Verb::Insert, Some(table))?;
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(fields.clone());
        state.mutations.push(Mutation::Insert {
            table: table.to_string(),
            fields,
        });
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        key_field: &str,
        key_value: &Value,
        fields: Row,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.check_failure(Verb::Update, Some(table))?;
        let key = Filter::eq(key_field, key_value.clone());
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| key.matches(row)) {
                for (column, value) in &fields {
                    row.insert(column.clone(), value.clone());
                }
            }
        }
        state.mutations.push(Mutation::Update {
            table: table.to_string(),
            key_field: key_field.to_string(),
            key_value: key_value.clone(),
            fields,
        });
        Ok(())
    }

    async fn select(
        &self,
        table: &str,
        columns: &[&str],
        filters: &[Filter],
    ) -> Result<RowSet, StoreError> {
        let state = self.state.lock().await;
        state.check_failure(Verb::Select, Some(table))?;
        let rows = state
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filters.iter().all(|f| f.matches(row)))
                    .map(|row| project(row, columns))
                    .collect()
            })
            .unwrap_or_default();
        Ok(RowSet::new(rows))
    }
}

fn project(row: &Row, columns: &[&str]) -> Row {
    if columns.is_empty() {
        return row.clone();
    }
    columns
        .iter()
        .map(|c| (c.to_string(), row.get(*c).cloned().unwrap_or(Value::Null)))
        .collect()
}

fn normalize_statement(statement: &str) -> String {
    statement.split_whitespace().collect::<Vec<_>>().join(" ")
}
