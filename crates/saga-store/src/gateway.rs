use crate::{Row, RowSet, StoreError};
use async_trait::async_trait;
use serde_json::Value;

/// An equality filter on a row-select.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Whether `row` satisfies the filter.
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column).unwrap_or(&Value::Null) == &self.value
    }
}

#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Submit statement text to the store's execution endpoint.
    async fn execute(&self, statement: &str) -> Result<RowSet, StoreError>;

    /// Insert one row.
    async fn insert(&self, table: &str, fields: Row) -> Result<(), StoreError>;

    /// Partially update every row whose `key_field` equals `key_value`.
    async fn update(
        &self,
        table: &str,
        key_field: &str,
        key_value: &Value,
        fields: Row,
    ) -> Result<(), StoreError>;

    /// Select `columns` (all columns when empty) from rows matching every filter.
    async fn select(
        &self,
        table: &str,
        columns: &[&str],
        filters: &[Filter],
    ) -> Result<RowSet, StoreError>;
}
