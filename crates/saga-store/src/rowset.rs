//! Transport-neutral result rows.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row: column name to JSON value.
pub type Row = Map<String, Value>;

/// An ordered set of rows returned by a read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Normalize whatever JSON the store returned.
    ///
    /// An array of objects is the usual shape. `null` is no rows, a single
    /// object is one row, and scalars become a one-column row named `value`
    /// (statement endpoints return scalars for functions like `count(*)`).
    pub fn from_value(value: Value) -> Self {
        let rows = match value {
            Value::Null => Vec::new(),
            Value::Array(items) => items.into_iter().map(into_row).collect(),
            other => vec![into_row(other)],
        };
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The values of `column` across all rows, skipping rows without it.
    pub fn column(&self, column: &str) -> Vec<&Value> {
        self.rows.iter().filter_map(|row| row.get(column)).collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.rows.iter().cloned().map(Value::Object).collect())
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

fn into_row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => {
            let mut row = Map::new();
            row.insert("value".to_string(), other);
            row
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_of_objects() {
        let set = RowSet::from_value(json!([{"name": "Barty"}, {"name": "Mira"}]));
        assert_eq!(set.len(), 2);
        assert_eq!(set.column("name"), vec![&json!("Barty"), &json!("Mira")]);
    }

    #[test]
    fn test_null_is_empty() {
        assert!(RowSet::from_value(Value::Null).is_empty());
    }

    #[test]
    fn test_single_object_is_one_row() {
        let set = RowSet::from_value(json!({"count": 3}));
        assert_eq!(set.first().unwrap()["count"], json!(3));
    }

    #[test]
    fn test_scalar_becomes_value_column() {
        let set = RowSet::from_value(json!(7));
        assert_eq!(set.first().unwrap()["value"], json!(7));
        let set = RowSet::from_value(json!(["npcs", "events"]));
        assert_eq!(set.column("value"), vec![&json!("npcs"), &json!("events")]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let set = RowSet::from_value(json!([{"a": 1}]));
        assert_eq!(serde_json::to_value(&set).unwrap(), json!([{"a": 1}]));
    }
}
