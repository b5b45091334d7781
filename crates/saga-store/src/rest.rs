//! Supabase/PostgREST gateway.

use crate::{Filter, Row, RowSet, StoreError, StoreGateway};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use saga_sql::is_identifier;
use serde_json::{Value, json};
use std::time::Duration;

/// Gateway to a Supabase deployment.
///
/// Statements go to the `exec_sql` RPC function; row verbs go to the
/// PostgREST table endpoints. Every request authenticates with the service
/// key in both the `apikey` and `Authorization` headers.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RestStore {
    pub fn new(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> Result<String, StoreError> {
        check_name("table", table)?;
        Ok(format!("{}/rest/v1/{}", self.base_url, table))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// Send a request and return the response body, mapping non-success
    /// statuses to [`StoreError::Upstream`].
    async fn send(&self, request: RequestBuilder, verb: &'static str) -> Result<String, StoreError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(verb, status = status.as_u16(), "store request failed");
            return Err(StoreError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl StoreGateway for RestStore {
    async fn execute(&self, statement: &str) -> Result<RowSet, StoreError> {
        tracing::debug!(statement, "executing statement");
        let url = format!("{}/rest/v1/rpc/exec_sql", self.base_url);
        let request = self.client.post(url).json(&json!({ "sql": statement }));
        let body = self.send(request, "execute").await?;
        parse_rows(&body)
    }

    async fn insert(&self, table: &str, fields: Row) -> Result<(), StoreError> {
        tracing::debug!(table, "inserting row");
        let request = self
            .client
            .post(self.table_url(table)?)
            .header("Prefer", "return=minimal")
            .json(&fields);
        self.send(request, "insert").await?;
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        key_field: &str,
        key_value: &Value,
        fields: Row,
    ) -> Result<(), StoreError> {
        check_name("column", key_field)?;
        tracing::debug!(table, key_field, "updating rows");
        let request = self
            .client
            .patch(self.table_url(table)?)
            .query(&[(key_field, filter_operand(key_value))])
            .header("Prefer", "return=minimal")
            .json(&fields);
        self.send(request, "update").await?;
        Ok(())
    }

    async fn select(
        &self,
        table: &str,
        columns: &[&str],
        filters: &[Filter],
    ) -> Result<RowSet, StoreError> {
        for column in columns {
            check_name("column", column)?;
        }
        let select = if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(",")
        };

        let mut query = vec![("select".to_string(), select)];
        for filter in filters {
            check_name("column", &filter.column)?;
            query.push((filter.column.clone(), filter_operand(&filter.value)));
        }

        tracing::debug!(table, filters = filters.len(), "selecting rows");
        let request = self.client.get(self.table_url(table)?).query(&query);
        let body = self.send(request, "select").await?;
        parse_rows(&body)
    }
}

fn check_name(kind: &str, name: &str) -> Result<(), StoreError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidRequest(format!("invalid {kind} name: {name}")))
    }
}

/// PostgREST filter operand for an equality match.
fn filter_operand(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        Value::String(s) => format!("eq.{s}"),
        other => format!("eq.{other}"),
    }
}

fn parse_rows(body: &str) -> Result<RowSet, StoreError> {
    if body.trim().is_empty() {
        return Ok(RowSet::default());
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))?;
    Ok(RowSet::from_value(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_operand() {
        assert_eq!(filter_operand(&json!("Barty")), "eq.Barty");
        assert_eq!(filter_operand(&json!(3)), "eq.3");
        assert_eq!(filter_operand(&json!(true)), "eq.true");
        assert_eq!(filter_operand(&Value::Null), "is.null");
    }

    #[test]
    fn test_parse_rows_empty_body() {
        assert!(parse_rows("").unwrap().is_empty());
        assert!(parse_rows("null").unwrap().is_empty());
        assert!(matches!(parse_rows("<html>"), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_rejects_bad_table_name() {
        let store = RestStore::new("http://localhost", "key", Duration::from_secs(1)).unwrap();
        assert!(matches!(
            store.table_url("npcs?select=*"),
            Err(StoreError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let store = RestStore::new("http://localhost/", "secret-key", Duration::from_secs(1)).unwrap();
        assert_eq!(store.base_url(), "http://localhost");
        assert!(!format!("{store:?}").contains("secret-key"));
    }
}
