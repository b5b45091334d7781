//! MCP server implementation.
//!
//! A stateless JSON-RPC dispatcher over a [`ToolRegistry`]. The same
//! dispatcher serves the HTTP transport and the stdio transport; neither
//! touches conversation history.

use crate::error::{McpError, ToolError};
use crate::protocol::*;
use crate::tools::ToolRegistry;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// The MCP server.
pub struct McpServer {
    name: String,
    tools: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(name: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            name: name.into(),
            tools,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Static metadata served at `GET /`.
    pub fn metadata(&self) -> Value {
        json!({
            "name": self.name,
            "version": env!("CARGO_PKG_VERSION"),
            "transports": ["http", "stdio"],
        })
    }

    /// Handle a JSON-RPC request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" | "notifications/initialized" => JsonRpcResponse::success(id, json!({})),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    /// Handle one line of raw JSON-RPC text.
    ///
    /// Returns `None` for notifications, which get no response.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };
        let id = value.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {e}"),
                ));
            }
        };

        let is_notification = request.is_notification();
        let response = self.handle_request(request).await;
        (!is_notification).then_some(response)
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": self.name,
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            }
        });
        JsonRpcResponse::success(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let tools: Vec<_> = self.tools.list().into_iter().cloned().collect();
        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}"));
                }
            },
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        match self.tools.invoke(&params.name, params.arguments).await {
            Ok(output) => {
                let response = CallToolResponse {
                    content: vec![output.to_content()],
                    is_error: Some(false),
                };
                match serde_json::to_value(response) {
                    Ok(result) => JsonRpcResponse::success(id, result),
                    Err(e) => JsonRpcResponse::error(id, OPERATION_FAILED, e.to_string()),
                }
            }
            Err(e) => tool_error_response(id, &params.name, e),
        }
    }

    /// Serve newline-delimited JSON-RPC from `reader` to `writer` until EOF.
    pub async fn serve_lines<R, W>(&self, reader: R, mut writer: W) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(line).await {
                let mut response_json = serde_json::to_string(&response)?;
                response_json.push('\n');
                writer.write_all(response_json.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    /// Run the server with stdio transport.
    pub async fn run_stdio(&self) -> Result<(), McpError> {
        tracing::info!("Starting MCP server with stdio transport");
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.serve_lines(stdin, tokio::io::stdout()).await
    }
}

fn tool_error_response(id: Option<Value>, tool: &str, error: ToolError) -> JsonRpcResponse {
    let code = error.json_rpc_code();
    let response = JsonRpcResponse::error(id, code, error.to_string());
    match error {
        ToolError::UnknownOperation { .. } => response.with_error_data(json!({ "tool": tool })),
        ToolError::Store(e) => match e.status() {
            Some(status) => response.with_error_data(json!({ "tool": tool, "status": status })),
            None => response.with_error_data(json!({ "tool": tool })),
        },
        _ => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ToolExecutor;
    use saga_core::SchemaCapability;
    use saga_sql::TableAllowList;
    use saga_store::MemoryStore;

    fn server() -> McpServer {
        let capability = SchemaCapability::PersonaSplit;
        let executor = ToolExecutor::new(
            Arc::new(MemoryStore::new()),
            capability,
            TableAllowList::new(capability.known_tables()),
        );
        McpServer::new("saga", Arc::new(ToolRegistry::for_capability(executor)))
    }

    fn request(method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = server().handle_request(request("initialize", None)).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "saga");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = server().handle_request(request("resources/list", None)).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_call_without_params() {
        let response = server().handle_request(request("tools/call", None)).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_unknown_tool_names_the_tool() {
        let response = server()
            .handle_request(request(
                "tools/call",
                Some(json!({"name": "drop_world", "arguments": {}})),
            ))
            .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.data, Some(json!({"tool": "drop_world"})));
    }

    #[tokio::test]
    async fn test_parse_error_and_notification() {
        let server = server();
        let response = server.handle_message("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, -32700);

        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_serve_lines() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );
        let mut output = Vec::new();
        server()
            .serve_lines(input.as_bytes(), &mut output)
            .await
            .unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["result"]["tools"].as_array().unwrap().len(), 9);
    }
}
