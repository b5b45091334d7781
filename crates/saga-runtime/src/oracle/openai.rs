//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use saga_mcp::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{CallRequest, Oracle, OracleReply};
use crate::error::OracleError;
use crate::turn::{Turn, TurnKind};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDef<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ToolDef<'a> {
    #[serde(rename = "type")]
    typ: &'static str,
    function: FunctionDef<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionDef<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    parameters: &'a Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallOut>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ToolCallOut {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    typ: String,
    function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

/// Arguments travel as a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallOut>>,
}

/// Talks to any endpoint that speaks the `chat/completions` wire format.
pub struct OpenAiOracle {
    client: reqwest::Client,
    inference_url: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiOracle")
            .field("inference_url", &self.inference_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl OpenAiOracle {
    pub fn new(
        inference_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            inference_url: inference_url.into(),
            model: model.into(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Renders the system prompt and history into chat messages.
fn render_messages(system_prompt: &str, history: &[Turn]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    if !system_prompt.trim().is_empty() {
        messages.push(ChatMessage::text("system", system_prompt));
    }

    for turn in history {
        let message = match &turn.kind {
            TurnKind::UserUtterance { text } => ChatMessage::text("user", text),
            TurnKind::ModelText { text } => ChatMessage::text("assistant", text),
            TurnKind::ToolInvocationRequest {
                call_id,
                name,
                arguments,
            } => ChatMessage {
                role: "assistant".to_string(),
                content: None,
                tool_calls: Some(vec![ToolCallOut {
                    id: call_id.clone(),
                    typ: function_type(),
                    function: FunctionCall {
                        name: name.clone(),
                        arguments: arguments.to_string(),
                    },
                }]),
                tool_call_id: None,
                name: None,
            },
            TurnKind::ToolResult {
                call_id,
                name,
                content,
            } => ChatMessage {
                role: "tool".to_string(),
                content: Some(content.clone()),
                tool_calls: None,
                tool_call_id: Some(call_id.clone()),
                name: Some(name.clone()),
            },
        };
        messages.push(message);
    }
    messages
}

fn render_tools(tools: &[ToolDefinition]) -> Option<Vec<ToolDef<'_>>> {
    if tools.is_empty() {
        return None;
    }
    Some(
        tools
            .iter()
            .map(|tool| ToolDef {
                typ: "function",
                function: FunctionDef {
                    name: &tool.name,
                    description: tool.description.as_deref(),
                    parameters: &tool.input_schema,
                },
            })
            .collect(),
    )
}

fn parse_call(call: ToolCallOut) -> Result<CallRequest, OracleError> {
    let raw = call.function.arguments.trim();
    let arguments = if raw.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(raw).map_err(|e| {
            OracleError::Decode(format!(
                "arguments for {} are not valid JSON: {e}",
                call.function.name
            ))
        })?
    };
    let call_id = if call.id.is_empty() {
        format!("call_{}", uuid::Uuid::new_v4().simple())
    } else {
        call.id
    };
    Ok(CallRequest {
        call_id,
        name: call.function.name,
        arguments,
    })
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn respond(
        &self,
        system_prompt: &str,
        history: &[Turn],
        tools: &[ToolDefinition],
    ) -> Result<OracleReply, OracleError> {
        let tools = render_tools(tools);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: render_messages(system_prompt, history),
            tool_choice: tools.as_ref().map(|_| "auto"),
            tools,
        };

        debug!(model = %self.model, messages = body.messages.len(), "calling model");

        let mut request = self.client.post(&self.inference_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(OracleError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| OracleError::Decode(format!("{e}; body: {text}")))?;
        let message = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::Decode("response has no choices".to_string()))?
            .message;

        let calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(parse_call)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OracleReply {
            text: message.content,
            calls,
        })
    }
}
