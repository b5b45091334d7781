//! The model side of a conversation.
//!
//! An [`Oracle`] receives the system prompt, the history it may see and the
//! tool catalogue, and answers with text, tool requests, or both.

mod openai;
mod scripted;

pub use openai::OpenAiOracle;
pub use scripted::ScriptedOracle;

use async_trait::async_trait;
use saga_mcp::ToolDefinition;
use serde_json::Value;

use crate::error::OracleError;
use crate::turn::Turn;

/// A tool the model asked to run.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub call_id: String,
    pub name: String,
    pub arguments: Value,
}

impl CallRequest {
    pub fn new(call_id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One model response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleReply {
    pub text: Option<String>,
    pub calls: Vec<CallRequest>,
}

impl OracleReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            calls: Vec::new(),
        }
    }

    pub fn call(name: impl Into<String>, arguments: Value) -> Self {
        let name = name.into();
        Self {
            text: None,
            calls: vec![CallRequest::new(format!("call_{name}"), name, arguments)],
        }
    }

    pub fn with_call(mut self, call: CallRequest) -> Self {
        self.calls.push(call);
        self
    }

    /// Text with surrounding whitespace removed, if any is left.
    pub fn text_content(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    async fn respond(
        &self,
        system_prompt: &str,
        history: &[Turn],
        tools: &[ToolDefinition],
    ) -> Result<OracleReply, OracleError>;
}
