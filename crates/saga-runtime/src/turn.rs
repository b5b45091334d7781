//! Conversation turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub at: DateTime<Utc>,
    pub kind: TurnKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnKind {
    UserUtterance {
        text: String,
    },
    ModelText {
        text: String,
    },
    ToolInvocationRequest {
        call_id: String,
        name: String,
        arguments: Value,
    },
    ToolResult {
        call_id: String,
        name: String,
        content: String,
    },
}

impl Turn {
    pub fn new(kind: TurnKind) -> Self {
        Self {
            at: Utc::now(),
            kind,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnKind::UserUtterance { text: text.into() })
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(TurnKind::ModelText { text: text.into() })
    }

    pub fn tool_request(call_id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self::new(TurnKind::ToolInvocationRequest {
            call_id: call_id.into(),
            name: name.into(),
            arguments,
        })
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(TurnKind::ToolResult {
            call_id: call_id.into(),
            name: name.into(),
            content: content.into(),
        })
    }

    /// The call id, for tool requests and results.
    pub fn call_id(&self) -> Option<&str> {
        match &self.kind {
            TurnKind::ToolInvocationRequest { call_id, .. } | TurnKind::ToolResult { call_id, .. } => {
                Some(call_id)
            }
            _ => None,
        }
    }

    pub fn is_tool_request(&self) -> bool {
        matches!(self.kind, TurnKind::ToolInvocationRequest { .. })
    }
}
