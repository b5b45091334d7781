use std::collections::VecDeque;

use async_trait::async_trait;
use saga_mcp::ToolDefinition;
use tokio::sync::Mutex;

use super::{Oracle, OracleReply};
use crate::error::OracleError;
use crate::turn::Turn;

/// Replays queued replies in order and records every history it was shown.
///
/// A test double; the server always talks to [`super::OpenAiOracle`].
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<OracleReply>>,
    seen: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedOracle {
    pub fn new(replies: impl IntoIterator<Item = OracleReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub async fn push(&self, reply: OracleReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Histories passed to `respond`, oldest first.
    pub async fn histories(&self) -> Vec<Vec<Turn>> {
        self.seen.lock().await.clone()
    }

    pub async fn remaining(&self) -> usize {
        self.replies.lock().await.len()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn respond(
        &self,
        _system_prompt: &str,
        history: &[Turn],
        _tools: &[ToolDefinition],
    ) -> Result<OracleReply, OracleError> {
        self.seen.lock().await.push(history.to_vec());
        self.replies
            .lock()
            .await
            .pop_front()
            .ok_or(OracleError::Exhausted)
    }
}
