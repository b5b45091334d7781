//! One conversation cycle per user utterance.

use std::sync::Arc;

use saga_mcp::{ToolDefinition, ToolRegistry};
use tracing::{debug, info, warn};

use crate::error::RuntimeError;
use crate::oracle::{CallRequest, Oracle, OracleReply};
use crate::session::{CycleState, Session, SessionStore};
use crate::turn::Turn;

pub struct Orchestrator {
    oracle: Arc<dyn Oracle>,
    registry: Arc<ToolRegistry>,
    sessions: Arc<SessionStore>,
    system_prompt: String,
    tools: Vec<ToolDefinition>,
}

impl Orchestrator {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        registry: Arc<ToolRegistry>,
        sessions: Arc<SessionStore>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let tools = registry.list().into_iter().cloned().collect();
        Self {
            oracle,
            registry,
            sessions,
            system_prompt: system_prompt.into(),
            tools,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Runs one cycle for `session_id` and returns the model's final text.
    ///
    /// The session lock is held for the whole cycle, so a second utterance on
    /// the same session waits for this one to finish.
    pub async fn run_cycle(&self, session_id: &str, utterance: &str) -> Result<String, RuntimeError> {
        let handle = self.sessions.get_or_create(session_id).await;
        let mut session = handle.lock().await;

        if session.state() != CycleState::Idle {
            warn!(session_id = %session_id, state = %session.state(), "previous cycle did not complete");
        }

        session.append(Turn::user(utterance));
        let result = self.drive(&mut session).await;
        session.transition(CycleState::Idle);
        result
    }

    async fn drive(&self, session: &mut Session) -> Result<String, RuntimeError> {
        session.transition(CycleState::AwaitingModel);
        let reply = self.consult(session).await?;

        let Some(call) = first_call(session.id(), reply.calls.clone()) else {
            let text = reply.text_content().ok_or(RuntimeError::EmptyReply)?.to_string();
            session.append(Turn::model_text(&text));
            return Ok(text);
        };

        let CallRequest {
            call_id,
            name,
            arguments,
        } = call;
        info!(session_id = %session.id(), tool = %name, call_id = %call_id, "model requested tool");

        session.append(Turn::tool_request(&call_id, &name, arguments.clone()));
        session.transition(CycleState::ToolRequested);

        session.transition(CycleState::AwaitingToolResult);
        let output = self
            .registry
            .invoke(&name, arguments)
            .await
            .map_err(|source| {
                warn!(session_id = %session.id(), tool = %name, error = %source, "tool failed; request left unresolved");
                RuntimeError::Tool {
                    name: name.clone(),
                    source,
                }
            })?;

        session.append(Turn::tool_result(&call_id, &name, output.to_text()));
        session.transition(CycleState::AwaitingModel);

        let follow_up = self.consult(session).await?;
        match (follow_up.text_content(), follow_up.calls.first()) {
            (Some(text), calls) => {
                if calls.is_some() {
                    warn!(
                        session_id = %session.id(),
                        dropped = follow_up.calls.len(),
                        "ignoring tool requests that accompany the final reply"
                    );
                }
                let text = text.to_string();
                session.append(Turn::model_text(&text));
                Ok(text)
            }
            (None, Some(chained)) => Err(RuntimeError::ChainedToolCall {
                name: chained.name.clone(),
            }),
            (None, None) => Err(RuntimeError::EmptyReply),
        }
    }

    async fn consult(&self, session: &Session) -> Result<OracleReply, RuntimeError> {
        let view = session.oracle_view();
        debug!(session_id = %session.id(), turns = view.len(), "consulting oracle");
        let reply = self
            .oracle
            .respond(&self.system_prompt, &view, &self.tools)
            .await?;
        Ok(reply)
    }
}

/// Keeps the first call request and drops the rest.
fn first_call(session_id: &str, calls: Vec<CallRequest>) -> Option<CallRequest> {
    let total = calls.len();
    let mut calls = calls.into_iter();
    let first = calls.next()?;
    if total > 1 {
        let dropped: Vec<String> = calls.map(|c| c.name).collect();
        warn!(session_id = %session_id, kept = %first.name, ?dropped, "model requested several tools; only the first runs");
    }
    Some(first)
}
