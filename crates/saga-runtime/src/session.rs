//! Per-session conversation history.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::turn::{Turn, TurnKind};

/// Where a session sits inside its current cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleState {
    #[default]
    Idle,
    AwaitingModel,
    ToolRequested,
    AwaitingToolResult,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleState::Idle => "idle",
            CycleState::AwaitingModel => "awaiting_model",
            CycleState::ToolRequested => "tool_requested",
            CycleState::AwaitingToolResult => "awaiting_tool_result",
        };
        f.write_str(name)
    }
}

/// An append-only conversation.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    turns: Vec<Turn>,
    state: CycleState,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            turns: Vec::new(),
            state: CycleState::Idle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Adds a turn. Turns are never removed or rewritten.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub(crate) fn transition(&mut self, next: CycleState) {
        if self.state != next {
            debug!(session_id = %self.id, from = %self.state, to = %next, "cycle state transition");
            self.state = next;
        }
    }

    /// The most recent tool request that has no matching result, if any.
    pub fn unresolved_request(&self) -> Option<&Turn> {
        let resolved = self.resolved_call_ids();
        self.turns
            .iter()
            .rev()
            .filter(|turn| turn.is_tool_request())
            .find(|turn| turn.call_id().is_some_and(|id| !resolved.contains(id)))
    }

    /// History as shown to the oracle: every turn except tool requests
    /// whose result never arrived.
    pub fn oracle_view(&self) -> Vec<Turn> {
        let resolved = self.resolved_call_ids();
        self.turns
            .iter()
            .filter(|turn| match &turn.kind {
                TurnKind::ToolInvocationRequest { call_id, .. } => resolved.contains(call_id.as_str()),
                _ => true,
            })
            .cloned()
            .collect()
    }

    fn resolved_call_ids(&self) -> HashSet<&str> {
        self.turns
            .iter()
            .filter_map(|turn| match &turn.kind {
                TurnKind::ToolResult { call_id, .. } => Some(call_id.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// In-memory map of session id to session.
///
/// Each session sits behind its own mutex; the orchestrator holds it for a
/// whole cycle.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `id`, creating an empty one on first use.
    pub async fn get_or_create(&self, id: &str) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(id.to_string()).or_insert_with(|| {
            debug!(session_id = %id, "creating session");
            Arc::new(Mutex::new(Session::new(id)))
        });
        Arc::clone(session)
    }

    /// Snapshot of a session's turns. Waits for an in-flight cycle to finish.
    pub async fn history(&self, id: &str) -> Option<Vec<Turn>> {
        let session = self.sessions.read().await.get(id).cloned()?;
        let session = session.lock().await;
        Some(session.turns().to_vec())
    }

    /// Drops a session. Returns whether it existed.
    pub async fn clear(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            debug!(session_id = %id, "cleared session");
        }
        removed
    }

    pub async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unresolved_request_tracks_missing_results() {
        let mut session = Session::new("s1");
        session.append(Turn::user("who is Barty?"));
        assert!(session.unresolved_request().is_none());

        session.append(Turn::tool_request("c1", "get_npc_data", json!({"npc_name": "Barty"})));
        assert_eq!(session.unresolved_request().and_then(Turn::call_id), Some("c1"));

        session.append(Turn::tool_result("c1", "get_npc_data", "{}"));
        assert!(session.unresolved_request().is_none());
    }

    #[test]
    fn test_oracle_view_omits_unresolved_requests_only() {
        let mut session = Session::new("s1");
        session.append(Turn::user("one"));
        session.append(Turn::tool_request("c1", "get_table_data", json!({"table": "npcs"})));
        session.append(Turn::tool_result("c1", "get_table_data", "[]"));
        session.append(Turn::model_text("nobody here"));
        session.append(Turn::user("two"));
        session.append(Turn::tool_request("c2", "get_npc_data", json!({})));

        let view = session.oracle_view();
        assert_eq!(view.len(), 5);
        assert!(view.iter().all(|turn| turn.call_id() != Some("c2")));
        // The full history is untouched.
        assert_eq!(session.len(), 6);
    }

    #[tokio::test]
    async fn test_store_reuses_sessions() {
        let store = SessionStore::new();
        let first = store.get_or_create("abc").await;
        first.lock().await.append(Turn::user("hello"));

        let again = store.get_or_create("abc").await;
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(store.history("abc").await.map(|h| h.len()), Some(1));
        assert_eq!(store.session_ids().await, vec!["abc".to_string()]);

        assert!(store.clear("abc").await);
        assert!(!store.clear("abc").await);
        assert!(store.history("abc").await.is_none());
        assert!(store.is_empty().await);
    }
}
