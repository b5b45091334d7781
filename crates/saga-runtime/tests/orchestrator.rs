//! Conversation cycles against a scripted oracle and an in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use saga_core::SchemaCapability;
use saga_mcp::{ToolDefinition, ToolError, ToolExecutor, ToolRegistry};
use saga_runtime::{
    CallRequest, CycleState, Oracle, OracleError, Orchestrator, OracleReply, RuntimeError,
    ScriptedOracle, SessionStore, Turn, TurnKind,
};
use saga_sql::TableAllowList;
use saga_store::{MemoryStore, Mutation, Verb};
use serde_json::json;

struct Harness {
    store: Arc<MemoryStore>,
    oracle: Arc<ScriptedOracle>,
    orchestrator: Orchestrator,
}

fn registry(store: Arc<MemoryStore>) -> Arc<ToolRegistry> {
    let capability = SchemaCapability::PersonaSplit;
    let executor = ToolExecutor::new(
        store,
        capability,
        TableAllowList::new(capability.known_tables()),
    );
    Arc::new(ToolRegistry::for_capability(executor))
}

fn harness(store: MemoryStore, replies: Vec<OracleReply>) -> Harness {
    let store = Arc::new(store);
    let registry = registry(store.clone());
    let oracle = Arc::new(ScriptedOracle::new(replies));
    let orchestrator = Orchestrator::new(
        oracle.clone(),
        registry,
        Arc::new(SessionStore::new()),
        "You narrate a tavern.",
    );
    Harness {
        store,
        oracle,
        orchestrator,
    }
}

fn barty_call() -> OracleReply {
    OracleReply::call(
        "create_npc",
        json!({
            "npc_id": "npc_barty_bumble",
            "name": "Barty",
            "description": "a baker",
            "location": "market"
        }),
    )
}

fn kinds(turns: &[Turn]) -> Vec<&'static str> {
    turns
        .iter()
        .map(|turn| match turn.kind {
            TurnKind::UserUtterance { .. } => "user",
            TurnKind::ModelText { .. } => "model",
            TurnKind::ToolInvocationRequest { .. } => "request",
            TurnKind::ToolResult { .. } => "result",
        })
        .collect()
}

#[tokio::test]
async fn test_plain_text_reply() {
    let h = harness(MemoryStore::new(), vec![OracleReply::text("The fire crackles.")]);

    let reply = h.orchestrator.run_cycle("s1", "look around").await.unwrap();
    assert_eq!(reply, "The fire crackles.");

    let history = h.orchestrator.sessions().history("s1").await.unwrap();
    assert_eq!(kinds(&history), ["user", "model"]);
    assert!(h.store.mutations().await.is_empty());
}

#[tokio::test]
async fn test_tool_round_trip_creates_npc() {
    let h = harness(
        MemoryStore::new(),
        vec![barty_call(), OracleReply::text("Barty sets out fresh loaves.")],
    );

    let reply = h
        .orchestrator
        .run_cycle("s1", "Barty the baker appears")
        .await
        .unwrap();
    assert_eq!(reply, "Barty sets out fresh loaves.");

    let rows = h.store.rows("npcs").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["location"], "market");

    let history = h.orchestrator.sessions().history("s1").await.unwrap();
    assert_eq!(kinds(&history), ["user", "request", "result", "model"]);
    match &history[2].kind {
        TurnKind::ToolResult { content, name, .. } => {
            assert_eq!(name, "create_npc");
            assert_eq!(content, "Successfully created NPC: Barty");
        }
        other => panic!("unexpected turn {other:?}"),
    }

    // The second consultation sees the request and its result.
    let seen = h.oracle.histories().await;
    assert_eq!(seen.len(), 2);
    assert_eq!(kinds(&seen[1]), ["user", "request", "result"]);
}

#[tokio::test]
async fn test_tool_failure_leaves_request_unresolved() {
    let h = harness(
        MemoryStore::new(),
        vec![barty_call(), OracleReply::text("never used")],
    );
    h.store.inject_failure(Verb::Insert, Some("npcs"), 500).await;

    let err = h
        .orchestrator
        .run_cycle("s1", "Barty the baker appears")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Tool {
            source: ToolError::Store(_),
            ..
        }
    ));

    let handle = h.orchestrator.sessions().get_or_create("s1").await;
    let session = handle.lock().await;
    assert_eq!(kinds(session.turns()), ["user", "request"]);
    assert!(session.unresolved_request().is_some());
    assert_eq!(session.state(), CycleState::Idle);
    drop(session);

    // The dangling request is hidden from the next consultation.
    h.oracle.push(OracleReply::text("The market is quiet.")).await;
    h.orchestrator.run_cycle("s1", "anyone there?").await.unwrap();
    let seen = h.oracle.histories().await;
    assert_eq!(kinds(seen.last().unwrap()), ["user", "user"]);
}

#[tokio::test]
async fn test_unknown_tool_fails_the_cycle() {
    let h = harness(
        MemoryStore::new(),
        vec![OracleReply::call("summon_dragon", json!({}))],
    );

    let err = h.orchestrator.run_cycle("s1", "summon").await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Tool {
            source: ToolError::UnknownOperation { .. },
            ..
        }
    ));
    assert!(h.store.mutations().await.is_empty());
}

#[tokio::test]
async fn test_only_first_call_runs() {
    let reply = barty_call().with_call(CallRequest::new(
        "call_2",
        "update_npc_data",
        json!({"npc_id": "npc_barty_bumble", "new_location": "docks"}),
    ));
    let h = harness(MemoryStore::new(), vec![reply, OracleReply::text("Done.")]);

    h.orchestrator.run_cycle("s1", "go").await.unwrap();

    let mutations = h.store.mutations().await;
    assert_eq!(mutations.len(), 1);
    assert!(matches!(&mutations[0], Mutation::Insert { table, .. } if table == "npcs"));
    assert_eq!(h.store.rows("npcs").await[0]["location"], "market");
}

#[tokio::test]
async fn test_chained_call_is_rejected() {
    let h = harness(
        MemoryStore::new(),
        vec![
            barty_call(),
            OracleReply::call("get_npc_data", json!({"npc_name": "Barty"})),
        ],
    );

    let err = h.orchestrator.run_cycle("s1", "go").await.unwrap_err();
    match err {
        RuntimeError::ChainedToolCall { name } => assert_eq!(name, "get_npc_data"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_reply_is_an_error() {
    let h = harness(MemoryStore::new(), vec![OracleReply::default()]);
    let err = h.orchestrator.run_cycle("s1", "hello").await.unwrap_err();
    assert!(matches!(err, RuntimeError::EmptyReply));
}

#[tokio::test]
async fn test_history_is_append_only_across_cycles() {
    let h = harness(
        MemoryStore::new(),
        vec![
            OracleReply::text("first"),
            barty_call(),
            OracleReply::text("second"),
        ],
    );

    h.orchestrator.run_cycle("s1", "one").await.unwrap();
    let before = h.orchestrator.sessions().history("s1").await.unwrap();

    h.orchestrator.run_cycle("s1", "two").await.unwrap();
    let after = h.orchestrator.sessions().history("s1").await.unwrap();

    assert!(after.len() > before.len());
    assert_eq!(&after[..before.len()], before.as_slice());
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let h = harness(
        MemoryStore::new(),
        vec![OracleReply::text("for a"), OracleReply::text("for b")],
    );

    h.orchestrator.run_cycle("a", "hello from a").await.unwrap();
    h.orchestrator.run_cycle("b", "hello from b").await.unwrap();

    let seen = h.oracle.histories().await;
    assert_eq!(seen[1].len(), 1);
    assert!(matches!(
        &seen[1][0].kind,
        TurnKind::UserUtterance { text } if text == "hello from b"
    ));
    assert_eq!(
        h.orchestrator.sessions().session_ids().await,
        vec!["a".to_string(), "b".to_string()]
    );
}

/// Holds its first response until released, then answers every history with
/// the last utterance it contains.
#[derive(Default)]
struct HeldOracle {
    held: AtomicBool,
    entered: tokio::sync::Notify,
    release: tokio::sync::Notify,
    seen: tokio::sync::Mutex<Vec<Vec<Turn>>>,
}

#[async_trait]
impl Oracle for HeldOracle {
    async fn respond(
        &self,
        _system_prompt: &str,
        history: &[Turn],
        _tools: &[ToolDefinition],
    ) -> Result<OracleReply, OracleError> {
        self.seen.lock().await.push(history.to_vec());
        if !self.held.swap(true, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        let last = history
            .iter()
            .rev()
            .find_map(|turn| match &turn.kind {
                TurnKind::UserUtterance { text } => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_default();
        Ok(OracleReply::text(format!("re: {last}")))
    }
}

#[tokio::test]
async fn test_concurrent_cycles_serialize_per_session() {
    let oracle = Arc::new(HeldOracle::default());
    let orchestrator = Arc::new(Orchestrator::new(
        oracle.clone(),
        registry(Arc::new(MemoryStore::new())),
        Arc::new(SessionStore::new()),
        "You narrate a tavern.",
    ));

    let first = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.run_cycle("s1", "one").await }
    });
    oracle.entered.notified().await;

    let second = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.run_cycle("s1", "two").await }
    });
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }

    // Another session proceeds while s1 is held inside the oracle.
    let other = tokio::time::timeout(Duration::from_secs(5), orchestrator.run_cycle("s2", "hi"))
        .await
        .expect("s2 must not wait on s1")
        .unwrap();
    assert_eq!(other, "re: hi");
    assert_eq!(oracle.seen.lock().await.len(), 2);

    oracle.release.notify_one();
    assert_eq!(first.await.unwrap().unwrap(), "re: one");
    assert_eq!(second.await.unwrap().unwrap(), "re: two");

    let seen = oracle.seen.lock().await.clone();
    assert_eq!(seen.len(), 3);
    assert_eq!(kinds(&seen[0]), ["user"]);
    assert_eq!(kinds(&seen[1]), ["user"]);
    assert_eq!(kinds(&seen[2]), ["user", "model", "user"]);

    let history = orchestrator.sessions().history("s1").await.unwrap();
    assert_eq!(kinds(&history), ["user", "model", "user", "model"]);
    assert!(matches!(
        &history[2].kind,
        TurnKind::UserUtterance { text } if text == "two"
    ));
    assert_eq!(
        kinds(&orchestrator.sessions().history("s2").await.unwrap()),
        ["user", "model"]
    );
}
