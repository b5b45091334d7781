//! # saga-runtime
//!
//! Drives one conversation cycle per user utterance:
//!
//! ```text
//! utterance ─▶ oracle ─┬─▶ text ─────────────────────────────▶ reply
//!                      └─▶ call ─▶ tool registry ─▶ oracle ─▶ reply
//! ```
//!
//! History lives in a [`SessionStore`] keyed by session id. Each session is
//! an append-only sequence of [`Turn`]s guarded by its own lock, so cycles on
//! one session run one at a time while other sessions proceed.

pub mod error;
pub mod oracle;
pub mod orchestrator;
pub mod session;
pub mod turn;

pub use error::{OracleError, RuntimeError};
pub use oracle::{CallRequest, OpenAiOracle, Oracle, OracleReply, ScriptedOracle};
pub use orchestrator::Orchestrator;
pub use session::{CycleState, Session, SessionStore};
pub use turn::{Turn, TurnKind};
