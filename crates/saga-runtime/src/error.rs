use saga_mcp::ToolError;
use thiserror::Error;

/// Failures talking to the model endpoint.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("invalid model response: {0}")]
    Decode(String),

    /// A scripted oracle ran out of replies.
    #[error("no scripted reply left")]
    Exhausted,
}

/// Failures of a conversation cycle.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// The requested tool failed; the request stays unresolved in history.
    #[error("tool {name} failed: {source}")]
    Tool {
        name: String,
        #[source]
        source: ToolError,
    },

    /// The model answered a tool result with another tool request.
    #[error("model requested {name} after a tool result; only one tool round-trip per utterance is supported")]
    ChainedToolCall { name: String },

    /// The model returned neither text nor a tool request.
    #[error("model returned an empty reply")]
    EmptyReply,
}
