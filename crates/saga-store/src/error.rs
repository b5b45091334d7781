//! Error types for store access.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("store returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The request never produced a response.
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON the verb promises.
    #[error("invalid store response: {0}")]
    Decode(String),

    /// The request cannot be expressed (bad table or column name).
    #[error("invalid store request: {0}")]
    InvalidRequest(String),
}

impl StoreError {
    /// Upstream status, when the store answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Upstream { status, .. } => Some(*status),
            StoreError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
