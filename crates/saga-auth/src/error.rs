//! Error types for the auth gate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token on a request that needs one.
    #[error("missing bearer token")]
    MissingToken,

    /// The password presented at login did not match.
    #[error("invalid password")]
    InvalidPassword,

    /// The token is malformed, forged or expired.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token is missing required claim.
    #[error("token missing required claim: {claim}")]
    MissingClaim { claim: String },

    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("failed to create token: {0}")]
    TokenCreationFailed(String),
}
