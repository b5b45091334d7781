//! # saga-auth
//!
//! The authentication gate in front of the chat and MCP surfaces.
//!
//! A caller proves it knows the access password once, at `/login`, and
//! receives a session token. Tokens are Biscuit tokens signed with an Ed25519
//! key; the authority block carries the user, the conversation session the
//! token is bound to, and an expiry check. Verification needs only the public
//! half of the key.
//!
//! ```text
//! user("player");
//! session("6f1c...");
//! check if time($time), $time < 1767225600;
//! ```

pub mod error;
pub mod keys;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use keys::KeyPair;
pub use password::PasswordGate;
pub use token::{IssuedToken, SessionClaims, SessionTokens};
