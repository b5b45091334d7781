pub mod auth;

pub use auth::{AuthenticatedSession, CurrentSession, require_session};
