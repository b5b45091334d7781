//! # saga-server
//!
//! HTTP surface and process bootstrap for Saga.
//!
//! | Route | Auth | Purpose |
//! |-------|------|---------|
//! | `POST /login` | password | exchange the access password for a session token |
//! | `POST /chat` | bearer | run one conversation cycle |
//! | `GET /health` | none | liveness |
//! | `POST /mcp` | bearer (configurable) | JSON-RPC tool surface |
//! | `GET /` | none | server metadata |

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::{AppState, AuthGate};
