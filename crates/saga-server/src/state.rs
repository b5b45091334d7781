//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use saga_auth::{AuthError, IssuedToken, PasswordGate, SessionClaims, SessionTokens};
use saga_mcp::McpServer;
use saga_runtime::Orchestrator;

/// Subject recorded in tokens minted by `/login`.
pub const LOGIN_SUBJECT: &str = "player";

/// Password check plus token minting and verification.
pub struct AuthGate {
    password: PasswordGate,
    tokens: SessionTokens,
}

impl AuthGate {
    pub fn new(password: PasswordGate, tokens: SessionTokens) -> Self {
        Self { password, tokens }
    }

    pub fn login(&self, candidate: &str) -> Result<IssuedToken, AuthError> {
        self.password.check(candidate)?;
        self.tokens.issue(LOGIN_SUBJECT)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.tokens.verify(token)
    }
}

pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub mcp: Arc<McpServer>,
    /// `None` when authentication is disabled.
    pub auth: Option<Arc<AuthGate>>,
    pub turn_timeout: Duration,
    pub mcp_enabled: bool,
    pub mcp_require_auth: bool,
    pub cors: bool,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, mcp: Arc<McpServer>) -> Self {
        Self {
            orchestrator,
            mcp,
            auth: None,
            turn_timeout: Duration::from_secs(120),
            mcp_enabled: true,
            mcp_require_auth: true,
            cors: true,
        }
    }

    pub fn with_auth(mut self, gate: AuthGate) -> Self {
        self.auth = Some(Arc::new(gate));
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn with_mcp(mut self, enabled: bool, require_auth: bool) -> Self {
        self.mcp_enabled = enabled;
        self.mcp_require_auth = require_auth;
        self
    }

    pub fn with_cors(mut self, cors: bool) -> Self {
        self.cors = cors;
        self
    }

    /// Whether `/mcp` sits behind the bearer gate.
    pub fn mcp_gated(&self) -> bool {
        self.mcp_require_auth && self.auth.is_some()
    }
}
