use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use saga_auth::AuthError;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Claims of a verified bearer token, inserted as a request extension.
#[derive(Clone, Debug)]
pub struct AuthenticatedSession {
    pub user: String,
    pub session_id: String,
}

/// The verified session, if the request passed through [`require_session`].
#[derive(Clone, Debug)]
pub struct CurrentSession(pub Option<AuthenticatedSession>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthenticatedSession>().cloned()))
    }
}

/// Rejects requests without a valid session token.
///
/// 401 when the token is absent, 403 when it is forged or expired.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(gate) = state.auth.as_ref() else {
        return Ok(next.run(req).await);
    };

    let token = extract_bearer(req.headers()).ok_or(AuthError::MissingToken)?;
    let claims = gate.verify(&token).map_err(|e| {
        debug!(error = %e, path = %req.uri().path(), "rejected session token");
        e
    })?;

    req.extensions_mut().insert(AuthenticatedSession {
        user: claims.user,
        session_id: claims.session_id,
    });

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(extract_bearer(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok123"));
        assert_eq!(extract_bearer(&headers).as_deref(), Some("tok123"));
    }
}
