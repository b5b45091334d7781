//! Session token minting and verification.

use crate::{AuthError, KeyPair};
use biscuit_auth::Biscuit;
use biscuit_auth::builder::AuthorizerBuilder;
use biscuit_auth::macros::{check, fact};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A freshly minted token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Claims carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user: String,
    pub session_id: String,
}

/// Mints and verifies session tokens with one keypair.
#[derive(Debug)]
pub struct SessionTokens {
    keypair: KeyPair,
    lifetime: Duration,
}

impl SessionTokens {
    pub fn new(keypair: KeyPair, lifetime: Duration) -> Self {
        Self { keypair, lifetime }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Mint a token for `user`, bound to a new conversation session.
    pub fn issue(&self, user: &str) -> Result<IssuedToken, AuthError> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let lifetime = chrono::Duration::from_std(self.lifetime)
            .map_err(|e| AuthError::TokenCreationFailed(e.to_string()))?;
        let expires_at = Utc::now() + lifetime;

        let biscuit = Biscuit::builder()
            .fact(fact!("user({user})", user = user.to_string()))
            .and_then(|b| b.fact(fact!("session({session})", session = session_id.clone())))
            .and_then(|b| {
                b.check(check!(
                    "check if time($time), $time < {expires_at}",
                    expires_at = expires_at.timestamp()
                ))
            })
            .map_err(|e| AuthError::TokenCreationFailed(e.to_string()))?
            .build(self.keypair.inner())
            .map_err(|e| AuthError::TokenCreationFailed(e.to_string()))?;

        let token = biscuit
            .to_base64()
            .map_err(|e| AuthError::TokenCreationFailed(e.to_string()))?;

        tracing::info!(user, session_id = %session_id, expires_at = %expires_at, "issued session token");
        Ok(IssuedToken {
            token,
            session_id,
            expires_at,
        })
    }

    /// Verify signature and expiry, and extract the claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let biscuit = Biscuit::from_base64(token, self.keypair.public_key())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let now = Utc::now().timestamp();
        let mut authorizer = AuthorizerBuilder::new()
            .code(format!(
                r#"
                time({now});
                allow if true;
                "#
            ))
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .build(&biscuit)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        authorizer
            .authorize()
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(SessionClaims {
            user: extract_string_fact(&mut authorizer, "user")?,
            session_id: extract_string_fact(&mut authorizer, "session")?,
        })
    }
}

fn extract_string_fact(
    authorizer: &mut biscuit_auth::Authorizer,
    name: &str,
) -> Result<String, AuthError> {
    let rule: biscuit_auth::builder::Rule = format!("data($x) <- {name}($x)")
        .parse()
        .map_err(|e: biscuit_auth::error::Token| AuthError::InvalidToken(e.to_string()))?;

    let results: Vec<(String,)> = authorizer
        .query(rule)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    results
        .into_iter()
        .next()
        .map(|(s,)| s)
        .ok_or_else(|| AuthError::MissingClaim {
            claim: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(lifetime: Duration) -> SessionTokens {
        SessionTokens::new(KeyPair::generate().unwrap(), lifetime)
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = tokens(Duration::from_secs(8 * 3600));
        let issued = tokens.issue("player").unwrap();

        let claims = tokens.verify(&issued.token).unwrap();
        assert_eq!(claims.user, "player");
        assert_eq!(claims.session_id, issued.session_id);
    }

    #[test]
    fn test_each_login_gets_its_own_session() {
        let tokens = tokens(Duration::from_secs(60));
        let first = tokens.issue("player").unwrap();
        let second = tokens.issue("player").unwrap();
        assert_ne!(first.session_id, second.session_id);
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = tokens(Duration::ZERO);
        let issued = tokens.issue("player").unwrap();
        assert!(matches!(
            tokens.verify(&issued.token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_token_from_other_key_rejected() {
        let issuer = tokens(Duration::from_secs(60));
        let verifier = tokens(Duration::from_secs(60));
        let issued = issuer.issue("player").unwrap();
        assert!(matches!(
            verifier.verify(&issued.token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let tokens = tokens(Duration::from_secs(60));
        assert!(matches!(
            tokens.verify("definitely-not-a-token"),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
