//! Signing keys for session tokens.

use crate::AuthError;
use biscuit_auth::{Algorithm, KeyPair as BiscuitKeyPair, PrivateKey, PublicKey};
use rand::RngCore;

/// An Ed25519 keypair for signing and verifying session tokens.
pub struct KeyPair {
    inner: BiscuitKeyPair,
}

impl KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Result<Self, AuthError> {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);

        let private_key = PrivateKey::from_bytes(&bytes, Algorithm::Ed25519)
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        Ok(Self {
            inner: BiscuitKeyPair::from(&private_key),
        })
    }

    /// Load a keypair from a hex-encoded private key string.
    pub fn from_private_key_hex(hex: &str) -> Result<Self, AuthError> {
        let private_key = PrivateKey::from_bytes_hex(hex.trim(), Algorithm::Ed25519)
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        Ok(Self {
            inner: BiscuitKeyPair::from(&private_key),
        })
    }

    pub(crate) fn inner(&self) -> &BiscuitKeyPair {
        &self.inner
    }

    pub fn public_key(&self) -> PublicKey {
        self.inner.public()
    }

    pub fn private_key_hex(&self) -> String {
        self.inner.private().to_bytes_hex()
    }

    pub fn public_key_hex(&self) -> String {
        self.inner.public().to_bytes_hex()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}
