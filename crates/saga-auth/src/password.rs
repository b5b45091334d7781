use crate::AuthError;

/// Shared-password check for `/login`.
pub struct PasswordGate {
    password: String,
}

impl PasswordGate {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    /// Compare `candidate` against the configured password in time that does
    /// not depend on where the first mismatch is.
    pub fn check(&self, candidate: &str) -> Result<(), AuthError> {
        let expected = self.password.as_bytes();
        let given = candidate.as_bytes();
        let diff = expected
            .iter()
            .zip(given.iter())
            .fold(expected.len() ^ given.len(), |acc, (a, b)| {
                acc | usize::from(a ^ b)
            });
        if diff == 0 {
            Ok(())
        } else {
            Err(AuthError::InvalidPassword)
        }
    }
}

impl std::fmt::Debug for PasswordGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordGate(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_check() {
        let gate = PasswordGate::new("open sesame");
        assert!(gate.check("open sesame").is_ok());
        assert!(matches!(gate.check("open sesam"), Err(AuthError::InvalidPassword)));
        assert!(matches!(gate.check("open sesame!"), Err(AuthError::InvalidPassword)));
        assert!(matches!(gate.check(""), Err(AuthError::InvalidPassword)));
    }
}
