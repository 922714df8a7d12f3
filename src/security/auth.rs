//! Bearer token authentication.

/// Why an `Authorization` header was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Header absent, or not of the form `Bearer <token>`.
    MissingOrMalformed,
    /// Well-formed header carrying the wrong token.
    InvalidToken,
}

/// Validates a single static shared secret.
#[derive(Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Check an `Authorization` header value.
    pub fn verify(&self, header: Option<&str>) -> Result<(), AuthFailure> {
        let presented = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or(AuthFailure::MissingOrMalformed)?;

        if presented == self.token {
            Ok(())
        } else {
            Err(AuthFailure::InvalidToken)
        }
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").field("token", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_token_authorizes() {
        let auth = BearerAuth::new("s8undu8wb8");
        assert_eq!(auth.verify(Some("Bearer s8undu8wb8")), Ok(()));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let auth = BearerAuth::new("secret");
        for header in [None, Some(""), Some("Bearer"), Some("Bearer "), Some("Basic secret"), Some("bearer secret"), Some("secret")] {
            assert_eq!(auth.verify(header), Err(AuthFailure::MissingOrMalformed), "{header:?}");
        }
    }

    #[test]
    fn wrong_tokens_are_rejected() {
        let auth = BearerAuth::new("secret");
        for header in ["Bearer SECRET", "Bearer secret extra", "Bearer  secret", "Bearer secre", "Bearer secret "] {
            assert_eq!(auth.verify(Some(header)), Err(AuthFailure::InvalidToken), "{header}");
        }
    }

    #[test]
    fn debug_hides_the_secret() {
        let auth = BearerAuth::new("secret");
        assert!(!format!("{auth:?}").contains("secret"));
    }
}
