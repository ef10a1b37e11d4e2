//! Stateless signed session tokens.
//!
//! A token is `subject.signature`, where `signature` is the lower-case hex
//! HMAC-SHA256 of `subject` under the process-wide [`SessionSecret`]. Nothing
//! is stored server side: validity is recomputed on every request.
//!
//! [`SessionSecret`]: crate::crypto::secret::SessionSecret

use thiserror::Error;

/// Separates the subject from the signature. Never appears in hex output.
pub const TOKEN_DELIMITER: char = '.';

/// Length of a hex-encoded HMAC-SHA256 signature.
pub const SIGNATURE_HEX_LEN: usize = 64;

/// Errors produced while issuing or verifying a session token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is absent, malformed or carries the wrong signature.
    #[error("invalid session token")]
    Invalid,

    /// A token was requested for an empty subject.
    #[error("session subject must not be empty")]
    EmptySubject,

    /// No signing secret is configured and fallback is not allowed.
    #[error("SESSION_SECRET must be set in production")]
    Misconfigured,

    /// The MAC primitive could not be invoked.
    #[error("MAC primitive unavailable: {0}")]
    PrimitiveUnavailable(String),
}

impl TokenError {
    /// True when the caller should treat the request as unauthenticated.
    /// Everything else means the service itself is broken.
    pub fn is_invalid(&self) -> bool {
        matches!(self, TokenError::Invalid)
    }
}

/// Splits a token at its rightmost delimiter.
///
/// Returns `None` when there is no delimiter or either side is empty.
pub fn split_token(token: &str) -> Option<(&str, &str)> {
    let (subject, signature) = token.rsplit_once(TOKEN_DELIMITER)?;
    if subject.is_empty() || signature.is_empty() {
        return None;
    }
    Some((subject, signature))
}

/// Issues and verifies session tokens over some MAC primitive.
///
/// Implementors provide the MAC and the comparison; token layout and the
/// accept/reject rules are shared so every implementation agrees on exactly
/// the same set of tokens.
pub trait SessionCodec: Send + Sync {
    /// Lower-case hex MAC of `subject` under the codec's secret.
    fn sign(&self, subject: &str) -> Result<String, TokenError>;

    /// Compares two signatures without exiting early on differing content.
    /// Unequal lengths may be rejected immediately.
    fn signatures_match(&self, provided: &str, expected: &str) -> bool;

    /// Creates a bearer token for `subject`.
    fn issue(&self, subject: &str) -> Result<String, TokenError> {
        if subject.is_empty() {
            return Err(TokenError::EmptySubject);
        }
        let signature = self.sign(subject)?;
        Ok(format!("{subject}{TOKEN_DELIMITER}{signature}"))
    }

    /// Returns the trusted subject carried by `token`.
    ///
    /// Malformed input never panics; it yields `TokenError::Invalid`. The
    /// subject is not checked against any account store.
    fn verify(&self, token: Option<&str>) -> Result<String, TokenError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(TokenError::Invalid)?;
        let (subject, signature) = split_token(token).ok_or(TokenError::Invalid)?;
        let expected = self.sign(subject)?;

        if self.signatures_match(signature, &expected) {
            Ok(subject.to_string())
        } else {
            Err(TokenError::Invalid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_uses_rightmost_delimiter() {
        assert_eq!(split_token("a.b.cafe"), Some(("a.b", "cafe")));
        assert_eq!(split_token("user-42.00ff"), Some(("user-42", "00ff")));
    }

    #[test]
    fn split_rejects_missing_parts() {
        assert_eq!(split_token("no-delimiter-here"), None);
        assert_eq!(split_token("subject."), None);
        assert_eq!(split_token(".sig"), None);
        assert_eq!(split_token("."), None);
        assert_eq!(split_token(""), None);
    }

    #[test]
    fn only_invalid_is_recoverable() {
        assert!(TokenError::Invalid.is_invalid());
        assert!(!TokenError::Misconfigured.is_invalid());
        assert!(!TokenError::EmptySubject.is_invalid());
        assert!(!TokenError::PrimitiveUnavailable("gone".into()).is_invalid());
    }
}
