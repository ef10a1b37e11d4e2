use std::fmt;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::crypto::token::TokenError;

/// The signing key used outside production when `SESSION_SECRET` is unset.
pub const FALLBACK_DEV_SECRET: &str = "fallback-dev-secret";

/// The process-wide key that signs session tokens.
///
/// Cloning is cheap and every clone shares the same zeroized buffer.
#[derive(Clone)]
pub struct SessionSecret(Arc<Zeroizing<Vec<u8>>>);

impl SessionSecret {
    /// Wraps raw key material.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::new(Zeroizing::new(bytes.into())))
    }

    /// Picks the signing key from the configured value.
    ///
    /// An empty value counts as unset. Without a configured value, development
    /// falls back to [`FALLBACK_DEV_SECRET`] and production refuses to start.
    ///
    /// # Arguments
    ///
    /// * `configured` - The value of `SESSION_SECRET`, if any.
    /// * `production` - Whether the process runs in production mode.
    ///
    /// # Returns
    ///
    /// The resolved secret, or `TokenError::Misconfigured`.
    pub fn resolve(configured: Option<String>, production: bool) -> Result<Self, TokenError> {
        match configured.filter(|value| !value.is_empty()) {
            Some(value) => Ok(Self::new(Zeroizing::new(value).as_bytes())),
            None if production => Err(TokenError::Misconfigured),
            None => {
                tracing::warn!(
                    "⚠️ SESSION_SECRET is not set, signing sessions with the public development fallback"
                );
                Ok(Self::new(FALLBACK_DEV_SECRET))
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether this secret is the public development fallback.
    pub fn is_fallback(&self) -> bool {
        self.as_bytes() == FALLBACK_DEV_SECRET.as_bytes()
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(**redacted**)")
    }
}
