use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::crypto::secret::SessionSecret;
use crate::crypto::token::{SessionCodec, TokenError};

type HmacSha256 = Hmac<Sha256>;

/// Session codec for the full server runtime, backed by the `hmac` crate.
#[derive(Clone, Debug)]
pub struct HmacCodec {
    secret: SessionSecret,
}

impl HmacCodec {
    pub fn new(secret: SessionSecret) -> Self {
        Self { secret }
    }
}

impl SessionCodec for HmacCodec {
    fn sign(&self, subject: &str) -> Result<String, TokenError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| TokenError::PrimitiveUnavailable(format!("HMAC key rejected: {}", e)))?;
        mac.update(subject.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn signatures_match(&self, provided: &str, expected: &str) -> bool {
        if provided.len() != expected.len() {
            return false;
        }
        provided.as_bytes().ct_eq(expected.as_bytes()).into()
    }
}
