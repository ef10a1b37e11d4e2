//! Session codec for restricted runtimes.
//!
//! Assumes nothing beyond a bare SHA-256 digest: HMAC is assembled by hand
//! (RFC 2104) and signatures are compared with a branch-free XOR fold. Tokens
//! are byte-identical to those of [`HmacCodec`].
//!
//! [`HmacCodec`]: crate::crypto::hmac_codec::HmacCodec

use sha2::{Digest, Sha256};

use crate::crypto::secret::SessionSecret;
use crate::crypto::token::{SessionCodec, TokenError};

/// SHA-256 input block size in bytes.
const BLOCK_LEN: usize = 64;
const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// HMAC-SHA256 built from the digest alone.
fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    let mut block = [0u8; BLOCK_LEN];
    if key.len() > BLOCK_LEN {
        let hashed = Sha256::digest(key);
        block[..hashed.len()].copy_from_slice(&hashed);
    } else {
        block[..key.len()].copy_from_slice(key);
    }

    let inner_key: Vec<u8> = block.iter().map(|b| b ^ IPAD).collect();
    let outer_key: Vec<u8> = block.iter().map(|b| b ^ OPAD).collect();

    let inner = Sha256::new()
        .chain_update(&inner_key)
        .chain_update(message)
        .finalize();
    let outer = Sha256::new()
        .chain_update(&outer_key)
        .chain_update(inner)
        .finalize();

    hex::encode(outer)
}

/// Session codec backed only by a SHA-256 digest.
#[derive(Clone, Debug)]
pub struct DigestCodec {
    secret: SessionSecret,
}

impl DigestCodec {
    pub fn new(secret: SessionSecret) -> Self {
        Self { secret }
    }
}

impl SessionCodec for DigestCodec {
    fn sign(&self, subject: &str) -> Result<String, TokenError> {
        Ok(hmac_sha256_hex(self.secret.as_bytes(), subject.as_bytes()))
    }

    fn signatures_match(&self, provided: &str, expected: &str) -> bool {
        if provided.len() != expected.len() {
            return false;
        }
        let diff = provided
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        std::hint::black_box(diff) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4231, test cases 1, 2 and 6.
    #[test]
    fn matches_rfc4231_vectors() {
        assert_eq!(
            hmac_sha256_hex(&[0x0b; 20], b"Hi There"),
            "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7"
        );
        assert_eq!(
            hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
        assert_eq!(
            hmac_sha256_hex(
                &[0xaa; 131],
                b"Test Using Larger Than Block-Size Key - Hash Key First"
            ),
            "60e431591ee0b67f0d8a26aacbf5b77f8e0bc6213728c5140546040f0ee37f54"
        );
    }

    #[test]
    fn fold_compare_rejects_any_single_difference() {
        let codec = DigestCodec::new(SessionSecret::new("k"));
        let expected = "0123456789abcdef";
        assert!(codec.signatures_match(expected, expected));
        for i in 0..expected.len() {
            let mut tampered = expected.as_bytes().to_vec();
            tampered[i] = if tampered[i] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8(tampered).unwrap();
            assert!(!codec.signatures_match(&tampered, expected), "position {i}");
        }
        assert!(!codec.signatures_match("0123", expected));
    }
}
