//! Webhook signature definitions.

use hmac::{Hmac, Mac as _};
use sha2::Sha256;
use subtle::ConstantTimeEq as _;

/// HMAC-SHA256 keyed hasher.
type HmacSha256 = Hmac<Sha256>;

/// Computes the hex-encoded HMAC-SHA256 signature of the provided `body`.
#[must_use]
pub fn sign(body: &[u8], secret: &[u8]) -> String {
    hex::encode(digest(body, secret))
}

/// Verifies the hex-encoded HMAC-SHA256 `signature` of the provided raw
/// `body`.
///
/// Comparison is performed in constant time. Malformed signatures never
/// verify.
#[must_use]
pub fn verify(body: &[u8], signature: &str, secret: &[u8]) -> bool {
    let Ok(actual) = hex::decode(signature.trim()) else {
        return false;
    };
    let expected = digest(body, secret);
    if expected.len() != actual.len() {
        return false;
    }
    expected.as_slice().ct_eq(actual.as_slice()).into()
}

/// Computes the raw HMAC-SHA256 digest of the provided `body`.
fn digest(body: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .expect("HMAC accepts keys of any size");
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod spec {
    use super::{sign, verify};

    const SECRET: &[u8] = b"whsec_test";
    const BODY: &[u8] = br#"{"event":"payment.captured"}"#;

    #[test]
    fn verifies_own_signature() {
        let signature = sign(BODY, SECRET);

        assert_eq!(signature.len(), 64);
        assert!(verify(BODY, &signature, SECRET));
        assert!(verify(BODY, &signature.to_uppercase(), SECRET));
    }

    #[test]
    fn rejects_tampered_body() {
        let signature = sign(BODY, SECRET);

        assert!(!verify(br#"{"event":"payment.failed"}"#, &signature, SECRET));
    }

    #[test]
    fn rejects_foreign_secret() {
        let signature = sign(BODY, b"another");

        assert!(!verify(BODY, &signature, SECRET));
    }

    #[test]
    fn rejects_malformed_signature() {
        assert!(!verify(BODY, "", SECRET));
        assert!(!verify(BODY, "not hex at all", SECRET));
        assert!(!verify(BODY, "abcd", SECRET));
    }
}
