//! Webhook signature verification (X-Hub-Signature-256).

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header GitHub puts the body signature in.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Compute the signature header value for `payload`: `sha256=<hex digest>`.
pub fn sign(secret: &str, payload: &[u8]) -> Option<String> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return None,
    };
    mac.update(payload);
    Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

/// Verify a webhook body against the configured secret.
///
/// No secret (or an empty one) disables verification. With a secret, a
/// missing header is rejected and a present one must match exactly. The
/// comparison runs over the raw bytes as received and is constant-time.
pub fn verify(payload: &[u8], signature_header: Option<&str>, secret: Option<&str>) -> bool {
    let secret = match secret {
        Some(s) if !s.is_empty() => s,
        _ => {
            tracing::warn!("No webhook secret configured, skipping signature verification");
            return true;
        }
    };

    let provided = match signature_header {
        Some(h) => h,
        None => {
            tracing::warn!("No {} header found in the request", SIGNATURE_HEADER);
            return false;
        }
    };

    let expected = match sign(secret, payload) {
        Some(expected) => expected,
        None => return false,
    };
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "s3cr3t";
    const HELLO_SIGNATURE: &str =
        "sha256=6b23653f08c72072554e5dfef9b72efe01fcfe724a950689e991e7bd7089eb3e";

    #[test]
    fn test_known_signature() {
        assert_eq!(sign(SECRET, b"hello").as_deref(), Some(HELLO_SIGNATURE));
        assert!(verify(b"hello", Some(HELLO_SIGNATURE), Some(SECRET)));
    }

    #[test]
    fn test_body_bit_flips_are_rejected() {
        let body = b"hello".to_vec();
        for byte in 0..body.len() {
            for bit in 0..8 {
                let mut mutated = body.clone();
                mutated[byte] ^= 1 << bit;
                assert!(
                    !verify(&mutated, Some(HELLO_SIGNATURE), Some(SECRET)),
                    "accepted body with bit {} of byte {} flipped",
                    bit,
                    byte
                );
            }
        }
    }

    #[test]
    fn test_header_bit_flips_are_rejected() {
        let header = HELLO_SIGNATURE.as_bytes().to_vec();
        for byte in 0..header.len() {
            for bit in 0..8 {
                let mut mutated = header.clone();
                mutated[byte] ^= 1 << bit;
                // Invalid UTF-8 cannot arrive as a header string at all
                if let Ok(mutated) = String::from_utf8(mutated) {
                    assert!(!verify(b"hello", Some(&mutated), Some(SECRET)));
                }
            }
        }
    }

    #[test]
    fn test_missing_header_rejected_when_secret_set() {
        assert!(!verify(b"hello", None, Some(SECRET)));
    }

    #[test]
    fn test_truncated_or_unprefixed_header_rejected() {
        assert!(!verify(b"hello", Some(&HELLO_SIGNATURE[..20]), Some(SECRET)));
        assert!(!verify(
            b"hello",
            Some(HELLO_SIGNATURE.trim_start_matches("sha256=")),
            Some(SECRET)
        ));
        assert!(!verify(b"hello", Some(""), Some(SECRET)));
    }

    #[test]
    fn test_no_secret_accepts_everything() {
        assert!(verify(b"hello", None, None));
        assert!(verify(b"hello", Some("sha256=garbage"), None));
        assert!(verify(b"", None, Some("")));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        assert!(!verify(b"hello", Some(HELLO_SIGNATURE), Some("other")));
    }
}
