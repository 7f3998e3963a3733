//! Outbound webhook signatures.
//!
//! Every delivery carries `X-FeedbackPulse-Signature: sha256=<hex>`, the
//! HMAC-SHA256 of the exact request body keyed with the project's webhook
//! secret. Receivers recompute it over the raw bytes they got.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Prefix identifying the digest algorithm in the signature header.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Sign a serialized payload.
///
/// # Panics
///
/// Panics if `secret` is empty.
pub fn sign(payload: &[u8], secret: &str) -> String {
    assert!(!secret.is_empty(), "webhook secret must not be empty");

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload);

    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

/// Check a signature produced by [`sign`].
///
/// Returns `false` on any mismatch, including malformed signatures.
pub fn verify(payload: &[u8], signature: &str, secret: &str) -> bool {
    if secret.is_empty() || signature.is_empty() {
        warn!(
            has_secret = !secret.is_empty(),
            has_signature = !signature.is_empty(),
            "webhook_signature_missing_fields"
        );
        return false;
    }

    let expected = sign(payload, secret);

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(&expected, signature);

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = signature.len(),
            "webhook_signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
