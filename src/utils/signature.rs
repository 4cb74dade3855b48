//! HMAC-SHA256 checks for payment provider callbacks.
//!
//! Checkout callbacks sign `order_id|payment_id` with the API key secret;
//! webhooks sign the raw request body with the webhook secret. Both are hex
//! digests compared in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub fn sign(secret: &str, message: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message);
    Some(hex::encode(mac.finalize().into_bytes()))
}

pub fn payment_signature(order_id: &str, payment_id: &str, secret: &str) -> Option<String> {
    sign(secret, format!("{order_id}|{payment_id}").as_bytes())
}

/// True iff `signature` is the hex HMAC-SHA256 of `order_id|payment_id` under `secret`.
pub fn verify(order_id: &str, payment_id: &str, signature: &str, secret: &str) -> bool {
    match payment_signature(order_id, payment_id, secret) {
        Some(expected) => constant_time_eq(&expected, signature),
        None => false,
    }
}

pub fn verify_webhook(body: &[u8], signature: &str, secret: &str) -> bool {
    match sign(secret, body) {
        Some(expected) => constant_time_eq(&expected, signature),
        None => false,
    }
}

fn constant_time_eq(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "rzp_test_secret";

    #[test]
    fn matches_reference_digest() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        assert_eq!(
            sign("key", b"The quick brown fox jumps over the lazy dog").as_deref(),
            Some("f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8")
        );
    }

    #[test]
    fn accepts_own_signature() {
        let sig = payment_signature("order_1", "pay_1", SECRET).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(verify("order_1", "pay_1", &sig, SECRET));
    }

    #[test]
    fn rejects_wrong_secret_and_swapped_fields() {
        let sig = payment_signature("order_1", "pay_1", SECRET).unwrap();
        assert!(!verify("order_1", "pay_1", &sig, "other"));
        assert!(!verify("pay_1", "order_1", &sig, SECRET));
    }

    #[test]
    fn rejects_truncated_and_empty_signatures() {
        let sig = payment_signature("order_1", "pay_1", SECRET).unwrap();
        assert!(!verify("order_1", "pay_1", &sig[..63], SECRET));
        assert!(!verify("order_1", "pay_1", "", SECRET));
    }

    #[test]
    fn webhook_body_signature() {
        let body = br#"{"event":"payment.failed"}"#;
        let sig = sign("whsec", body).unwrap();
        assert!(verify_webhook(body, &sig, "whsec"));
        assert!(!verify_webhook(br#"{"event":"payment.captured"}"#, &sig, "whsec"));
    }
}
