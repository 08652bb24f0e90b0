use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_TIMESTAMP: &str = "X-Webhook-Timestamp";
pub const HEADER_SIGNATURE: &str = "X-Webhook-Signature";
pub const SIGNATURE_PREFIX: &str = "sha256=";

const SECRET_BYTES: usize = 32;

/// Headers attached to every outbound webhook request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub timestamp: u64,
    pub signature: String,
}

impl SignedHeaders {
    pub fn signature_header(&self) -> String {
        format!("{}{}", SIGNATURE_PREFIX, self.signature)
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", "application/json".to_string()),
            (HEADER_TIMESTAMP, self.timestamp.to_string()),
            (HEADER_SIGNATURE, self.signature_header()),
        ]
    }
}

/// Hex-encoded HMAC-SHA256 of `payload` keyed by `secret`.
pub fn sign(payload: &[u8], secret: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    };
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks `signature` against the expected HMAC without leaking how many
/// bytes matched. Malformed or wrong-length candidates yield `false`.
pub fn verify(payload: &[u8], signature: &str, secret: &[u8]) -> bool {
    let expected = sign(payload, secret);
    if signature.len() != expected.len() {
        return false;
    }
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

/// Fresh random secret for a new subscription.
pub fn new_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn build_headers(payload: &[u8], secret: &[u8]) -> SignedHeaders {
    build_headers_at(payload, secret, crate::utils::time::unix_seconds())
}

pub fn build_headers_at(payload: &[u8], secret: &[u8], timestamp: u64) -> SignedHeaders {
    let signature = sign(&signed_message(timestamp, payload), secret);
    SignedHeaders {
        timestamp,
        signature,
    }
}

/// Bytes covered by the signature header: `"{timestamp}.{payload}"`.
pub fn signed_message(timestamp: u64, payload: &[u8]) -> Vec<u8> {
    let prefix = format!("{}.", timestamp);
    let mut message = Vec::with_capacity(prefix.len() + payload.len());
    message.extend_from_slice(prefix.as_bytes());
    message.extend_from_slice(payload);
    message
}

pub fn parse_signature_header(header: &str) -> Option<&str> {
    header.strip_prefix(SIGNATURE_PREFIX)
}
