//! Webhook signature verification.
//!
//! GitHub signs every delivery with an HMAC-SHA256 of the raw body using the shared
//! webhook secret and sends it as `X-Hub-Signature-256: sha256=<hex>`.
//! Comparison is constant-time to mitigate timing attacks.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify `signature` (the raw header value) against `body`.
pub fn verify_signature(secret: &str, body: &[u8], signature: Option<&str>) -> Result<(), AppError> {
    let Some(signature) = signature else {
        return Err(AppError::Unauthorized(format!(
            "Missing {} header",
            SIGNATURE_HEADER
        )));
    };

    let provided = signature
        .trim()
        .strip_prefix(SIGNATURE_PREFIX)
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
        .ok_or_else(|| AppError::Unauthorized("Malformed signature".to_string()))?;

    let expected = sign(secret, body)?;

    if constant_time_compare(&provided, &expected) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid signature".to_string()))
    }
}

/// Compute the raw HMAC-SHA256 digest of `body`.
fn sign(secret: &str, body: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Unauthorized("Unusable webhook secret".to_string()))?;
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Format a signature header value the way GitHub sends it.
#[cfg(test)]
pub fn signature_header(secret: &str, body: &[u8]) -> String {
    let digest = sign(secret, body).unwrap();
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(digest))
}

/// Perform constant-time byte comparison.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
