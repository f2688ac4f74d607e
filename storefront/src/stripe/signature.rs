//! Stripe webhook signature verification (HMAC-SHA256)

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Reject events older than 5 minutes to prevent replay attacks
pub const TOLERANCE_SECS: i64 = 300;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid Stripe-Signature header")]
    MalformedHeader,
    #[error("invalid timestamp")]
    InvalidTimestamp,
    #[error("webhook signature mismatch")]
    Mismatch,
    #[error("webhook timestamp outside tolerance")]
    Expired,
    #[error("HMAC key error")]
    Key,
}

/// Verify `Stripe-Signature` (`t=...,v1=...[,v1=...]`) against the raw body
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    verify_webhook_signature_at(payload, sig_header, secret, chrono::Utc::now().timestamp())
}

pub fn verify_webhook_signature_at(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;

    let mac = signed_mac(payload, timestamp, secret)?;
    // Any v1 entry may match (secret rotation); hex garbage counts as a miss.
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    if (now - ts).abs() > TOLERANCE_SECS {
        return Err(SignatureError::Expired);
    }

    Ok(())
}

/// Build a `Stripe-Signature` header value for `payload` at `timestamp`
pub fn signature_header(
    payload: &[u8],
    secret: &str,
    timestamp: i64,
) -> Result<String, SignatureError> {
    let t = timestamp.to_string();
    let sig = hex::encode(signed_mac(payload, &t, secret)?.finalize().into_bytes());
    Ok(format!("t={t},v1={sig}"))
}

fn signed_mac(
    payload: &[u8],
    timestamp: &str,
    secret: &str,
) -> Result<Hmac<Sha256>, SignatureError> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Key)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}
