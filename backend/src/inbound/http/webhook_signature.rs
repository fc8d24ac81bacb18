//! HMAC-SHA256 verification for signed webhook deliveries.
//!
//! Senders put `t=<unix seconds>,v1=<hex digest>` in a header, where the
//! digest covers `"{t}." + raw body`. Several `v1` entries may appear while a
//! secret is being rotated; any match is accepted.

use std::fmt;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::Error;

type HmacSha256 = Hmac<Sha256>;

/// Default window, in seconds, in which a signed timestamp is accepted.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Reasons a webhook signature is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("webhook secret is not configured")]
    NotConfigured,
    #[error("signature header is missing")]
    MissingHeader,
    #[error("signature header is malformed")]
    Malformed,
    #[error("signature timestamp is outside the tolerance window")]
    Expired,
    #[error("signature does not match the payload")]
    Mismatch,
}

impl From<SignatureError> for Error {
    fn from(err: SignatureError) -> Self {
        Error::unauthorized(err.to_string())
    }
}

/// Verifies webhook payloads against a shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<Zeroizing<Vec<u8>>>,
    tolerance_secs: u64,
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(SignatureError::Malformed);
        };
        match key {
            "t" => {
                timestamp = Some(value.parse().map_err(|_| SignatureError::Malformed)?);
            }
            "v1" => signatures.push(hex::decode(value).map_err(|_| SignatureError::Malformed)?),
            _ => {}
        }
    }
    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(SignatureHeader {
            timestamp,
            signatures,
        }),
        _ => Err(SignatureError::Malformed),
    }
}

fn keyed_mac(secret: &[u8], timestamp: i64, body: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => HmacSha256::new(&Default::default()),
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac
}

impl WebhookVerifier {
    /// Build a verifier; `None` rejects every delivery as not configured.
    pub fn new(secret: Option<&str>, tolerance_secs: u64) -> Self {
        Self {
            secret: secret.map(|value| Zeroizing::new(value.as_bytes().to_vec())),
            tolerance_secs,
        }
    }

    /// Verifier without a secret.
    pub fn disabled() -> Self {
        Self::new(None, DEFAULT_TOLERANCE_SECS)
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Check `header` against `body` as seen at `now`.
    pub fn verify(
        &self,
        header: Option<&str>,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let secret = self.secret.as_ref().ok_or(SignatureError::NotConfigured)?;
        let parsed = parse_header(header.ok_or(SignatureError::MissingHeader)?)?;

        let age = now.timestamp().abs_diff(parsed.timestamp);
        if age > self.tolerance_secs {
            return Err(SignatureError::Expired);
        }

        let matched = parsed.signatures.iter().any(|candidate| {
            keyed_mac(secret, parsed.timestamp, body)
                .verify_slice(candidate)
                .is_ok()
        });
        if matched {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

/// Produce a header value signing `body` at `timestamp`.
///
/// # Examples
/// ```
/// use academy_backend::inbound::http::webhook_signature::signature_header;
///
/// let header = signature_header("whsec", 1_700_000_000, b"{}");
/// assert!(header.starts_with("t=1700000000,v1="));
/// ```
pub fn signature_header(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let digest = keyed_mac(secret.as_bytes(), timestamp, body)
        .finalize()
        .into_bytes();
    format!("t={timestamp},v1={}", hex::encode(digest))
}
