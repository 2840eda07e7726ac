//! Signed session cookie (spec §6: `session=base64(json).hex(hmac-sha256(secret,
//! json))`; `HttpOnly`, `SameSite=Lax`, 7-day expiry; constant-time
//! verification).

use crate::error::ApiError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const COOKIE_NAME: &str = "session";
const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub player_id: i64,
    pub discord_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    pub fn new(player_id: i64, discord_id: String) -> Self {
        let now = Utc::now();
        Self {
            player_id,
            discord_id,
            issued_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Builds the `Set-Cookie` header value for a freshly issued session.
pub fn encode_cookie(claims: &SessionClaims, secret: &[u8]) -> Result<String, ApiError> {
    let json = serde_json::to_vec(claims).map_err(|_| ApiError::BadRequest("failed to encode session".into()))?;
    let payload = BASE64.encode(&json);
    let sig = sign(payload.as_bytes(), secret);

    Ok(format!(
        "{COOKIE_NAME}={payload}.{sig}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_TTL_DAYS * 24 * 60 * 60
    ))
}

/// Parses and verifies a raw `Cookie` header value, returning the claims
/// for the session cookie if present and valid.
pub fn decode_cookie(cookie_header: &str, secret: &[u8]) -> Option<SessionClaims> {
    let raw = cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|kv| kv.strip_prefix(&format!("{COOKIE_NAME}=")))?;

    let (payload, sig) = raw.split_once('.')?;
    let expected = sign(payload.as_bytes(), secret);
    if !constant_time_eq(expected.as_bytes(), sig.as_bytes()) {
        return None;
    }

    let json = BASE64.decode(payload).ok()?;
    let claims: SessionClaims = serde_json::from_slice(&json).ok()?;
    if claims.is_expired() {
        return None;
    }
    Some(claims)
}

fn sign(payload: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time byte comparison (spec §6: "Verification must be
/// constant-time"). `subtle`/`ring` are not in the workspace dependency
/// set, so this is a direct, non-short-circuiting XOR fold.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
