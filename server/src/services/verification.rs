//! Stateless email verification tokens.
//!
//! A token is `base64url(json claims).signature`. Claims bind the user id,
//! the email address the link was sent to, and an expiry 24 hours out.
//! Nothing is stored; changing the account email invalidates old links.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::signing::Signer;

pub const VERIFICATION_TTL: Duration = Duration::hours(24);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationClaims {
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("verification token is malformed or forged")]
    Invalid,
    #[error("verification token has expired")]
    Expired,
}

#[must_use]
pub fn issue(signer: &Signer, user_id: Uuid, email: &str, now: OffsetDateTime) -> String {
    let claims = VerificationClaims {
        sub: user_id,
        email: email.to_owned(),
        exp: (now + VERIFICATION_TTL).unix_timestamp(),
    };
    // Claims are plain data; serialization cannot fail.
    let json = serde_json::to_vec(&claims).unwrap_or_default();
    signer.sign(&URL_SAFE_NO_PAD.encode(json))
}

/// # Errors
///
/// `Invalid` for a bad signature or payload, `Expired` past the deadline.
pub fn verify(signer: &Signer, token: &str, now: OffsetDateTime) -> Result<VerificationClaims, VerificationError> {
    let payload = signer.verify(token).ok_or(VerificationError::Invalid)?;
    let json = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| VerificationError::Invalid)?;
    let claims: VerificationClaims = serde_json::from_slice(&json).map_err(|_| VerificationError::Invalid)?;
    if claims.exp <= now.unix_timestamp() {
        return Err(VerificationError::Expired);
    }
    Ok(claims)
}

/// Accept only same-site relative paths as post-verification redirects.
///
/// Anything outside printable ASCII is refused: browsers drop tabs and
/// newlines before resolving, which turns `/\t/host` into `//host`, and the
/// value must also survive as a `Location` header.
#[must_use]
pub fn safe_callback(raw: Option<&str>) -> Option<&str> {
    raw.filter(|path| {
        path.starts_with('/')
            && !path.starts_with("//")
            && !path.contains('\\')
            && path.bytes().all(|b| b.is_ascii_graphic())
    })
}

/// Build the link placed in the verification email.
#[must_use]
pub fn verification_url(base: &str, token: &str, callback: Option<&str>) -> String {
    let mut url = format!("{}/api/auth/verify-email?token={token}", base.trim_end_matches('/'));
    if let Some(callback) = safe_callback(callback) {
        url.push_str("&callbackURL=");
        url.push_str(&url::form_urlencoded::byte_serialize(callback.as_bytes()).collect::<String>());
    }
    url
}

#[cfg(test)]
#[path = "verification_test.rs"]
mod tests;
