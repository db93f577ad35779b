//! HMAC-SHA256 signing for values the server hands out and later trusts.
//!
//! Session cookies carry `token.signature`; email verification links carry
//! `payload.signature`. Both are keyed by the session-signing secret.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Keyed signer built once from `AUTH_SECRET`.
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

impl Signer {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self { secret: secret.as_bytes().to_vec() }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.secret).unwrap_or_else(|_| unreachable!())
    }

    /// Base64url signature of `value`.
    #[must_use]
    pub fn signature(&self, value: &str) -> String {
        let mut mac = self.mac();
        mac.update(value.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Return `value.signature`.
    #[must_use]
    pub fn sign(&self, value: &str) -> String {
        format!("{value}.{}", self.signature(value))
    }

    /// Verify a `value.signature` string and return the value.
    ///
    /// The split happens at the last dot, so signed values may themselves
    /// contain dots. Comparison is constant-time.
    #[must_use]
    pub fn verify<'a>(&self, signed: &'a str) -> Option<&'a str> {
        let (value, signature) = signed.rsplit_once('.')?;
        if value.is_empty() {
            return None;
        }
        let expected = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let mut mac = self.mac();
        mac.update(value.as_bytes());
        mac.verify_slice(&expected).ok()?;
        Some(value)
    }
}

#[cfg(test)]
#[path = "signing_test.rs"]
mod tests;
