//! Session issue, validation and revocation.
//!
//! ARCHITECTURE
//! ============
//! Session tokens are 32 random bytes, hex-encoded, stored server-side with
//! an expiry. Browsers carry them in a cookie as `token.signature` so a
//! forged cookie never reaches the database; API clients may send the raw
//! token as `Authorization: Bearer <token>`.
//!
//! ERROR POLICY
//! ============
//! Every caller that needs "who is this?" goes through `resolve_user` and
//! then `classify`. `Degrade::Anonymous` means the request simply carries no
//! valid session; `Degrade::Fatal` means a store could not be consulted.
//! Callers decide what each outcome means for them, but they never inspect
//! the individual error variants.

use std::fmt::Write;

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum_extra::extract::cookie::CookieJar;
use rand::Rng;
use sqlx::{PgPool, Row};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::signing::Signer;
use super::users::{CredentialStore, StoreError, User};

pub const SESSION_COOKIE: &str = "starter.session_token";
pub const SESSION_TTL: Duration = Duration::days(7);
const TOKEN_BYTES: usize = 32;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Cheap shape check before any store lookup.
#[must_use]
pub fn is_token_shaped(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2 && token.chars().all(|c| c.is_ascii_hexdigit())
}

/// A live session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
}

impl Session {
    #[must_use]
    pub fn new(user_id: Uuid, now: OffsetDateTime) -> Self {
        Self { token: generate_token(), user_id, expires_at: now + SESSION_TTL }
    }

    #[must_use]
    pub fn is_live_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, user_id: Uuid) -> Result<Session, sqlx::Error>;

    /// Return the session only if it exists and has not expired.
    async fn find_valid(&self, token: &str) -> Result<Option<Session>, sqlx::Error>;

    /// Delete a session. Returns whether a row was removed.
    async fn revoke(&self, token: &str) -> Result<bool, sqlx::Error>;

    /// Delete every session of a user. Returns how many were removed.
    async fn revoke_all(&self, user_id: Uuid) -> Result<u64, sqlx::Error>;
}

// =============================================================================
// RESOLUTION
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no session token presented")]
    Missing,
    #[error("session token failed signature or shape check")]
    Forged,
    #[error("session not found or expired")]
    NotFound,
    #[error("session lookup failed: {0}")]
    Store(#[from] sqlx::Error),
    #[error("user lookup failed: {0}")]
    UserLookup(#[from] StoreError),
    #[error("session refers to a user that no longer exists")]
    UserMissing,
}

/// Outcome of the degrade policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degrade {
    /// The request carries no usable session.
    Anonymous,
    /// A store could not be consulted; identity is unknown.
    Fatal,
}

#[must_use]
pub fn classify(err: &SessionError) -> Degrade {
    match err {
        SessionError::Missing | SessionError::Forged | SessionError::NotFound | SessionError::UserMissing => {
            Degrade::Anonymous
        }
        SessionError::Store(_) | SessionError::UserLookup(_) => Degrade::Fatal,
    }
}

/// Pull the raw session token out of request headers.
///
/// A bearer header wins over the cookie. Cookie values must carry a valid
/// signature.
///
/// # Errors
///
/// `Missing` when neither is present, `Forged` when the value fails the
/// signature or shape check.
pub fn extract_token(headers: &HeaderMap, signer: &Signer) -> Result<String, SessionError> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            return if is_token_shaped(token) { Ok(token.to_owned()) } else { Err(SessionError::Forged) };
        }
    }

    let jar = CookieJar::from_headers(headers);
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Err(SessionError::Missing);
    };
    if cookie.value().is_empty() {
        return Err(SessionError::Missing);
    }
    match signer.verify(cookie.value()) {
        Some(token) if is_token_shaped(token) => Ok(token.to_owned()),
        _ => Err(SessionError::Forged),
    }
}

/// Validate the session carried by `headers`.
///
/// # Errors
///
/// See [`SessionError`].
pub async fn resolve_session(
    headers: &HeaderMap,
    signer: &Signer,
    sessions: &dyn SessionStore,
) -> Result<Session, SessionError> {
    let token = extract_token(headers, signer)?;
    sessions
        .find_valid(&token)
        .await?
        .ok_or(SessionError::NotFound)
}

/// Validate the session, then fetch the canonical user. The two lookups are
/// strictly sequenced.
///
/// # Errors
///
/// See [`SessionError`].
pub async fn resolve_user(
    headers: &HeaderMap,
    signer: &Signer,
    sessions: &dyn SessionStore,
    users: &dyn CredentialStore,
) -> Result<(Session, User), SessionError> {
    let session = resolve_session(headers, signer, sessions).await?;
    let user = users
        .find_by_id(session.user_id)
        .await?
        .ok_or(SessionError::UserMissing)?;
    Ok((session, user))
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, user_id: Uuid) -> Result<Session, sqlx::Error> {
        let session = Session::new(user_id, OffsetDateTime::now_utc());
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.token)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await?;
        Ok(session)
    }

    async fn find_valid(&self, token: &str) -> Result<Option<Session>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT token, user_id, expires_at FROM sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Session {
            token: r.get("token"),
            user_id: r.get("user_id"),
            expires_at: r.get("expires_at"),
        }))
    }

    async fn revoke(&self, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Delete expired sessions. Returns the number of rows removed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Spawn the hourly expired-session sweep.
pub fn spawn_reaper(pool: PgPool) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match purge_expired(&pool).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "purged expired sessions"),
                Err(e) => tracing::warn!(error = %e, "expired session purge failed"),
            }
        }
    })
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
