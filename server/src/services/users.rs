//! Credential store: user identity records.
//!
//! ARCHITECTURE
//! ============
//! Handlers and the procedure context builder only see the
//! `CredentialStore` trait. `PgCredentialStore` is the production
//! implementation; tests swap in the in-memory store from
//! `state::test_helpers`.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Public identity of a user. This is all the rest of the system sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Full row used by sign-in: identity plus credential state.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub email_verified: bool,
    pub password_hash: Option<String>,
}

/// Input for a password account. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Profile returned by Google's userinfo endpoint, normalized.
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    pub google_id: String,
    pub email: String,
    pub name: String,
    pub email_verified: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    EmailTaken,
    #[error("account exists and the provider did not verify the email")]
    AccountNotLinked,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn create_password_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Insert or link a Google account. Returns the user and whether the row
    /// was newly created.
    ///
    /// An existing row with the same email is linked only when Google
    /// verified the address or the row already carries this Google id;
    /// otherwise `AccountNotLinked`.
    async fn upsert_google_user(&self, profile: &GoogleProfile) -> Result<(User, bool), StoreError>;

    /// Mark the email verified if it still matches. Returns `false` when no
    /// user with that id and email exists.
    async fn mark_email_verified(&self, id: Uuid, email: &str) -> Result<bool, StoreError>;

    /// Remove the user row. Returns `false` when it was already gone.
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
        return None;
    }
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return None;
    }
    Some(normalized)
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> User {
    User { id: row.get("id"), email: row.get("email"), name: row.get("name") }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT id, email, name FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, email, name, email_verified, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserRecord {
            user: user_from_row(&r),
            email_verified: r.get("email_verified"),
            password_hash: r.get("password_hash"),
        }))
    }

    async fn create_password_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query(
            r"INSERT INTO users (id, email, name, password_hash)
              VALUES ($1, $2, $3, $4)
              RETURNING id, email, name",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(user_from_row(&row)),
            Err(e) if is_unique_violation(&e) => Err(StoreError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert_google_user(&self, profile: &GoogleProfile) -> Result<(User, bool), StoreError> {
        let row = sqlx::query(
            r"INSERT INTO users (id, email, name, email_verified, google_id)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (email) DO UPDATE SET
                  google_id = COALESCE(users.google_id, EXCLUDED.google_id),
                  email_verified = users.email_verified OR EXCLUDED.email_verified,
                  updated_at = now()
              WHERE EXCLUDED.email_verified OR users.google_id = EXCLUDED.google_id
              RETURNING id, email, name, (xmax = 0) AS created",
        )
        .bind(Uuid::new_v4())
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(profile.email_verified)
        .bind(&profile.google_id)
        .fetch_optional(&self.pool)
        .await?;

        // The conflict guard filtered the update out.
        let row = row.ok_or(StoreError::AccountNotLinked)?;
        Ok((user_from_row(&row), row.get("created")))
    }

    async fn mark_email_verified(&self, id: Uuid, email: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET email_verified = TRUE, updated_at = now() WHERE id = $1 AND email = $2",
        )
        .bind(id)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
