//! Email/password accounts: sign-up, sign-in, and email verification.
//!
//! DESIGN
//! ======
//! Sign-up never creates a session. The account must be verified through
//! the emailed link first; a sign-in with the right password on an
//! unverified account is refused and triggers a fresh link.
//!
//! Unknown email and wrong password produce the same `InvalidCredentials`
//! error so the response never reveals whether an account exists.

use time::OffsetDateTime;
use uuid::Uuid;

use super::mailer;
use super::password::{self, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, PasswordError};
use super::session::Session;
use super::users::{NewUser, StoreError, User, normalize_email};
use super::verification::{self, VerificationError};
use crate::rate_limit::RateLimitError;
use crate::state::AppState;

pub const MIN_NAME_LEN: usize = 1;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email not verified")]
    EmailNotVerified,
    #[error("invalid password")]
    InvalidPassword,
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),
    #[error("invalid token: {0}")]
    InvalidToken(#[from] VerificationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("session store error: {0}")]
    Session(#[from] sqlx::Error),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl AuthError {
    /// Stable machine-readable code sent to clients.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::InvalidCredentials => "INVALID_EMAIL_OR_PASSWORD",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::RateLimited(_) => "TOO_MANY_REQUESTS",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::Store(_) | Self::Session(_) | Self::Password(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub callback_url: Option<String>,
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("Password must be at least {MIN_PASSWORD_LEN} characters")));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("Password must be at most {MAX_PASSWORD_LEN} characters")));
    }
    Ok(())
}

fn validate_email(raw: &str) -> Result<String, AuthError> {
    normalize_email(raw).ok_or_else(|| AuthError::Validation("Invalid email".into()))
}

/// Create a password account and send the verification and welcome emails.
///
/// # Errors
///
/// `Validation` for bad input, `UserAlreadyExists` for a taken email, and
/// store or hashing failures.
pub async fn sign_up(state: &AppState, input: SignUpInput) -> Result<User, AuthError> {
    let email = validate_email(&input.email)?;
    let name = input.name.trim().to_owned();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(AuthError::Validation("Name is required".into()));
    }
    validate_password(&input.password)?;

    let password_hash = password::hash(input.password).await?;
    let user = state
        .users
        .create_password_user(NewUser { email, name, password_hash })
        .await
        .map_err(|e| match e {
            StoreError::EmailTaken => AuthError::UserAlreadyExists,
            other => AuthError::Store(other),
        })?;

    send_verification(state, &user, input.callback_url.as_deref());
    mailer::dispatch(
        state.mailer.clone(),
        mailer::welcome(&user.email, &user.name, &state.config.absolute_url("/dashboard")),
    );

    tracing::info!(user_id = %user.id, "password account created");
    Ok(user)
}

/// Check credentials and open a session.
///
/// # Errors
///
/// `InvalidCredentials` for an unknown email or wrong password,
/// `EmailNotVerified` when the password is right but the email is not yet
/// verified, `RateLimited` past the attempt limits for `client` or the email.
pub async fn sign_in(
    state: &AppState,
    client: &str,
    email: &str,
    password: &str,
) -> Result<(Session, User), AuthError> {
    let email = validate_email(email)?;
    state.rate_limiter.check_and_record(client, &email)?;

    // Unknown emails and Google-only accounts still pay for one hash.
    let record = state.users.find_by_email(&email).await?;
    let Some((record, stored_hash)) = record.and_then(|r| r.password_hash.clone().map(|hash| (r, hash))) else {
        password::verify_absent(password.to_owned()).await?;
        return Err(AuthError::InvalidCredentials);
    };
    if !password::verify(password.to_owned(), stored_hash).await? {
        return Err(AuthError::InvalidCredentials);
    }

    if !record.email_verified {
        send_verification(state, &record.user, None);
        return Err(AuthError::EmailNotVerified);
    }

    let session = state.sessions.create(record.user.id).await?;
    state.rate_limiter.reset(&email);
    tracing::info!(user_id = %record.user.id, "password sign-in");
    Ok((session, record.user))
}

/// Re-send the verification link for an unverified account. Unknown or
/// already verified addresses are silently ignored.
///
/// # Errors
///
/// Only store failures.
pub async fn resend_verification(state: &AppState, email: &str, callback_url: Option<&str>) -> Result<(), AuthError> {
    let Some(email) = normalize_email(email) else {
        return Ok(());
    };
    if let Some(record) = state.users.find_by_email(&email).await?
        && !record.email_verified
    {
        send_verification(state, &record.user, callback_url);
    }
    Ok(())
}

/// Consume a verification token. Returns the verified user id.
///
/// # Errors
///
/// `InvalidToken` when the token is forged or expired, or the account's
/// email no longer matches the one the link was sent to.
pub async fn verify_email(state: &AppState, token: &str) -> Result<Uuid, AuthError> {
    let claims = verification::verify(&state.signer, token, OffsetDateTime::now_utc())?;
    if !state
        .users
        .mark_email_verified(claims.sub, &claims.email)
        .await?
    {
        return Err(AuthError::InvalidToken(VerificationError::Invalid));
    }
    tracing::info!(user_id = %claims.sub, "email verified");
    Ok(claims.sub)
}

/// Delete an account and every session it holds. Password accounts must
/// confirm with the current password; Google-only accounts rely on the
/// live session alone.
///
/// # Errors
///
/// `InvalidPassword` when the confirmation is missing or wrong, otherwise
/// store failures.
pub async fn delete_account(state: &AppState, user: &User, password: Option<&str>) -> Result<(), AuthError> {
    let stored_hash = state
        .users
        .find_by_email(&user.email)
        .await?
        .and_then(|record| record.password_hash);
    if let Some(stored_hash) = stored_hash {
        let Some(password) = password else {
            return Err(AuthError::InvalidPassword);
        };
        if !password::verify(password.to_owned(), stored_hash).await? {
            return Err(AuthError::InvalidPassword);
        }
    }

    let revoked = state.sessions.revoke_all(user.id).await?;
    state.users.delete_user(user.id).await?;
    tracing::info!(user_id = %user.id, revoked, "account deleted");
    Ok(())
}

fn send_verification(state: &AppState, user: &User, callback_url: Option<&str>) {
    let token = verification::issue(&state.signer, user.id, &user.email, OffsetDateTime::now_utc());
    let url = verification::verification_url(state.config.base_url.as_str(), &token, callback_url);
    mailer::dispatch(state.mailer.clone(), mailer::verify_email(&user.email, &user.name, &url));
}

#[cfg(test)]
#[path = "email_password_test.rs"]
mod tests;
