//! Per-request procedure context.
//!
//! `build_context` runs once per remote call. It never fails: any problem
//! resolving the caller leaves `user` empty, and the authorization gate is
//! the only place that turns an empty user into an error.

use axum::http::HeaderMap;

use crate::services::session::{self, Degrade, SessionStore};
use crate::services::signing::Signer;
use crate::services::users::{CredentialStore, User};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub user: Option<User>,
}

impl Context {
    #[must_use]
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    #[must_use]
    pub fn for_user(user: User) -> Self {
        Self { user: Some(user) }
    }
}

/// Context after the gate: the user is guaranteed present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthedContext {
    pub user: User,
}

impl TryFrom<Context> for AuthedContext {
    type Error = ();

    fn try_from(ctx: Context) -> Result<Self, Self::Error> {
        ctx.user.map(|user| Self { user }).ok_or(())
    }
}

/// Derive the caller identity from request headers.
pub async fn build_context(
    headers: &HeaderMap,
    signer: &Signer,
    sessions: &dyn SessionStore,
    users: &dyn CredentialStore,
) -> Context {
    match session::resolve_user(headers, signer, sessions, users).await {
        Ok((_, user)) => Context::for_user(user),
        Err(e) => {
            match session::classify(&e) {
                Degrade::Anonymous => tracing::debug!(reason = %e, "procedure context has no user"),
                Degrade::Fatal => tracing::error!(error = %e, "session resolution failed; treating caller as anonymous"),
            }
            Context::anonymous()
        }
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
