//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the parsed config, the signing key, and the backends every auth
//! flow needs. Backends are trait objects so tests can run the real router
//! against in-memory stores (see `test_helpers`).

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::rate_limit::RateLimiter;
use crate::rpc::ProcedureRouter;
use crate::rpc::routers;
use crate::services::mailer::{Mailer, ResendMailer};
use crate::services::oauth::{GoogleOAuth, IdentityProvider};
use crate::services::session::{PgSessionStore, SessionStore};
use crate::services::signing::Signer;
use crate::services::users::{CredentialStore, PgCredentialStore};

// =============================================================================
// BACKENDS
// =============================================================================

/// External collaborators of the auth flows.
#[derive(Clone)]
pub struct Backends {
    pub sessions: Arc<dyn SessionStore>,
    pub users: Arc<dyn CredentialStore>,
    pub mailer: Arc<dyn Mailer>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Backends {
    /// Postgres stores, Resend mail, and Google as the identity provider.
    #[must_use]
    pub fn production(pool: &PgPool, config: &AppConfig) -> Self {
        Self {
            sessions: Arc::new(PgSessionStore::new(pool.clone())),
            users: Arc::new(PgCredentialStore::new(pool.clone())),
            mailer: Arc::new(ResendMailer::new(&config.mail.resend_api_key, &config.mail.from)),
            identity: Arc::new(GoogleOAuth::new(config.google.clone())),
        }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Clone is required by Axum; every field is Arc-wrapped or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub signer: Arc<Signer>,
    pub sessions: Arc<dyn SessionStore>,
    pub users: Arc<dyn CredentialStore>,
    pub mailer: Arc<dyn Mailer>,
    pub identity: Arc<dyn IdentityProvider>,
    pub procedures: Arc<ProcedureRouter>,
    /// Sign-in attempt limiter, keyed by peer address and normalized email.
    pub rate_limiter: RateLimiter,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, backends: Backends) -> Self {
        let signer = Signer::new(&config.auth_secret);
        let rate_limiter = RateLimiter::new(config.rate_limit);
        Self {
            config: Arc::new(config),
            signer: Arc::new(signer),
            sessions: backends.sessions,
            users: backends.users,
            mailer: backends.mailer,
            identity: backends.identity,
            procedures: Arc::new(routers::app_router()),
            rate_limiter,
        }
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
