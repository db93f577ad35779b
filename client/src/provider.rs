//! Session context provider.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `AuthProvider` sits at the root of the UI tree and is handed down
//! through a `Scope`. It caches the current user, publishes every change on
//! a `watch` channel, and owns sign-out.
//!
//! DESIGN
//! ======
//! State lives in a shared `watch::Sender`. `mount()` spawns the initial
//! `check_auth` as a task that holds only the shared inner half, so dropping
//! the provider can abort it and nothing writes into state after teardown.
//!
//! Errors never escape: `check_auth` degrades every failure to "no user",
//! and `logout` consults `net::api::classify` to decide whether local state
//! should be cleared.

#[cfg(test)]
#[path = "provider_test.rs"]
mod provider_test;

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::i18n::Route;
use crate::navigation::Navigator;
use crate::net::api::{AuthClient, Degrade, classify};
use crate::state::auth::AuthState;

struct Inner {
    client: Arc<dyn AuthClient>,
    state: watch::Sender<AuthState>,
}

impl Inner {
    async fn check_auth(&self) {
        self.state.send_modify(|s| s.loading = true);

        let user = match self.client.get_session().await {
            Ok(Some(data)) => Some(data.user),
            Ok(None) => None,
            Err(e) => {
                match classify(&e) {
                    Degrade::Anonymous => tracing::debug!(error = %e, "session check: not signed in"),
                    Degrade::Fatal => tracing::error!(error = %e, "session check failed"),
                }
                None
            }
        };

        self.state.send_replace(AuthState::settled(user));
    }
}

pub struct AuthProvider {
    inner: Arc<Inner>,
    navigator: Arc<dyn Navigator>,
    mount_task: Mutex<Option<JoinHandle<()>>>,
}

impl AuthProvider {
    #[must_use]
    pub fn new(client: Arc<dyn AuthClient>, navigator: Arc<dyn Navigator>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self { inner: Arc::new(Inner { client, state }), navigator, mount_task: Mutex::new(None) }
    }

    /// Start the initial session check in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(&self) {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.check_auth().await });
        let mut slot = self
            .mount_task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Re-check the session with the authority.
    pub async fn check_auth(&self) {
        self.inner.check_auth().await;
    }

    /// Sign out, clear the cached user, and go to the sign-in page.
    ///
    /// A rejection because the session was already gone counts as success.
    /// Any other failure is logged and leaves state untouched.
    pub async fn logout(&self) {
        match self.inner.client.sign_out().await {
            Ok(()) => {}
            Err(e) => match classify(&e) {
                Degrade::Anonymous => tracing::debug!(error = %e, "sign-out: session already invalid"),
                Degrade::Fatal => {
                    tracing::error!(error = %e, "logout failed");
                    return;
                }
            },
        }

        self.inner.state.send_replace(AuthState::settled(None));
        self.navigator.push(Route::Login);
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }
}

impl Drop for AuthProvider {
    fn drop(&mut self) {
        let slot = self
            .mount_task
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

// =============================================================================
// SCOPE
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("use_auth must be used within an AuthProvider")]
    MissingProvider,
}

/// What a component can reach from its position in the UI tree.
#[derive(Clone, Default)]
pub struct Scope {
    auth: Option<Arc<AuthProvider>>,
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_auth(mut self, provider: Arc<AuthProvider>) -> Self {
        self.auth = Some(provider);
        self
    }
}

/// Fetch the provider for this scope.
///
/// # Errors
///
/// `MissingProvider` when no provider was installed above this scope.
pub fn use_auth(scope: &Scope) -> Result<Arc<AuthProvider>, ContextError> {
    scope.auth.clone().ok_or(ContextError::MissingProvider)
}
