//! Route guard for protected pages.
//!
//! A three-state machine derived from `AuthState`. The only transition with
//! a side effect is `Loading -> Unauthenticated`, which pushes the sign-in
//! page. Content renders only while `Authenticated`.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::i18n::Route;
use crate::navigation::Navigator;
use crate::state::auth::AuthState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Authenticated,
    Unauthenticated,
}

impl GuardState {
    #[must_use]
    pub fn from_auth(auth: &AuthState) -> Self {
        if auth.loading {
            Self::Loading
        } else if auth.is_authenticated() {
            Self::Authenticated
        } else {
            Self::Unauthenticated
        }
    }
}

/// What the guarded page should show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Render {
    Nothing,
    Content,
}

pub struct RouteGuard {
    state: GuardState,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { state: GuardState::Loading, navigator }
    }

    #[must_use]
    pub fn state(&self) -> GuardState {
        self.state
    }

    #[must_use]
    pub fn render(&self) -> Render {
        match self.state {
            GuardState::Authenticated => Render::Content,
            GuardState::Loading | GuardState::Unauthenticated => Render::Nothing,
        }
    }

    /// Feed a new auth snapshot through the state machine.
    pub fn observe(&mut self, auth: &AuthState) -> Render {
        let next = GuardState::from_auth(auth);
        if self.state == GuardState::Loading && next == GuardState::Unauthenticated {
            tracing::debug!("guard: unauthenticated, redirecting to sign-in");
            self.navigator.push(Route::Login);
        }
        self.state = next;
        self.render()
    }
}

/// Drive a guard from a provider subscription until the provider goes away.
/// Resolves to the guard's final state.
pub fn watch_guard(mut updates: watch::Receiver<AuthState>, navigator: Arc<dyn Navigator>) -> JoinHandle<GuardState> {
    tokio::spawn(async move {
        let mut guard = RouteGuard::new(navigator);
        let initial = updates.borrow_and_update().clone();
        guard.observe(&initial);
        while updates.changed().await.is_ok() {
            let current = updates.borrow_and_update().clone();
            guard.observe(&current);
        }
        guard.state()
    })
}
