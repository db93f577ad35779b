//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Published by the `AuthProvider` through a watch channel and consumed by
//! route guards and user-aware views.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::net::types::User;

/// Current user plus loading status. A fresh state is loading with no user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self { user: None, loading: true }
    }
}

impl AuthState {
    /// A settled state: the check finished with `user` (or without one).
    #[must_use]
    pub fn settled(user: Option<User>) -> Self {
        Self { user, loading: false }
    }

    /// True iff a user was resolved from a valid session.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
