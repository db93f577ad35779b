//! Sign-in form: email and password, plus Google.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use std::sync::Arc;

use crate::i18n::{Route, keys};
use crate::navigation::Navigator;
use crate::net::api::AuthClient;
use crate::provider::AuthProvider;
use crate::util::validation::{Field, FieldErrors, FormError, is_valid_email};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Per-field rule check for the sign-in form.
#[must_use]
pub fn validate_login(input: &LoginInput) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if !is_valid_email(&input.email) {
        errors.reject(Field::Email, keys::EMAIL_INVALID);
    }
    if input.password.is_empty() {
        errors.reject(Field::Password, keys::PASSWORD_REQUIRED);
    }
    errors
}

pub struct LoginForm {
    client: Arc<dyn AuthClient>,
    navigator: Arc<dyn Navigator>,
    provider: Option<Arc<AuthProvider>>,
}

impl LoginForm {
    #[must_use]
    pub fn new(client: Arc<dyn AuthClient>, navigator: Arc<dyn Navigator>) -> Self {
        Self { client, navigator, provider: None }
    }

    /// Re-check this provider's session after a successful sign-in.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<AuthProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Validate, sign in, and go to the dashboard.
    ///
    /// # Errors
    ///
    /// `Validation` without touching the network when any field fails, or
    /// `Auth` carrying the server's message when the authority refuses.
    pub async fn submit(&self, input: &LoginInput) -> Result<(), FormError> {
        let errors = validate_login(input);
        if !errors.is_empty() {
            return Err(FormError::Validation(errors));
        }

        if let Err(e) = self.client.sign_in_email(&input.email, &input.password).await {
            tracing::debug!(error = %e, "sign-in rejected");
            return Err(FormError::Auth { key: keys::SIGN_IN_ERROR, message: e.server_message().map(str::to_owned) });
        }

        if let Some(provider) = &self.provider {
            provider.check_auth().await;
        }
        self.navigator.replace(Route::Dashboard);
        Ok(())
    }

    /// # Errors
    ///
    /// `Auth` with `auth.signIn.errorGoogle` when no authorization URL came back.
    pub async fn sign_in_with_google(&self) -> Result<(), FormError> {
        super::sign_in_with_google(self.client.as_ref(), self.navigator.as_ref()).await
    }
}
