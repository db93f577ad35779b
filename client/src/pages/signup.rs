//! Account creation form.

#[cfg(test)]
#[path = "signup_test.rs"]
mod signup_test;

use std::sync::Arc;

use crate::i18n::{Route, keys};
use crate::navigation::Navigator;
use crate::net::api::AuthClient;
use crate::util::validation::{Field, FieldErrors, FormError, is_valid_email};

pub const NAME_MIN_CHARS: usize = 2;
pub const PASSWORD_MIN_CHARS: usize = 8;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Per-field rule check for the sign-up form. The mismatch rule runs even
/// when other fields already failed.
#[must_use]
pub fn validate_signup(input: &SignupInput) -> FieldErrors {
    let mut errors = FieldErrors::default();

    let name_len = input.name.chars().count();
    if name_len == 0 {
        errors.reject(Field::Name, keys::NAME_REQUIRED);
    } else if name_len < NAME_MIN_CHARS {
        errors.reject(Field::Name, keys::NAME_MIN_LENGTH);
    }

    if !is_valid_email(&input.email) {
        errors.reject(Field::Email, keys::EMAIL_INVALID);
    }

    let password_len = input.password.chars().count();
    if password_len == 0 {
        errors.reject(Field::Password, keys::PASSWORD_REQUIRED);
    } else if password_len < PASSWORD_MIN_CHARS {
        errors.reject(Field::Password, keys::PASSWORD_MIN_LENGTH);
    }

    if input.confirm_password.is_empty() {
        errors.reject(Field::ConfirmPassword, keys::CONFIRM_PASSWORD_REQUIRED);
    }
    if input.password != input.confirm_password {
        errors.reject(Field::ConfirmPassword, keys::PASSWORD_MISMATCH);
    }

    errors
}

pub struct SignupForm {
    client: Arc<dyn AuthClient>,
    navigator: Arc<dyn Navigator>,
}

impl SignupForm {
    #[must_use]
    pub fn new(client: Arc<dyn AuthClient>, navigator: Arc<dyn Navigator>) -> Self {
        Self { client, navigator }
    }

    /// # Errors
    ///
    /// `Validation` before any network call, or `Auth` when the authority
    /// refuses the new account.
    pub async fn submit(&self, input: &SignupInput) -> Result<(), FormError> {
        let errors = validate_signup(input);
        if !errors.is_empty() {
            return Err(FormError::Validation(errors));
        }

        match self.client.sign_up_email(&input.name, &input.email, &input.password).await {
            Ok(_) => {
                self.navigator.replace(Route::Dashboard);
                Ok(())
            }
            Err(e) => {
                tracing::debug!(error = %e, "sign-up rejected");
                Err(FormError::Auth { key: keys::SIGN_UP_ERROR, message: e.server_message().map(str::to_owned) })
            }
        }
    }

    /// # Errors
    ///
    /// `Auth` with `auth.signIn.errorGoogle` when no authorization URL came back.
    pub async fn sign_in_with_google(&self) -> Result<(), FormError> {
        super::sign_in_with_google(self.client.as_ref(), self.navigator.as_ref()).await
    }
}
