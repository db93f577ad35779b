//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns its form state machine: validate locally, delegate to the
//! session authority through `AuthClient`, then navigate through
//! `Navigator`. Rendering is left to the host.

pub mod login;
pub mod signup;

use crate::i18n::{Route, keys};
use crate::navigation::Navigator;
use crate::net::api::AuthClient;
use crate::util::validation::FormError;

pub const GOOGLE_PROVIDER: &str = "google";

/// Ask the authority for a Google authorization URL and leave the app.
///
/// # Errors
///
/// `FormError::Auth` with `auth.signIn.errorGoogle` when the authority
/// refuses or cannot be reached.
pub(crate) async fn sign_in_with_google(client: &dyn AuthClient, navigator: &dyn Navigator) -> Result<(), FormError> {
    match client.sign_in_social(GOOGLE_PROVIDER, Route::Dashboard.path()).await {
        Ok(response) => {
            navigator.redirect_external(&response.url);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "google sign-in failed");
            Err(FormError::Auth { key: keys::SIGN_IN_ERROR_GOOGLE, message: None })
        }
    }
}
