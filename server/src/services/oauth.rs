//! Google OAuth service: authorization URL, code exchange, profile fetch.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::users::{GoogleProfile, normalize_email};
use crate::config::GoogleConfig;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const GOOGLE_SCOPES: &str = "openid email profile";

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("google token exchange failed: {0}")]
    TokenExchange(String),
    #[error("google api error: {0}")]
    GoogleApi(String),
    #[error("google profile unusable: {0}")]
    Profile(String),
}

/// Identity provider seam so the callback route can be exercised without
/// network access.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String;

    async fn profile_from_code(&self, code: &str, redirect_uri: &str) -> Result<GoogleProfile, OAuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
}

impl GoogleUserInfo {
    /// Normalize into a storable profile. Accounts without an email are
    /// refused; a missing name falls back to the email local part.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Profile` if the email is absent or malformed.
    pub fn into_profile(self) -> Result<GoogleProfile, OAuthError> {
        let raw_email = self
            .email
            .ok_or_else(|| OAuthError::Profile("no email on account".into()))?;
        let email = normalize_email(&raw_email).ok_or_else(|| OAuthError::Profile(format!("bad email {raw_email}")))?;
        let name = self
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or("user").to_owned());
        Ok(GoogleProfile { google_id: self.sub, email, name, email_verified: self.email_verified })
    }
}

pub struct GoogleOAuth {
    config: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleOAuth {
    #[must_use]
    pub fn new(config: GoogleConfig) -> Self {
        Self { config, http: reqwest::Client::new() }
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, OAuthError> {
        let resp = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;
        if !status.is_success() {
            return Err(OAuthError::TokenExchange(format!("{status}: {body}")));
        }
        let token_resp: TokenResponse =
            serde_json::from_str(&body).map_err(|_| OAuthError::TokenExchange(format!("unexpected response: {body}")))?;
        Ok(token_resp.access_token)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<GoogleUserInfo, OAuthError> {
        let resp = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::GoogleApi(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(OAuthError::GoogleApi(format!("{status}: {body}")));
        }

        resp.json::<GoogleUserInfo>()
            .await
            .map_err(|e| OAuthError::GoogleApi(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuth {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String {
        build_authorize_url(&self.config.client_id, state, redirect_uri)
    }

    async fn profile_from_code(&self, code: &str, redirect_uri: &str) -> Result<GoogleProfile, OAuthError> {
        let access_token = self.exchange_code(code, redirect_uri).await?;
        self.fetch_user(&access_token).await?.into_profile()
    }
}

#[must_use]
pub fn build_authorize_url(client_id: &str, state: &str, redirect_uri: &str) -> String {
    let params = [
        ("client_id", client_id),
        ("redirect_uri", redirect_uri),
        ("response_type", "code"),
        ("scope", GOOGLE_SCOPES),
        ("state", state),
        ("prompt", "select_account"),
    ];
    match Url::parse_with_params(GOOGLE_AUTHORIZE_URL, &params) {
        Ok(url) => url.into(),
        Err(_) => GOOGLE_AUTHORIZE_URL.to_owned(),
    }
}

#[cfg(test)]
#[path = "oauth_test.rs"]
mod tests;
