//! HTTP client for the session authority.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns `Result<_, ClientError>`. Callers that must swallow
//! errors (the provider's `check_auth` and `logout`) go through `classify`
//! instead of matching on variants: a 401 means "no valid session"
//! (`Anonymous`), everything else means the authority could not be
//! consulted (`Fatal`).

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use super::types::{ApiErrorBody, SessionData, SignInResponse, SignUpResponse, SocialSignInResponse};

const GET_SESSION_PATH: &str = "/api/auth/get-session";
const SIGN_IN_EMAIL_PATH: &str = "/api/auth/sign-in/email";
const SIGN_UP_EMAIL_PATH: &str = "/api/auth/sign-up/email";
const SIGN_IN_SOCIAL_PATH: &str = "/api/auth/sign-in/social";
const SIGN_OUT_PATH: &str = "/api/auth/sign-out";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("{status} {code}: {message}")]
    Api { status: u16, code: String, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided message, if the server sent a non-empty one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } if !message.is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Outcome of the client-side degrade policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Degrade {
    /// The authority answered: there is no valid session.
    Anonymous,
    /// The authority could not be consulted.
    Fatal,
}

#[must_use]
pub fn classify(err: &ClientError) -> Degrade {
    match err {
        ClientError::Api { status: 401, .. } => Degrade::Anonymous,
        _ => Degrade::Fatal,
    }
}

/// Operations the UI needs from the session authority.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// `Ok(None)` when the request carries no valid session.
    async fn get_session(&self) -> Result<Option<SessionData>, ClientError>;

    async fn sign_in_email(&self, email: &str, password: &str) -> Result<SignInResponse, ClientError>;

    async fn sign_up_email(&self, name: &str, email: &str, password: &str) -> Result<SignUpResponse, ClientError>;

    async fn sign_in_social(&self, provider: &str, callback_url: &str) -> Result<SocialSignInResponse, ClientError>;

    async fn sign_out(&self) -> Result<(), ClientError>;
}

/// Reqwest-backed client. The cookie store keeps the session cookie between
/// calls, the way a browser would.
pub struct HttpAuthClient {
    base: Url,
    http: reqwest::Client,
}

impl HttpAuthClient {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::Transport(format!("invalid base url: {e}")))?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self { base, http })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        read_json(resp).await
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(api_error(status, &body));
    }
    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Build an `Api` error from a non-success response. Bodies that are not
/// the JSON error shape fall back to the status reason.
fn api_error(status: StatusCode, body: &str) -> ClientError {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
    let fallback_code = status
        .canonical_reason()
        .unwrap_or("ERROR")
        .to_ascii_uppercase()
        .replace(' ', "_");
    match parsed {
        Some(err) => ClientError::Api { status: status.as_u16(), code: err.code, message: err.message },
        None => ClientError::Api { status: status.as_u16(), code: fallback_code, message: String::new() },
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn get_session(&self) -> Result<Option<SessionData>, ClientError> {
        let resp = self
            .http
            .get(self.endpoint(GET_SESSION_PATH)?)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        read_json::<Option<SessionData>>(resp).await
    }

    async fn sign_in_email(&self, email: &str, password: &str) -> Result<SignInResponse, ClientError> {
        self.post_json(SIGN_IN_EMAIL_PATH, &json!({ "email": email, "password": password }))
            .await
    }

    async fn sign_up_email(&self, name: &str, email: &str, password: &str) -> Result<SignUpResponse, ClientError> {
        self.post_json(SIGN_UP_EMAIL_PATH, &json!({ "name": name, "email": email, "password": password }))
            .await
    }

    async fn sign_in_social(&self, provider: &str, callback_url: &str) -> Result<SocialSignInResponse, ClientError> {
        self.post_json(SIGN_IN_SOCIAL_PATH, &json!({ "provider": provider, "callbackURL": callback_url }))
            .await
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        let _: serde_json::Value = self.post_json(SIGN_OUT_PATH, &json!({})).await?;
        Ok(())
    }
}
