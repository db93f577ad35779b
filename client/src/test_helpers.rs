use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::i18n::Route;
use crate::navigation::{NavRequest, Navigator};
use crate::net::api::{AuthClient, ClientError};
use crate::net::types::{SessionData, SessionInfo, SignInResponse, SignUpResponse, SocialSignInResponse, User};

pub const ALICE_PASSWORD: &str = "password123";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[must_use]
pub fn alice() -> User {
    User { id: "8c4f1e7a-0000-4000-8000-000000000001".into(), email: "alice@example.com".into(), name: "Alice".into() }
}

/// How a mocked endpoint should fail, if at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    Normal,
    Status(u16),
    Transport,
}

fn failure(reply: Reply) -> Option<ClientError> {
    match reply {
        Reply::Normal => None,
        Reply::Status(status) => Some(ClientError::Api { status, code: "ERROR".into(), message: String::new() }),
        Reply::Transport => Some(ClientError::Transport("connection refused".into())),
    }
}

/// In-memory session authority with one account (`alice()`).
pub struct MockAuthClient {
    signed_in: Mutex<Option<User>>,
    pub session_reply: Mutex<Reply>,
    pub sign_out_reply: Mutex<Reply>,
    pub sign_up_reply: Mutex<Reply>,
    pub social_reply: Mutex<Reply>,
    /// When set, `get_session` waits for a notification before answering.
    pub session_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl Default for MockAuthClient {
    fn default() -> Self {
        Self {
            signed_in: Mutex::new(None),
            session_reply: Mutex::new(Reply::Normal),
            sign_out_reply: Mutex::new(Reply::Normal),
            sign_up_reply: Mutex::new(Reply::Normal),
            social_reply: Mutex::new(Reply::Normal),
            session_gate: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockAuthClient {
    #[must_use]
    pub fn signed_in_as(user: User) -> Self {
        let client = Self::default();
        *lock(&client.signed_in) = Some(user);
        client
    }

    pub fn set(&self, slot: &Mutex<Reply>, reply: Reply) {
        *lock(slot) = reply;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    pub fn current_user(&self) -> Option<User> {
        lock(&self.signed_in).clone()
    }

    fn record(&self, call: &'static str) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl AuthClient for MockAuthClient {
    async fn get_session(&self) -> Result<Option<SessionData>, ClientError> {
        self.record("get_session");
        let gate = lock(&self.session_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = failure(*lock(&self.session_reply)) {
            return Err(err);
        }
        Ok(self.current_user().map(|user| SessionData {
            session: SessionInfo { user_id: user.id.clone(), expires_at: "2030-01-01T00:00:00Z".into() },
            user,
        }))
    }

    async fn sign_in_email(&self, email: &str, password: &str) -> Result<SignInResponse, ClientError> {
        self.record("sign_in_email");
        let account = alice();
        if email != account.email || password != ALICE_PASSWORD {
            return Err(ClientError::Api {
                status: 401,
                code: "INVALID_EMAIL_OR_PASSWORD".into(),
                message: "Invalid email or password".into(),
            });
        }
        *lock(&self.signed_in) = Some(account.clone());
        Ok(SignInResponse { user: account, token: "a".repeat(64) })
    }

    async fn sign_up_email(&self, name: &str, email: &str, _password: &str) -> Result<SignUpResponse, ClientError> {
        self.record("sign_up_email");
        if let Some(err) = failure(*lock(&self.sign_up_reply)) {
            return Err(err);
        }
        Ok(SignUpResponse { user: User { id: "new-user".into(), email: email.into(), name: name.into() } })
    }

    async fn sign_in_social(&self, provider: &str, callback_url: &str) -> Result<SocialSignInResponse, ClientError> {
        self.record("sign_in_social");
        if let Some(err) = failure(*lock(&self.social_reply)) {
            return Err(err);
        }
        Ok(SocialSignInResponse {
            url: format!("https://accounts.google.com/o/oauth2/v2/auth?provider={provider}&cb={callback_url}"),
            redirect: true,
        })
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        self.record("sign_out");
        if let Some(err) = failure(*lock(&self.sign_out_reply)) {
            return Err(err);
        }
        *lock(&self.signed_in) = None;
        Ok(())
    }
}

/// Navigator that records requests, localized as English.
#[derive(Default)]
pub struct RecordingNavigator {
    requests: Mutex<Vec<NavRequest>>,
}

impl RecordingNavigator {
    pub fn requests(&self) -> Vec<NavRequest> {
        lock(&self.requests).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, route: Route) {
        lock(&self.requests).push(NavRequest::Push(route.localized(crate::i18n::Locale::En)));
    }

    fn replace(&self, route: Route) {
        lock(&self.requests).push(NavRequest::Replace(route.localized(crate::i18n::Locale::En)));
    }

    fn redirect_external(&self, url: &str) {
        lock(&self.requests).push(NavRequest::External(url.to_owned()));
    }
}
