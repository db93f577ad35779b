//! Auth routes: email/password, email verification, Google OAuth, sessions.
//!
//! ERROR HANDLING
//! ==============
//! Every failure leaves as `ApiError`, rendered as `{code, message}` with a
//! status derived from the service error. Internal failures are logged here
//! and reach the client only as `INTERNAL_SERVER_ERROR`.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::Json;
use axum::extract::{ConnectInfo, FromRef, Query, State};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{Value, json};
use time::Duration;
use time::format_description::well_known::Rfc3339;

use crate::rate_limit::UNKNOWN_CLIENT;
use crate::services::email_password::{self, AuthError, SignUpInput};
use crate::services::mailer;
use crate::services::session::{self, Degrade, SESSION_COOKIE, SESSION_TTL, Session, SessionError};
use crate::services::users::{StoreError, User};
use crate::services::verification::safe_callback;
use crate::state::AppState;

pub const OAUTH_STATE_COOKIE: &str = "starter.oauth_state";
pub const OAUTH_CALLBACK_COOKIE: &str = "starter.oauth_callback";
const OAUTH_COOKIE_TTL: Duration = Duration::minutes(10);
const GOOGLE_PROVIDER: &str = "google";
const DEFAULT_CALLBACK: &str = "/";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into(), retry_after: None }
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized")
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR", "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "code": self.code, "message": self.message }));
        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after {
            response.headers_mut().insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let code = err.code();
        match &err {
            AuthError::Validation(message) => Self::new(StatusCode::BAD_REQUEST, code, message.clone()),
            AuthError::UserAlreadyExists => Self::new(StatusCode::CONFLICT, code, "User already exists"),
            AuthError::InvalidCredentials => Self::new(StatusCode::UNAUTHORIZED, code, "Invalid email or password"),
            AuthError::EmailNotVerified => Self::new(StatusCode::FORBIDDEN, code, "Email not verified"),
            AuthError::InvalidPassword => Self::new(StatusCode::BAD_REQUEST, code, "Invalid password"),
            AuthError::RateLimited(limit) => Self {
                retry_after: Some(limit.retry_after_secs()),
                ..Self::new(StatusCode::TOO_MANY_REQUESTS, code, "Too many requests. Please try again later.")
            },
            AuthError::InvalidToken(_) => Self::new(StatusCode::BAD_REQUEST, code, "Invalid or expired token"),
            AuthError::Store(_) | AuthError::Session(_) | AuthError::Password(_) => {
                tracing::error!(error = %err, "auth request failed");
                Self::internal()
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match session::classify(&err) {
            Degrade::Anonymous => Self::unauthorized(),
            Degrade::Fatal => {
                tracing::error!(error = %err, "session resolution failed");
                Self::internal()
            }
        }
    }
}

// =============================================================================
// COOKIES
// =============================================================================

fn base_cookie(state: &AppState, name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .build()
}

fn session_cookie(state: &AppState, session: &Session) -> Cookie<'static> {
    let mut cookie = base_cookie(state, SESSION_COOKIE, state.signer.sign(&session.token));
    cookie.set_max_age(SESSION_TTL);
    cookie
}

fn expired_cookie(state: &AppState, name: &'static str) -> Cookie<'static> {
    let mut cookie = base_cookie(state, name, String::new());
    cookie.set_max_age(Duration::ZERO);
    cookie
}

fn short_lived_cookie(state: &AppState, name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = base_cookie(state, name, value);
    cookie.set_max_age(OAUTH_COOKIE_TTL);
    cookie
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Caller with a live session. Use as a handler parameter to require one.
pub struct AuthUser {
    pub session: Session,
    pub user: User,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let (session, user) = session::resolve_user(
            &parts.headers,
            &app_state.signer,
            app_state.sessions.as_ref(),
            app_state.users.as_ref(),
        )
        .await?;
        Ok(Self { session, user })
    }
}

/// Peer IP of the caller. `None` when the server was not started with
/// connect info.
pub struct ClientAddr(pub Option<IpAddr>);

impl<S> axum::extract::FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip()),
        ))
    }
}

// =============================================================================
// EMAIL / PASSWORD
// =============================================================================

#[derive(Deserialize)]
pub struct SignUpBody {
    name: String,
    email: String,
    password: String,
    #[serde(rename = "callbackURL")]
    callback_url: Option<String>,
}

/// `POST /api/auth/sign-up/email`
pub async fn sign_up_email(State(state): State<AppState>, Json(body): Json<SignUpBody>) -> Result<Json<Value>, ApiError> {
    let user = email_password::sign_up(
        &state,
        SignUpInput { name: body.name, email: body.email, password: body.password, callback_url: body.callback_url },
    )
    .await?;
    Ok(Json(json!({ "user": user })))
}

#[derive(Deserialize)]
pub struct SignInBody {
    email: String,
    password: String,
}

/// `POST /api/auth/sign-in/email`
pub async fn sign_in_email(
    State(state): State<AppState>,
    ClientAddr(addr): ClientAddr,
    jar: CookieJar,
    Json(body): Json<SignInBody>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let client = addr.map_or_else(|| UNKNOWN_CLIENT.to_owned(), |ip| ip.to_string());
    let (session, user) = email_password::sign_in(&state, &client, &body.email, &body.password).await?;
    let jar = jar.add(session_cookie(&state, &session));
    Ok((jar, Json(json!({ "user": user, "token": session.token }))))
}

/// `GET /api/auth/get-session`: the session and user, or JSON `null`.
pub async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    match session::resolve_user(&headers, &state.signer, state.sessions.as_ref(), state.users.as_ref()).await {
        Ok((session, user)) => {
            let expires_at = session.expires_at.format(&Rfc3339).map_err(|e| {
                tracing::error!(error = %e, "session expiry not formattable");
                ApiError::internal()
            })?;
            Ok(Json(json!({
                "session": { "userId": session.user_id, "expiresAt": expires_at },
                "user": user,
            })))
        }
        Err(e) => match session::classify(&e) {
            Degrade::Anonymous => Ok(Json(Value::Null)),
            Degrade::Fatal => Err(e.into()),
        },
    }
}

/// `POST /api/auth/sign-out`
pub async fn sign_out(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    state.sessions.revoke(&auth.session.token).await.map_err(|e| {
        tracing::error!(error = %e, "session revoke failed");
        ApiError::internal()
    })?;
    tracing::info!(user_id = %auth.user.id, "signed out");
    let jar = jar.add(expired_cookie(&state, SESSION_COOKIE));
    Ok((jar, Json(json!({ "success": true }))))
}

#[derive(Deserialize)]
pub struct DeleteUserBody {
    password: Option<String>,
}

/// `POST /api/auth/delete-user`: remove the caller's account, end every
/// session it holds and clear the cookie.
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
    Json(body): Json<DeleteUserBody>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    email_password::delete_account(&state, &auth.user, body.password.as_deref()).await?;
    let jar = jar.add(expired_cookie(&state, SESSION_COOKIE));
    Ok((jar, Json(json!({ "success": true, "message": "User deleted" }))))
}

// =============================================================================
// EMAIL VERIFICATION
// =============================================================================

#[derive(Deserialize)]
pub struct VerifyEmailQuery {
    token: String,
    #[serde(rename = "callbackURL")]
    callback_url: Option<String>,
}

/// `GET /api/auth/verify-email`
///
/// With a callback the browser always lands on it; failures append
/// `?error=INVALID_TOKEN`. Without one the result is JSON.
pub async fn verify_email(State(state): State<AppState>, Query(query): Query<VerifyEmailQuery>) -> Response {
    let callback = safe_callback(query.callback_url.as_deref());
    match (email_password::verify_email(&state, &query.token).await, callback) {
        (Ok(_), Some(callback)) => Redirect::temporary(callback).into_response(),
        (Ok(_), None) => Json(json!({ "status": true })).into_response(),
        (Err(e), Some(callback)) if matches!(e, AuthError::InvalidToken(_)) => {
            let sep = if callback.contains('?') { '&' } else { '?' };
            Redirect::temporary(&format!("{callback}{sep}error={}", e.code())).into_response()
        }
        (Err(e), _) => ApiError::from(e).into_response(),
    }
}

#[derive(Deserialize)]
pub struct SendVerificationBody {
    email: String,
    #[serde(rename = "callbackURL")]
    callback_url: Option<String>,
}

/// `POST /api/auth/send-verification-email`: answers the same whether or
/// not the account exists.
pub async fn send_verification_email(
    State(state): State<AppState>,
    Json(body): Json<SendVerificationBody>,
) -> Result<Json<Value>, ApiError> {
    email_password::resend_verification(&state, &body.email, body.callback_url.as_deref()).await?;
    Ok(Json(json!({ "status": true })))
}

// =============================================================================
// GOOGLE OAUTH
// =============================================================================

#[derive(Deserialize)]
pub struct SocialSignInBody {
    provider: String,
    #[serde(rename = "callbackURL")]
    callback_url: Option<String>,
}

/// `POST /api/auth/sign-in/social`: hand back Google's authorization URL.
pub async fn sign_in_social(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SocialSignInBody>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    if body.provider != GOOGLE_PROVIDER {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "PROVIDER_NOT_FOUND",
            format!("Provider not found: {}", body.provider),
        ));
    }

    let oauth_state = session::generate_token();
    let callback = safe_callback(body.callback_url.as_deref()).unwrap_or(DEFAULT_CALLBACK).to_owned();
    let url = state.identity.authorize_url(&oauth_state, &state.config.google_redirect_uri());

    let jar = jar
        .add(short_lived_cookie(&state, OAUTH_STATE_COOKIE, oauth_state))
        .add(short_lived_cookie(&state, OAUTH_CALLBACK_COOKIE, callback));
    Ok((jar, Json(json!({ "url": url, "redirect": true }))))
}

#[derive(Deserialize)]
pub struct GoogleCallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// `GET /api/auth/callback/google`: finish the flow and land on the
/// callback stored at sign-in time.
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<GoogleCallbackQuery>,
) -> Result<(CookieJar, Redirect), ApiError> {
    if let Some(error) = params.error.as_deref() {
        tracing::info!(%error, "google sign-in declined");
        let error: String = url::form_urlencoded::byte_serialize(error.as_bytes()).collect();
        return Ok((jar, Redirect::temporary(&format!("/login?error={error}"))));
    }

    let (Some(code), Some(callback_state)) = (params.code.as_deref(), params.state.as_deref()) else {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "INVALID_CALLBACK", "Missing code or state"));
    };
    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(Cookie::value).unwrap_or_default();
    if expected_state.is_empty() || expected_state != callback_state {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "INVALID_STATE", "Invalid OAuth state"));
    }
    let callback = jar
        .get(OAUTH_CALLBACK_COOKIE)
        .and_then(|c| safe_callback(Some(c.value())).map(str::to_owned))
        .unwrap_or_else(|| DEFAULT_CALLBACK.to_owned());

    let profile = state
        .identity
        .profile_from_code(code, &state.config.google_redirect_uri())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "google profile fetch failed");
            ApiError::new(StatusCode::BAD_GATEWAY, "OAUTH_FAILED", "Google sign-in failed")
        })?;

    let (user, created) = state.users.upsert_google_user(&profile).await.map_err(|e| match e {
        StoreError::AccountNotLinked => {
            tracing::warn!(email = %profile.email, "unverified google email matches an existing account");
            ApiError::new(StatusCode::UNAUTHORIZED, "ACCOUNT_NOT_LINKED", "Account not linked")
        }
        other => {
            tracing::error!(error = %other, "google user upsert failed");
            ApiError::internal()
        }
    })?;
    if created {
        mailer::dispatch(
            state.mailer.clone(),
            mailer::welcome(&user.email, &user.name, &state.config.absolute_url("/dashboard")),
        );
    }

    let session = state.sessions.create(user.id).await.map_err(|e| {
        tracing::error!(error = %e, "session creation failed");
        ApiError::internal()
    })?;
    tracing::info!(user_id = %user.id, created, "google sign-in");

    let jar = jar
        .add(session_cookie(&state, &session))
        .add(expired_cookie(&state, OAUTH_STATE_COOKIE))
        .add(expired_cookie(&state, OAUTH_CALLBACK_COOKIE));
    Ok((jar, Redirect::temporary(&callback)))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
