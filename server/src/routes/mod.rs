//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the auth API under `/api/auth`, the procedure
//! layer under `/trpc`, static assets under `/assets`, and localized SPA
//! pages as the fallback.

pub mod auth;
pub mod pages;
pub mod rpc;

use std::path::Path;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

fn cors(state: &AppState) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true);
    match HeaderValue::from_str(&state.config.cors_origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(origin = %state.config.cors_origin, error = %e, "CORS origin unusable; cross-origin requests disabled");
            layer
        }
    }
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up/email", post(auth::sign_up_email))
        .route("/sign-in/email", post(auth::sign_in_email))
        .route("/sign-in/social", post(auth::sign_in_social))
        .route("/callback/google", get(auth::google_callback))
        .route("/get-session", get(auth::get_session))
        .route("/sign-out", post(auth::sign_out))
        .route("/delete-user", post(auth::delete_user))
        .route("/verify-email", get(auth::verify_email))
        .route("/send-verification-email", post(auth::send_verification_email))
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let assets = ServeDir::new(Path::new(&state.config.web_dir).join("assets"));

    Router::new()
        .nest("/api/auth", auth_routes())
        .route("/trpc/{path}", get(rpc::query).post(rpc::mutation))
        .route("/healthz", get(healthz))
        .nest_service("/assets", assets)
        .fallback(pages::page)
        .layer(cors(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
