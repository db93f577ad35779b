//! Localized page routing.
//!
//! Page paths live under a locale prefix (`/en/login`). A known page asked
//! for without one is redirected to the locale negotiated from
//! `Accept-Language`; everything else that is not a known localized page is
//! a 404. Known pages all serve the same SPA shell.

use std::path::Path;

use axum::extract::State;
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use starter_client::i18n::{Locale, PathMatch, match_path};

use crate::state::AppState;

pub const SHELL_FILE: &str = "index.html";

/// Fallback handler for every path not claimed by the API.
pub async fn page(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    match match_path(uri.path()) {
        PathMatch::Localized(locale, route) => {
            tracing::debug!(locale = locale.code(), ?route, "serving page");
            serve_shell(&state.config.web_dir).await
        }
        PathMatch::Unprefixed(route) => {
            let accept = headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
            let mut target = route.localized(Locale::negotiate(accept));
            if let Some(query) = uri.query() {
                target.push('?');
                target.push_str(query);
            }
            Redirect::temporary(&target).into_response()
        }
        PathMatch::Unknown => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn serve_shell(web_dir: &str) -> Response {
    let path = Path::new(web_dir).join(SHELL_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "SPA shell unreadable");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
