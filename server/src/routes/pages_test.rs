use super::*;

use crate::routes::app;
use crate::state::test_helpers::{get_request, send, test_app_state};

#[tokio::test]
async fn unprefixed_page_redirects_to_negotiated_locale() {
    let router = app(test_app_state());

    let res = send(&router, get_request("/login", &[("accept-language", "fr-CA,fr;q=0.9,en;q=0.5")])).await;
    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.location(), Some("/fr/login"));

    let res = send(&router, get_request("/", &[])).await;
    assert_eq!(res.location(), Some("/en"));
}

#[tokio::test]
async fn redirect_keeps_query_string() {
    let router = app(test_app_state());
    let res = send(&router, get_request("/login?error=access_denied", &[])).await;
    assert_eq!(res.location(), Some("/en/login?error=access_denied"));
}

#[tokio::test]
async fn localized_page_serves_shell() {
    let router = app(test_app_state());
    let res = send(&router, get_request("/en/dashboard", &[])).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&res.body).contains("<div id=\"root\">"));
}

#[tokio::test]
async fn unknown_locale_or_page_is_404() {
    let router = app(test_app_state());
    for path in ["/de/login", "/en/nowhere", "/api/auth/unknown"] {
        let res = send(&router, get_request(path, &[])).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn missing_shell_is_500() {
    assert_eq!(serve_shell("/nonexistent-web-dir").await.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
