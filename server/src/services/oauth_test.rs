use super::*;

// =============================================================================
// build_authorize_url
// =============================================================================

#[test]
fn authorize_url_starts_with_google() {
    let url = build_authorize_url("cid", "st", "http://localhost:3000/api/auth/callback/google");
    assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
}

#[test]
fn authorize_url_carries_client_state_and_code_flow() {
    let url = build_authorize_url("my_client_id", "csrf_token_abc", "http://localhost/cb");
    assert!(url.contains("client_id=my_client_id"));
    assert!(url.contains("state=csrf_token_abc"));
    assert!(url.contains("response_type=code"));
}

#[test]
fn authorize_url_encodes_redirect_and_scope() {
    let url = build_authorize_url("cid", "st", "http://localhost:3000/api/auth/callback/google");
    assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fcallback%2Fgoogle"));
    assert!(url.contains("scope=openid+email+profile"));
}

// =============================================================================
// GoogleUserInfo
// =============================================================================

#[test]
fn userinfo_deserializes_and_normalizes() {
    let json = r#"{"sub":"1234","email":"Alice@Gmail.com","email_verified":true,"name":"Alice A","picture":"x"}"#;
    let info: GoogleUserInfo = serde_json::from_str(json).unwrap();
    let profile = info.into_profile().unwrap();
    assert_eq!(profile.google_id, "1234");
    assert_eq!(profile.email, "alice@gmail.com");
    assert_eq!(profile.name, "Alice A");
    assert!(profile.email_verified);
}

#[test]
fn userinfo_without_name_uses_email_local_part() {
    let json = r#"{"sub":"1","email":"bob@example.com"}"#;
    let info: GoogleUserInfo = serde_json::from_str(json).unwrap();
    let profile = info.into_profile().unwrap();
    assert_eq!(profile.name, "bob");
    assert!(!profile.email_verified);
}

#[test]
fn userinfo_without_email_is_refused() {
    let json = r#"{"sub":"1","name":"No Mail"}"#;
    let info: GoogleUserInfo = serde_json::from_str(json).unwrap();
    assert!(matches!(info.into_profile(), Err(OAuthError::Profile(_))));
}

// =============================================================================
// OAuthError display
// =============================================================================

#[test]
fn oauth_error_display() {
    let msg = OAuthError::TokenExchange("timeout".into()).to_string();
    assert!(msg.contains("token exchange"));
    assert!(msg.contains("timeout"));
    assert!(OAuthError::GoogleApi("403".into()).to_string().contains("google api"));
}
