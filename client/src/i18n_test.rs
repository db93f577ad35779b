use super::*;

// =============================================================================
// Locale
// =============================================================================

#[test]
fn parse_accepts_only_supported_codes() {
    assert_eq!(Locale::parse("en"), Some(Locale::En));
    assert_eq!(Locale::parse("fr"), Some(Locale::Fr));
    assert_eq!(Locale::parse("de"), None);
    assert_eq!(Locale::parse("EN"), None);
}

#[test]
fn negotiate_defaults_to_english() {
    assert_eq!(Locale::negotiate(None), Locale::En);
    assert_eq!(Locale::negotiate(Some("")), Locale::En);
    assert_eq!(Locale::negotiate(Some("de-DE,ja")), Locale::En);
}

#[test]
fn negotiate_matches_primary_subtag() {
    assert_eq!(Locale::negotiate(Some("fr-CA")), Locale::Fr);
}

#[test]
fn negotiate_respects_q_weights() {
    assert_eq!(Locale::negotiate(Some("en;q=0.5,fr;q=0.9")), Locale::Fr);
    assert_eq!(Locale::negotiate(Some("fr;q=0,en")), Locale::En);
}

#[test]
fn negotiate_skips_unsupported_preferences() {
    assert_eq!(Locale::negotiate(Some("de,fr;q=0.8,en;q=0.7")), Locale::Fr);
}

// =============================================================================
// Route
// =============================================================================

#[test]
fn localized_paths() {
    assert_eq!(Route::Home.localized(Locale::En), "/en");
    assert_eq!(Route::Login.localized(Locale::Fr), "/fr/login");
    assert_eq!(Route::ForgotPassword.localized(Locale::En), "/en/forgot-password");
}

#[test]
fn from_path_ignores_trailing_slash() {
    assert_eq!(Route::from_path("/dashboard/"), Some(Route::Dashboard));
    assert_eq!(Route::from_path(""), Some(Route::Home));
    assert_eq!(Route::from_path("/nope"), None);
}

#[test]
fn only_dashboard_is_protected() {
    let protected: Vec<Route> = Route::ALL.into_iter().filter(|r| r.is_protected()).collect();
    assert_eq!(protected, vec![Route::Dashboard]);
}

// =============================================================================
// match_path
// =============================================================================

#[test]
fn match_path_localized() {
    assert_eq!(match_path("/fr/dashboard"), PathMatch::Localized(Locale::Fr, Route::Dashboard));
    assert_eq!(match_path("/en"), PathMatch::Localized(Locale::En, Route::Home));
    assert_eq!(match_path("/en/"), PathMatch::Localized(Locale::En, Route::Home));
}

#[test]
fn match_path_unprefixed() {
    assert_eq!(match_path("/login"), PathMatch::Unprefixed(Route::Login));
    assert_eq!(match_path("/"), PathMatch::Unprefixed(Route::Home));
}

#[test]
fn match_path_unknown() {
    assert_eq!(match_path("/de/login"), PathMatch::Unknown);
    assert_eq!(match_path("/en/settings"), PathMatch::Unknown);
    assert_eq!(match_path("/en/login/extra"), PathMatch::Unknown);
}
