//! Locales and symbolic routes.
//!
//! SYSTEM CONTEXT
//! ==============
//! Shared by the client navigator (symbolic route -> localized path) and the
//! server page router (incoming path -> locale + route, or a redirect).
//! Every page path is `/{locale}{route}`; home is just `/{locale}`.

#[cfg(test)]
#[path = "i18n_test.rs"]
mod i18n_test;

/// Supported UI locales.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Locale {
    En,
    Fr,
}

impl Locale {
    pub const ALL: [Self; 2] = [Self::En, Self::Fr];
    pub const DEFAULT: Self = Self::En;

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    /// Parse an exact locale segment (`en`, `fr`).
    #[must_use]
    pub fn parse(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == segment)
    }

    /// Pick the best supported locale for an `Accept-Language` header.
    ///
    /// Entries are ranked by their `q` weight (default 1.0, ties keep header
    /// order) and matched on the primary subtag, so `fr-CA` selects `fr`.
    #[must_use]
    pub fn negotiate(accept_language: Option<&str>) -> Self {
        let Some(header) = accept_language else {
            return Self::DEFAULT;
        };

        let mut ranked: Vec<(f32, &str)> = header
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.split(';');
                let tag = parts.next()?.trim();
                if tag.is_empty() {
                    return None;
                }
                let q = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (q > 0.0).then_some((q, tag))
            })
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        ranked
            .into_iter()
            .find_map(|(_, tag)| {
                let primary = tag.split('-').next().unwrap_or(tag).to_ascii_lowercase();
                Self::parse(&primary)
            })
            .unwrap_or(Self::DEFAULT)
    }
}

/// Symbolic page routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Signup,
    Dashboard,
    ForgotPassword,
}

impl Route {
    pub const ALL: [Self; 5] = [Self::Home, Self::Login, Self::Signup, Self::Dashboard, Self::ForgotPassword];

    /// Unlocalized path.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::Dashboard => "/dashboard",
            Self::ForgotPassword => "/forgot-password",
        }
    }

    /// Pages behind the route guard.
    #[must_use]
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Dashboard)
    }

    /// Match an unlocalized path. A trailing slash is ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL.into_iter().find(|r| r.path() == normalized)
    }

    #[must_use]
    pub fn localized(self, locale: Locale) -> String {
        match self {
            Self::Home => format!("/{}", locale.code()),
            other => format!("/{}{}", locale.code(), other.path()),
        }
    }
}

/// Classification of an incoming page path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathMatch {
    /// `/{locale}{route}` with a supported locale and a known route.
    Localized(Locale, Route),
    /// A known route without a locale prefix; should be redirected.
    Unprefixed(Route),
    /// Anything else.
    Unknown,
}

#[must_use]
pub fn match_path(path: &str) -> PathMatch {
    if let Some(route) = Route::from_path(path) {
        return PathMatch::Unprefixed(route);
    }

    let rest = path.strip_prefix('/').unwrap_or(path);
    let (segment, tail) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };
    match (Locale::parse(segment), Route::from_path(tail)) {
        (Some(locale), Some(route)) => PathMatch::Localized(locale, route),
        _ => PathMatch::Unknown,
    }
}

/// Translation keys referenced from Rust code.
pub mod keys {
    pub const EMAIL_INVALID: &str = "formValidation.emailInvalid";
    pub const PASSWORD_REQUIRED: &str = "formValidation.passwordRequired";
    pub const PASSWORD_MIN_LENGTH: &str = "formValidation.passwordMinLength";
    pub const NAME_REQUIRED: &str = "formValidation.nameRequired";
    pub const NAME_MIN_LENGTH: &str = "formValidation.nameMinLength";
    pub const CONFIRM_PASSWORD_REQUIRED: &str = "formValidation.confirmPasswordRequired";
    pub const PASSWORD_MISMATCH: &str = "formValidation.passwordMismatch";

    pub const SIGN_IN_ERROR: &str = "auth.signIn.error";
    pub const SIGN_IN_ERROR_GOOGLE: &str = "auth.signIn.errorGoogle";
    pub const SIGN_UP_ERROR: &str = "auth.signUp.error";
}
