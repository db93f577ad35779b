//! Process configuration parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! Startup builds one `AppConfig` before touching the database. Any missing
//! or malformed required value aborts the process, so the rest of the server
//! can treat every field as present and well-formed.

use std::time::Duration;

use url::Url;

use crate::rate_limit::{
    DEFAULT_PER_CLIENT_LIMIT, DEFAULT_PER_CLIENT_WINDOW_SECS, DEFAULT_PER_KEY_LIMIT, DEFAULT_PER_KEY_WINDOW_SECS,
    RateLimitConfig,
};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RESEND_FROM: &str = "onboarding@resend.dev";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_WEB_DIR: &str = "web";
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Deployment mode, mirrored from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Development,
    Test,
    Production,
}

impl RuntimeMode {
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub resend_api_key: String,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Session-signing secret. Also keys email verification tokens.
    pub auth_secret: String,
    /// Public base URL of the deployment, without a trailing slash.
    pub base_url: Url,
    pub google: GoogleConfig,
    pub mail: MailConfig,
    pub mode: RuntimeMode,
    pub port: u16,
    pub cookie_secure: bool,
    pub cors_origin: String,
    pub web_dir: String,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Build typed config from process environment variables.
    ///
    /// Required:
    /// - `DATABASE_URL`, `AUTH_SECRET`, `AUTH_URL`
    /// - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`
    /// - `RESEND_API_KEY`
    ///
    /// Optional:
    /// - `APP_ENV`: `development` (default), `test` or `production`
    /// - `PORT`: default 3000
    /// - `RESEND_FROM`: default `onboarding@resend.dev`
    /// - `COOKIE_SECURE`: defaults to `AUTH_URL` being https
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `CORS_ORIGIN`: defaults to the origin of `AUTH_URL`
    /// - `WEB_DIR`: directory holding the SPA shell, default `web`
    /// - `RATE_LIMIT_SIGN_IN`, `RATE_LIMIT_SIGN_IN_WINDOW_SECS`: per-email
    ///   sign-in attempts, default 5 per 60s
    /// - `RATE_LIMIT_CLIENT`, `RATE_LIMIT_CLIENT_WINDOW_SECS`: per-address
    ///   sign-in attempts, default 30 per 60s
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = required(&lookup, "DATABASE_URL")?;
        if !(database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")) {
            return Err(ConfigError::Invalid {
                key: "DATABASE_URL",
                reason: "expected a postgres:// connection string".into(),
            });
        }

        let auth_secret = required(&lookup, "AUTH_SECRET")?;
        if auth_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "AUTH_SECRET",
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }

        let base_url = parse_base_url(&required(&lookup, "AUTH_URL")?)?;

        let google = GoogleConfig {
            client_id: required(&lookup, "GOOGLE_CLIENT_ID")?,
            client_secret: required(&lookup, "GOOGLE_CLIENT_SECRET")?,
        };
        let mail = MailConfig {
            resend_api_key: required(&lookup, "RESEND_API_KEY")?,
            from: optional(&lookup, "RESEND_FROM").unwrap_or_else(|| DEFAULT_RESEND_FROM.to_owned()),
        };

        let mode = parse_mode(optional(&lookup, "APP_ENV").as_deref())?;
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;

        let cookie_secure = match optional(&lookup, "COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "COOKIE_SECURE",
                reason: format!("expected a boolean, got '{raw}'"),
            })?,
            None => base_url.scheme() == "https",
        };

        let cors_origin = optional(&lookup, "CORS_ORIGIN").unwrap_or_else(|| base_url.origin().ascii_serialization());
        let web_dir = optional(&lookup, "WEB_DIR").unwrap_or_else(|| DEFAULT_WEB_DIR.to_owned());

        let rate_limit = RateLimitConfig {
            per_key_limit: positive(&lookup, "RATE_LIMIT_SIGN_IN", DEFAULT_PER_KEY_LIMIT)?,
            per_key_window: Duration::from_secs(positive(
                &lookup,
                "RATE_LIMIT_SIGN_IN_WINDOW_SECS",
                DEFAULT_PER_KEY_WINDOW_SECS,
            )?),
            per_client_limit: positive(&lookup, "RATE_LIMIT_CLIENT", DEFAULT_PER_CLIENT_LIMIT)?,
            per_client_window: Duration::from_secs(positive(
                &lookup,
                "RATE_LIMIT_CLIENT_WINDOW_SECS",
                DEFAULT_PER_CLIENT_WINDOW_SECS,
            )?),
        };

        Ok(Self {
            database_url,
            db_max_connections,
            auth_secret,
            base_url,
            google,
            mail,
            mode,
            port,
            cookie_secure,
            cors_origin,
            web_dir,
            rate_limit,
        })
    }

    /// Absolute URL for a server path (`path` must start with `/`).
    #[must_use]
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Redirect URI registered with Google.
    #[must_use]
    pub fn google_redirect_uri(&self) -> String {
        self.absolute_url("/api/auth/callback/google")
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or(ConfigError::Missing(key))
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match optional(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, reason: format!("cannot parse '{raw}'") }),
        None => Ok(default),
    }
}

fn positive<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Default + PartialEq,
{
    let value = parse_or(lookup, key, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid { key, reason: "must be greater than zero".into() });
    }
    Ok(value)
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_mode(raw: Option<&str>) -> Result<RuntimeMode, ConfigError> {
    match raw.unwrap_or("development") {
        "development" => Ok(RuntimeMode::Development),
        "test" => Ok(RuntimeMode::Test),
        "production" => Ok(RuntimeMode::Production),
        other => Err(ConfigError::Invalid {
            key: "APP_ENV",
            reason: format!("expected development, test or production, got '{other}'"),
        }),
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid { key: "AUTH_URL", reason: e.to_string() })?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::Invalid {
            key: "AUTH_URL",
            reason: "expected an absolute http(s) URL".into(),
        });
    }
    Ok(url)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
