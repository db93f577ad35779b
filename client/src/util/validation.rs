//! Credential form validation primitives.
//!
//! SYSTEM CONTEXT
//! ==============
//! Login and signup pages validate locally before any network call. Each
//! field reports its first failing rule as a translation key from
//! `i18n::keys`; rendering the translated text is the view's job.

#[cfg(test)]
#[path = "validation_test.rs"]
mod validation_test;

use std::collections::BTreeMap;

/// Form fields that can carry a validation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    Password,
    ConfirmPassword,
}

/// Per-field message keys. At most one key per field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, &'static str>);

impl FieldErrors {
    /// Record `key` unless the field already failed an earlier rule.
    pub fn reject(&mut self, field: Field, key: &'static str) {
        self.0.entry(field).or_insert(key);
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }
}

/// Outcome of a failed form submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// Local validation failed; nothing was sent.
    #[error("form has invalid fields")]
    Validation(FieldErrors),
    /// The session authority refused. `message` is the server's text when it
    /// sent one, otherwise the view shows the translation of `key`.
    #[error("{}", message.as_deref().unwrap_or(*key))]
    Auth { key: &'static str, message: Option<String> },
}

impl FormError {
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Auth { .. } => None,
        }
    }
}

const LOCAL_PART_SYMBOLS: &str = "._%+-'";

/// Syntactic email check: `local@label.tld` with a letters-only TLD of at
/// least two characters.
#[must_use]
pub fn is_valid_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || LOCAL_PART_SYMBOLS.contains(c));
    if !local_ok {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));
    tld_ok
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}
