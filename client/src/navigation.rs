//! Symbolic, locale-aware navigation.
//!
//! Components never build paths themselves: they ask a `Navigator` to go to
//! a `Route`, and the navigator prefixes the active locale.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use tokio::sync::mpsc;

use crate::i18n::{Locale, Route};

/// A resolved navigation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavRequest {
    /// New history entry.
    Push(String),
    /// Replace the current history entry.
    Replace(String),
    /// Leave the app (e.g. an OAuth authorization URL).
    External(String),
}

pub trait Navigator: Send + Sync {
    fn push(&self, route: Route);

    fn replace(&self, route: Route);

    fn redirect_external(&self, url: &str);
}

/// Navigator that emits requests on a channel for the host shell to apply.
pub struct ChannelNavigator {
    locale: Locale,
    tx: mpsc::UnboundedSender<NavRequest>,
}

impl ChannelNavigator {
    #[must_use]
    pub fn new(locale: Locale) -> (Self, mpsc::UnboundedReceiver<NavRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { locale, tx }, rx)
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    fn send(&self, request: NavRequest) {
        if self.tx.send(request).is_err() {
            tracing::warn!("navigation request dropped: receiver closed");
        }
    }
}

impl Navigator for ChannelNavigator {
    fn push(&self, route: Route) {
        self.send(NavRequest::Push(route.localized(self.locale)));
    }

    fn replace(&self, route: Route) {
        self.send(NavRequest::Replace(route.localized(self.locale)));
    }

    fn redirect_external(&self, url: &str) {
        self.send(NavRequest::External(url.to_owned()));
    }
}
