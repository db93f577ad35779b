//! UI-side half of the starter kit.
//!
//! ARCHITECTURE
//! ============
//! - `provider`: session context cached for the UI tree.
//! - `guard`: redirect state machine for protected pages.
//! - `pages`: credential intake forms.
//! - `navigation` + `i18n`: symbolic, locale-prefixed routes.
//! - `net`: HTTP client for the session authority.
//!
//! Nothing here renders. Views subscribe to `AuthProvider` and drive the
//! form and guard types.

pub mod guard;
pub mod i18n;
pub mod navigation;
pub mod net;
pub mod pages;
pub mod provider;
pub mod state;
pub mod util;

#[cfg(test)]
mod test_helpers;
