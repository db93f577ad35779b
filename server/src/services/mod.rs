//! Domain services used by the HTTP and procedure routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation and cookie plumbing.

pub mod email_password;
pub mod mailer;
pub mod oauth;
pub mod password;
pub mod session;
pub mod signing;
pub mod users;
pub mod verification;
