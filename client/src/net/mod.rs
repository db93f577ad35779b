//! Networking: the session authority's HTTP API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` defines the `AuthClient` seam plus its reqwest implementation, and
//! `types` defines the shared wire schema.

pub mod api;
pub mod types;
