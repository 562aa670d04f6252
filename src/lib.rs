//! Event Draft Service
//!
//! This library implements the organizer-side event creation workflow for a
//! ticketing marketplace: a multi-section form model, per-section validation
//! with derived summaries, an independently togglable accordion, a debounced
//! draft-autosave engine and a submission gate. It is exposed as a small web
//! service that bridges dashboard frontends and the marketplace JSON API.
//!
//! # Modules
//!
//! - `client`: MarketplaceClient for the remote organizer API
//! - `auth`: request signing for the marketplace API
//! - `models`: form model, event lifecycle and wire payloads
//! - `services`: validation, accordion, autosave sync, submission gate,
//!   session registry and the draft journal
//! - `handlers` / `routes`: the HTTP surface consumed by the dashboard
//!
//! # Authentication
//!
//! Marketplace requests are signed with an app id and a secret pair using
//! HMAC-SHA256 over the method, key headers, URI and body; the logic lives
//! in the `auth` module. The dashboard side can optionally be locked with a
//! static bearer token.

pub mod auth;
pub mod client;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
pub mod client_mock;
#[cfg(test)]
mod tests;

// Re-export the main types for ease of use
pub use client::{ApiError, DraftApi, MarketplaceClient};
pub use handlers::api::AppState;
pub use routes::create_router;
