//! Core of the APBIA browser client: session handling, the typed REST
//! client, the login flow, route guards and the per-page controllers.
//!
//! Nothing here touches a browser API. Storage and HTTP come in through
//! [`session::KeyValueStore`] and [`api::Transport`].

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod format;
pub mod guard;
pub mod models;
pub mod routes;
pub mod service;
pub mod session;
pub mod validation;

pub use api::{ApiClient, ApiResult, Transport};
pub use config::ClientConfig;
pub use errors::{ClientError, StoreError, ValidationError};
pub use session::{KeyValueStore, MemoryStore, SessionStore};
