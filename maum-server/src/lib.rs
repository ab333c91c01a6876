//! maum-server: HTTP API for classes, emotion feeds, plans and statistics
//!
//! Teachers authenticate through a managed identity provider; students
//! hold a server-issued session cookie whose SHA-256 hash is stored in
//! PostgreSQL. Everything else is plain JSON over axum.

pub mod auth;
pub mod config;
pub mod db;
pub mod http;
pub mod state;

pub use config::{ConfigError, IdentityBackend, Settings, SettingsOverrides};
pub use db::{create_pool, migrations};
pub use http::{build_router, run_server, ApiError, ServerError};
pub use state::AppState;
