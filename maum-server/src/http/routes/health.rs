//! Liveness plus a quick look at the backing services

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::config::IdentityBackend;
use crate::db::ping;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database does not answer
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub identity: &'static str,
}

fn identity_name(backend: &IdentityBackend) -> &'static str {
    match backend {
        IdentityBackend::Supabase { .. } => "supabase",
        IdentityBackend::Memory => "memory",
    }
}

fn report(database_up: bool, backend: &IdentityBackend) -> HealthResponse {
    HealthResponse {
        status: if database_up { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if database_up { "ok" } else { "unreachable" },
        identity: identity_name(backend),
    }
}

/// GET /health - always 200 so the process counts as alive
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database_up = ping(&state.pool).await;
    Json(report(database_up, &state.settings.identity))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
