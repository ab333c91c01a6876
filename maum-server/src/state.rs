//! Shared application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::identity::{IdentityProvider, MemoryIdentity, SupabaseIdentity};
use crate::auth::AuthError;
use crate::config::{IdentityBackend, Settings};

/// Read-only after startup; handlers receive it as `State<Arc<AppState>>`.
pub struct AppState {
    pub pool: PgPool,
    pub identity: Arc<dyn IdentityProvider>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(pool: PgPool, identity: Arc<dyn IdentityProvider>, settings: Settings) -> Self {
        Self {
            pool,
            identity,
            settings,
        }
    }

    /// Build the identity provider the settings ask for.
    pub fn from_settings(pool: PgPool, settings: Settings) -> Result<Self, AuthError> {
        let identity: Arc<dyn IdentityProvider> = match &settings.identity {
            IdentityBackend::Supabase { url, anon_key } => {
                tracing::info!(provider = %url, "Using Supabase identity provider");
                Arc::new(SupabaseIdentity::new(url, anon_key)?)
            }
            IdentityBackend::Memory => {
                tracing::warn!("No identity provider configured - teacher accounts are in-memory only");
                Arc::new(MemoryIdentity::default())
            }
        };
        Ok(Self::new(pool, identity, settings))
    }
}
