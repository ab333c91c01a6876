//! HTTP server command
//!
//! Resolves settings, connects to PostgreSQL, applies the schema and serves
//! the API until Ctrl+C / SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use maum_server::db::create_pool_with_options;
use maum_server::{migrations, run_server, AppState, SettingsOverrides};

use super::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,

    /// Address to bind to (default: 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Allowed CORS origin, repeatable (default: http://localhost:3000)
    #[arg(long = "cors-origin", value_name = "ORIGIN")]
    pub cors_origins: Vec<String>,

    /// Supabase project URL used for teacher accounts
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase anon key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_anon_key: Option<String>,

    /// Mark session cookies Secure (serve behind HTTPS)
    #[arg(long)]
    pub cookie_secure: bool,

    /// Maximum pooled database connections
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Emotion posts a student may write per day
    #[arg(long, env = "MAUM_DAILY_FEED_LIMIT")]
    pub daily_feed_limit: Option<i64>,

    /// Active plans a student may keep
    #[arg(long, env = "MAUM_MAX_ACTIVE_PLANS")]
    pub max_active_plans: Option<i64>,

    /// Student session lifetime in days
    #[arg(long)]
    pub session_days: Option<i64>,

    /// Skip applying the schema on startup
    #[arg(long)]
    pub skip_migrations: bool,
}

impl ServeArgs {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            bind_addr: self.bind,
            max_connections: self.max_connections,
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            cookie_secure: self.cookie_secure.then_some(true),
            cors_permissive: self.cors_permissive,
            cors_origins: self.cors_origins.clone(),
            request_timeout_secs: self.request_timeout,
            daily_feed_limit: self.daily_feed_limit,
            max_active_plans: self.max_active_plans,
            student_session_days: self.session_days,
            ..SettingsOverrides::default()
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let settings = args.db.settings(args.overrides())?;
    let database_url = settings.require_database_url()?;

    tracing::info!("Starting maum server on {}", settings.bind_addr);

    let pool = create_pool_with_options(database_url, settings.max_connections)
        .await
        .context("Failed to create database pool")?;

    if args.skip_migrations {
        tracing::info!("Skipping migrations");
    } else {
        migrations::run(&pool)
            .await
            .context("Failed to apply migrations")?;
    }

    let state = AppState::from_settings(pool, settings)
        .context("Failed to configure identity provider")?;

    // Blocks until shutdown
    run_server(Arc::new(state)).await.context("Server error")?;

    Ok(())
}
