pub mod migrate;
pub mod serve;
pub mod sessions;

pub use migrate::{run_migrate, MigrateArgs};
pub use serve::{run_serve, ServeArgs};
pub use sessions::{run_sessions, SessionsArgs};

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use maum_server::{create_pool, Settings, SettingsOverrides};
use sqlx::PgPool;

/// Flags shared by every command that talks to the database
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Config file (default: ~/.maum/maum.toml when present)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Database URL (overrides config file)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

impl DatabaseArgs {
    pub fn settings(&self, mut overrides: SettingsOverrides) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())
            .context("Failed to load configuration")?;
        overrides.database_url = self.database_url.clone();
        settings
            .apply(overrides)
            .context("Invalid configuration")?;
        Ok(settings)
    }

    pub async fn connect(&self) -> Result<PgPool> {
        let settings = self.settings(SettingsOverrides::default())?;
        let url = settings.require_database_url()?;
        create_pool(url)
            .await
            .context("Failed to create database pool")
    }
}
