use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use maum_server::db::SessionRepo;

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: SessionsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SessionsCommand {
    /// Delete student sessions whose expiry has passed
    Prune(PruneArgs),
}

#[derive(Parser, Debug)]
pub struct PruneArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,
}

pub async fn run_sessions(args: SessionsArgs) -> Result<()> {
    match args.command {
        SessionsCommand::Prune(args) => {
            let pool = args.db.connect().await?;
            let removed = SessionRepo::new(&pool)
                .prune_expired(Utc::now())
                .await
                .context("Failed to prune sessions")?;
            tracing::info!(removed, "Pruned expired student sessions");
            println!("Removed {} expired session(s)", removed);
        }
    }
    Ok(())
}
