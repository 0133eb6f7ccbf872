//! Inspection Worker - backend service for the equipment inspection ledger
//!
//! Serves the bulk CSV import endpoints over HTTP and offers the same
//! import as a one-shot command.

mod cli;
mod config;
mod defaults;
mod db;
mod handlers;
mod services;
mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::db::PgImportStore;
use crate::services::import::{import_csv, ImportRequest, SourceEncoding};
use crate::types::ImportKind;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs directory - use LOGS_DIR env var or default to ../logs (relative to worker)
    let logs_dir = std::env::var("LOGS_DIR")
        .unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        &logs_dir,
        "worker.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // stdout is left to the JSON result when running a one-shot import
    let one_shot = matches!(cli.command, Some(Command::Import { .. }));

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,inspection_worker=debug".into()),
        ))
        .with((!one_shot).then(tracing_subscriber::fmt::layer))
        .with(one_shot.then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let config = Config::from_env()?;
    info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    info!("Connected to PostgreSQL");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            db::run_migrations(&pool).await?;
        }
        Command::Serve => {
            info!("Starting Inspection Worker...");
            db::run_migrations(&pool).await?;

            let store = Arc::new(PgImportStore::new(pool));
            if let Err(e) = handlers::serve(&config, store).await {
                error!("Server error: {}", e);
                return Err(e);
            }
        }
        Command::Import { target, path, encoding, dry_run } => {
            let store = PgImportStore::new(pool);
            run_file_import(&store, target.into(), &path, encoding, dry_run).await?;
        }
    }

    Ok(())
}

async fn run_file_import(
    store: &PgImportStore,
    kind: ImportKind,
    path: &Path,
    encoding: Option<SourceEncoding>,
    dry_run: bool,
) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let request = ImportRequest { kind, bytes, encoding, dry_run };
    let response = import_csv(store, request, Uuid::new_v4()).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
