//! HTTP handlers

pub mod import;
pub mod ping;

use std::sync::Arc;

use actix_web::web::{self, get, post, scope};
use actix_web::{App, HttpServer, Scope};
use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db::ImportStore;

const API_PATH: &str = "/api";

/// Shared by every worker thread of the HTTP server
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ImportStore>,
    pub max_upload_bytes: usize,
}

/// Routes under `/api`
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/ping", get().to(ping::handle_ping))
        .route("/devices/import", post().to(import::import_devices))
        .route("/inspection-items/import", post().to(import::import_inspection_items))
        .route("/inspection-item-names/import", post().to(import::import_item_names))
}

/// Run the HTTP server until shutdown
pub async fn serve(config: &Config, store: Arc<dyn ImportStore>) -> Result<()> {
    let state = AppState {
        store,
        max_upload_bytes: config.max_upload_bytes,
    };

    info!("Listening on {}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .service(configure_routes())
    })
    .bind(&config.bind_addr)
    .with_context(|| format!("Failed to bind {}", config.bind_addr))?
    .run()
    .await
    .context("HTTP server stopped with an error")
}
