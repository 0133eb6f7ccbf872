//! Health check

use actix_web::{web, HttpResponse};
use chrono::Utc;
use tracing::{debug, error};

use super::AppState;
use crate::types::PingResponse;

/// `GET /api/ping`: 200 when the database answers, 503 otherwise
pub async fn handle_ping(state: web::Data<AppState>) -> HttpResponse {
    debug!("Received ping");

    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(PingResponse {
            status: "ok".to_string(),
            database: "ok".to_string(),
            timestamp: Utc::now(),
        }),
        Err(e) => {
            error!("Database ping failed: {}", e);
            HttpResponse::ServiceUnavailable().json(PingResponse {
                status: "degraded".to_string(),
                database: e.to_string(),
                timestamp: Utc::now(),
            })
        }
    }
}
