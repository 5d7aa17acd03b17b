//! Health, database diagnostics and site info endpoints
//!
//! - GET /api/health - liveness, never touches the database
//! - GET /api/test-db - ping, server version and current database
//! - GET /api/site - the club this deployment serves

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{success, ApiResponse};
use crate::config::ClubConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub message: String,
    pub driver: String,
    pub version: String,
    pub database: Option<String>,
    pub timestamp: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/test-db", get(test_db))
        .route("/site", get(site))
}

/// GET /api/health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /api/test-db
async fn test_db(State(state): State<AppState>) -> Result<Json<ApiResponse<DatabaseInfo>>, ApiError> {
    let check = async {
        state.pool.ping().await?;
        let version = state.pool.server_version().await?;
        let database = state.pool.current_database().await?;
        anyhow::Ok((version, database))
    };

    match check.await {
        Ok((version, database)) => Ok(success(DatabaseInfo {
            message: "Database connection successful".to_string(),
            driver: state.pool.driver().to_string(),
            version,
            database,
            timestamp: Utc::now().to_rfc3339(),
        })),
        Err(e) => {
            tracing::error!("Database check failed: {:#}", e);
            Err(ApiError::internal_error(format!("Database connection failed: {}", e)))
        }
    }
}

/// GET /api/site
async fn site(State(state): State<AppState>) -> Json<ApiResponse<ClubConfig>> {
    success(state.site.current_club())
}
