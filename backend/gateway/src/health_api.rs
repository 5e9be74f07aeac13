//! Liveness and health endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model: String,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Server is running" }))
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok".into(),
        service: "inkcalc".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        model: state.analyzer.model_id(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}
