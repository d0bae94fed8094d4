use crate::service::Radar;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct WatchRequest {
    pub address: String,
}

pub fn router(radar: Radar) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/top", get(top))
        .route("/api/watch", post(watch))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(radar)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "onchain-radar",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

async fn status(State(radar): State<Radar>) -> impl IntoResponse {
    Json(radar.status().await)
}

async fn top(State(radar): State<Radar>) -> impl IntoResponse {
    let ranked = radar.get_ranked_candidates().await;
    info!("[API] /top returned {} candidate(s)", ranked.len());
    Json(ranked)
}

async fn watch(State(radar): State<Radar>, Json(req): Json<WatchRequest>) -> impl IntoResponse {
    let address = req.address.trim().to_string();
    if address.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "address is required"})));
    }
    match radar.register_watch_token(&address).await {
        Ok(added) => (StatusCode::OK, Json(json!({"address": address, "added": added}))),
        Err(e) => {
            warn!("[API] Watchlist write failed for {}: {}", address, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "watchlist unavailable"})),
            )
        }
    }
}
