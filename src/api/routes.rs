use axum::{routing::get, Router};

use crate::server::AppState;

use super::health::{group_details, health, stats};
use super::metrics::prometheus_metrics;
use super::pages::{chat_page, index_page};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/", get(index_page))
        .route("/chat", get(chat_page))
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/stats/groups/{name}", get(group_details))
        .route("/metrics", get(prometheus_metrics))
}
