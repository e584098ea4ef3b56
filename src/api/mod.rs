//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod pages;
mod routes;

pub use health::{group_details, health, stats};
pub use metrics::prometheus_metrics;
pub use pages::{chat_page, index_page};
pub use routes::api_routes;
