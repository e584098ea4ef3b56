// Infrastructure layer (shared components)
pub mod infrastructure;

pub use infrastructure::config;
pub use infrastructure::error;
pub use infrastructure::metrics;

// Domain layer
pub mod group;

// Application layer
pub mod api;
pub mod server;
pub mod template;
pub mod websocket;

// Supporting modules
pub mod telemetry;
