use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub groups: GroupConfig,
    #[serde(default)]
    pub websocket: WebSocketConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// What a group does when a member's outbound queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicyKind {
    /// Wait until the member drains its queue or goes away
    Block,
    /// Wait up to `delivery_timeout_ms`, then remove the member
    Evict,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    /// Capacity of each member's outbound queue
    #[serde(default = "default_message_buffer_size")]
    pub message_buffer_size: usize,
    /// Capacity of each group's request queue
    #[serde(default = "default_request_buffer_size")]
    pub request_buffer_size: usize,
    #[serde(default = "default_delivery_policy")]
    pub delivery_policy: DeliveryPolicyKind,
    /// Only used by the `evict` policy
    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,
    /// How long stats endpoints wait for a group's member snapshot
    #[serde(default = "default_snapshot_timeout_ms")]
    pub snapshot_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    #[serde(default = "default_socket_buffer_size")]
    pub read_buffer_size: usize,
    #[serde(default = "default_socket_buffer_size")]
    pub write_buffer_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_message_buffer_size() -> usize {
    256
}

fn default_request_buffer_size() -> usize {
    64
}

fn default_delivery_policy() -> DeliveryPolicyKind {
    DeliveryPolicyKind::Block
}

fn default_delivery_timeout_ms() -> u64 {
    5000
}

fn default_snapshot_timeout_ms() -> u64 {
    2000
}

fn default_socket_buffer_size() -> usize {
    1024
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "room-relay".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("groups.message_buffer_size", 256)?
            .set_default("groups.request_buffer_size", 64)?
            .set_default("groups.delivery_policy", "block")?
            .set_default("groups.delivery_timeout_ms", 5000)?
            .set_default("groups.snapshot_timeout_ms", 2000)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER__PORT, GROUPS__DELIVERY_POLICY, OTEL__ENABLED, etc.
            // Field names contain underscores, so nesting uses a double underscore.
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    // Only this key is a list; every other value stays a plain string
                    .with_list_parse_key("server.cors_origins"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            message_buffer_size: default_message_buffer_size(),
            request_buffer_size: default_request_buffer_size(),
            delivery_policy: default_delivery_policy(),
            delivery_timeout_ms: default_delivery_timeout_ms(),
            snapshot_timeout_ms: default_snapshot_timeout_ms(),
        }
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: default_socket_buffer_size(),
            write_buffer_size: default_socket_buffer_size(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
