mod settings;

pub use settings::{
    DeliveryPolicyKind, GroupConfig, OtelConfig, ServerConfig, Settings, WebConfig,
    WebSocketConfig,
};
