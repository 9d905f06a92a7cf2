//! Config schema types (server, conversations, forwarding).

use serde::{Deserialize, Serialize};

use upwire_forward::ForwardEndpoint;

/// Root configuration. Every section is optional in the file and falls
/// back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpwireConfig {
    pub server: ServerConfig,
    pub conversations: ConversationsConfig,
    pub forwarding: ForwardingConfig,
}

/// HTTP bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl ServerConfig {
    /// Bind address in `host:port` form.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0".to_string(), port: 3000 }
    }
}

/// Conversation lifecycle windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationsConfig {
    /// Idle hours before a conversation is marked expired.
    pub expire_after_hours: i64,
    /// Idle hours before the sweep deletes a conversation.
    pub purge_after_hours: i64,
    /// How often the gateway runs the purge sweep.
    pub sweep_interval_secs: u64,
}

impl Default for ConversationsConfig {
    fn default() -> Self {
        Self { expire_after_hours: 24, purge_after_hours: 168, sweep_interval_secs: 3600 }
    }
}

/// Webhook forwarding section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardingConfig {
    pub enabled: bool,
    pub endpoints: Vec<ForwardEndpoint>,
}
