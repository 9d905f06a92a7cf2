//! Forwarding endpoint configuration.

use std::collections::HashMap;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// One webhook destination for processed events. Deserialized from the
/// `[[forwarding.endpoints]]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardEndpoint {
    pub url: String,
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum delivery attempts per event.
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sent as `Authorization: Bearer <token>`; redacted in debug output.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub bearer_token: Option<Secret<String>>,
    /// Extra headers attached to every delivery.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl ForwardEndpoint {
    /// Endpoint with default timeout and retry settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            enabled: true,
            bearer_token: None,
            headers: HashMap::new(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_retries() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
