//! Delivery seam between event processing and the forwarding transport.

use {
    async_trait::async_trait,
    serde::Serialize,
};

use upwire_events::{ProcessingResult, RbmEvent};

/// Reason reported when forwarding is off or nothing is configured.
pub const SKIPPED_REASON: &str = "Forwarding disabled or no endpoints";

/// Where processed events go after the conversation update.
///
/// The gateway calls this from a detached task; implementations report
/// failures as data and never fail the caller.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event/result pair to every configured destination.
    async fn deliver(&self, event: &RbmEvent, result: &ProcessingResult) -> ForwardOutcome;

    /// Current delivery statistics.
    fn stats(&self) -> StatsSnapshot;
}

// ── Outcomes ────────────────────────────────────────────────────────────────

/// What one `deliver` call did.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ForwardOutcome {
    #[serde(rename_all = "camelCase")]
    Skipped { forwarded: bool, reason: String },
    #[serde(rename_all = "camelCase")]
    Completed {
        forwarded: bool,
        endpoint_count: usize,
        success_count: usize,
        error_count: usize,
        results: Vec<EndpointReport>,
    },
}

impl ForwardOutcome {
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped { forwarded: false, reason: reason.into() }
    }

    #[must_use]
    pub fn completed(results: Vec<EndpointReport>) -> Self {
        let success_count = results.iter().filter(|report| report.success).count();
        Self::Completed {
            forwarded: true,
            endpoint_count: results.len(),
            success_count,
            error_count: results.len() - success_count,
            results,
        }
    }

    /// True when at least one delivery was attempted.
    #[must_use]
    pub fn forwarded(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Per-endpoint delivery report. One `errors` entry per failed attempt;
/// a success after retries keeps the earlier entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointReport {
    pub endpoint: String,
    pub success: bool,
    /// HTTP status of the successful attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

// ── Statistics ──────────────────────────────────────────────────────────────

/// Aggregate forwarding statistics plus the endpoint inventory, as shown
/// on the status surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub enabled: bool,
    pub endpoint_count: usize,
    pub endpoints: Vec<EndpointInfo>,
    pub stats: DeliveryCounters,
}

impl StatsSnapshot {
    /// Snapshot for a sink with nothing configured.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            endpoint_count: 0,
            endpoints: Vec::new(),
            stats: DeliveryCounters::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointInfo {
    pub url: String,
    pub enabled: bool,
}

/// Counters since startup (or the last reset). `total_forwarded` counts
/// deliver calls; success/error count per-endpoint attempt chains.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCounters {
    pub total_forwarded: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub last_forward_time: Option<String>,
}

// ── NoopSink ────────────────────────────────────────────────────────────────

/// Sink used when forwarding is disabled in config.
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn deliver(&self, _event: &RbmEvent, _result: &ProcessingResult) -> ForwardOutcome {
        ForwardOutcome::skipped(SKIPPED_REASON)
    }

    fn stats(&self) -> StatsSnapshot {
        StatsSnapshot::disabled()
    }
}
