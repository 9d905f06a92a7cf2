//! HTTP delivery of processed events with bounded retry.

use std::{
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    secrecy::ExposeSecret,
    serde_json::Value,
    tracing::{debug, info, warn},
};

use upwire_events::{ProcessingResult, RbmEvent, iso};

use crate::{
    endpoint::ForwardEndpoint,
    sink::{
        DeliveryCounters, EndpointInfo, EndpointReport, EventSink, ForwardOutcome, SKIPPED_REASON,
        StatsSnapshot,
    },
};

/// `User-Agent` attached to every delivery.
pub const USER_AGENT: &str = concat!("upwire-forwarder/", env!("CARGO_PKG_VERSION"));

#[derive(Default)]
struct ForwardStats {
    total_forwarded: AtomicU64,
    success_count: AtomicU64,
    error_count: AtomicU64,
    last_forward_time: Mutex<Option<DateTime<Utc>>>,
}

/// Fan-out forwarder: each processed event goes to every enabled endpoint
/// concurrently, with per-endpoint retry, backoff, and timeout. One
/// endpoint's failure never affects another's outcome.
pub struct EventForwarder {
    client: reqwest::Client,
    enabled: bool,
    endpoints: Vec<ForwardEndpoint>,
    stats: ForwardStats,
}

impl EventForwarder {
    #[must_use]
    pub fn new(enabled: bool, endpoints: Vec<ForwardEndpoint>) -> Self {
        Self {
            client: reqwest::Client::new(),
            enabled,
            endpoints,
            stats: ForwardStats::default(),
        }
    }

    /// Zero the aggregate counters. Endpoint config is untouched.
    pub fn reset_stats(&self) {
        self.stats.total_forwarded.store(0, Ordering::Relaxed);
        self.stats.success_count.store(0, Ordering::Relaxed);
        self.stats.error_count.store(0, Ordering::Relaxed);
        *self
            .stats
            .last_forward_time
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Attempt chain for one endpoint: up to `retries` tries with
    /// exponential backoff (1s, 2s, 4s, ...) between failures.
    async fn deliver_to_endpoint(
        &self,
        endpoint: &ForwardEndpoint,
        payload: &Value,
    ) -> EndpointReport {
        let retries = endpoint.retries.max(1);
        let mut errors = Vec::new();

        for attempt in 1..=retries {
            debug!(url = %endpoint.url, attempt, retries, "forwarding event");
            match self.post_once(endpoint, payload).await {
                Ok(status) => {
                    debug!(url = %endpoint.url, status, attempt, "forwarded");
                    return EndpointReport {
                        endpoint: endpoint.url.clone(),
                        success: true,
                        status: Some(status),
                        attempts: attempt,
                        errors,
                    };
                }
                Err(message) => {
                    warn!(url = %endpoint.url, attempt, error = %message, "forward attempt failed");
                    errors.push(message);
                    if attempt < retries {
                        let delay = 2u64.saturating_pow(attempt - 1);
                        tokio::time::sleep(Duration::from_secs(delay)).await;
                    }
                }
            }
        }

        warn!(url = %endpoint.url, attempts = retries, "delivery abandoned after final attempt");
        EndpointReport {
            endpoint: endpoint.url.clone(),
            success: false,
            status: None,
            attempts: retries,
            errors,
        }
    }

    async fn post_once(&self, endpoint: &ForwardEndpoint, payload: &Value) -> Result<u16, String> {
        let mut request = self
            .client
            .post(&endpoint.url)
            .timeout(Duration::from_millis(endpoint.timeout_ms))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(payload);
        if let Some(token) = &endpoint.bearer_token {
            request = request.bearer_auth(token.expose_secret());
        }
        for (name, value) in &endpoint.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                format!("Request timeout after {}ms", endpoint.timeout_ms)
            } else {
                e.to_string()
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }
        Ok(status.as_u16())
    }
}

#[async_trait]
impl EventSink for EventForwarder {
    async fn deliver(&self, event: &RbmEvent, result: &ProcessingResult) -> ForwardOutcome {
        let active: Vec<&ForwardEndpoint> =
            self.endpoints.iter().filter(|endpoint| endpoint.enabled).collect();
        if !self.enabled || active.is_empty() {
            return ForwardOutcome::skipped(SKIPPED_REASON);
        }

        let payload = serde_json::json!({
            "event": event,
            "processingResult": result,
            "timestamp": iso::render(&Utc::now()),
            "source": "upwire",
        });

        let deliveries =
            active.iter().map(|endpoint| self.deliver_to_endpoint(endpoint, &payload));
        let reports = futures::future::join_all(deliveries).await;

        let success_count = reports.iter().filter(|report| report.success).count() as u64;
        let error_count = reports.len() as u64 - success_count;
        self.stats.total_forwarded.fetch_add(1, Ordering::Relaxed);
        self.stats.success_count.fetch_add(success_count, Ordering::Relaxed);
        self.stats.error_count.fetch_add(error_count, Ordering::Relaxed);
        *self
            .stats
            .last_forward_time
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(Utc::now());

        info!(
            event_id = %event.event_id,
            endpoints = reports.len(),
            success_count,
            error_count,
            "event forwarded"
        );
        ForwardOutcome::completed(reports)
    }

    fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            enabled: self.enabled,
            endpoint_count: self.endpoints.len(),
            endpoints: self
                .endpoints
                .iter()
                .map(|endpoint| EndpointInfo {
                    url: endpoint.url.clone(),
                    enabled: endpoint.enabled,
                })
                .collect(),
            stats: DeliveryCounters {
                total_forwarded: self.stats.total_forwarded.load(Ordering::Relaxed),
                success_count: self.stats.success_count.load(Ordering::Relaxed),
                error_count: self.stats.error_count.load(Ordering::Relaxed),
                last_forward_time: self
                    .stats
                    .last_forward_time
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .map(|at| iso::render(&at)),
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, upwire_events::EventDetail};

    fn sample_event() -> RbmEvent {
        RbmEvent {
            event_id: "evt_fwd_1".to_string(),
            timestamp: Utc::now(),
            conversation_id: "conv_1".to_string(),
            participant_id: "+15551234567".to_string(),
            detail: EventDetail::UserMessage {
                message_id: "msg_1".to_string(),
                content: upwire_events::MessageContent {
                    text: Some("hello".to_string()),
                    media: None,
                },
            },
        }
    }

    fn sample_result() -> ProcessingResult {
        ProcessingResult::UserMessage {
            processed: true,
            message_id: "msg_1".to_string(),
            text: "hello".to_string(),
        }
    }

    #[tokio::test]
    async fn delivers_payload_with_headers_and_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("user-agent", USER_AGENT)
            .match_header("authorization", "Bearer sekrit")
            .match_header("x-channel", "rbm")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "source": "upwire",
                "event": { "eventId": "evt_fwd_1" },
                "processingResult": { "type": "userMessage", "processed": true }
            })))
            .with_status(200)
            .create_async()
            .await;

        let mut endpoint = ForwardEndpoint::new(server.url());
        endpoint.bearer_token = Some("sekrit".to_string().into());
        endpoint.headers.insert("X-Channel".to_string(), "rbm".to_string());
        let forwarder = EventForwarder::new(true, vec![endpoint]);

        let outcome = forwarder.deliver(&sample_event(), &sample_result()).await;
        assert!(outcome.forwarded());
        mock.assert_async().await;

        let snapshot = forwarder.stats();
        assert_eq!(snapshot.stats.total_forwarded, 1);
        assert_eq!(snapshot.stats.success_count, 1);
        assert_eq!(snapshot.stats.error_count, 0);
        assert!(snapshot.stats.last_forward_time.is_some());
    }

    #[tokio::test]
    async fn server_errors_exhaust_the_retry_budget() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/").with_status(500).expect(2).create_async().await;

        let mut endpoint = ForwardEndpoint::new(server.url());
        endpoint.retries = 2;
        let forwarder = EventForwarder::new(true, vec![endpoint]);

        let outcome = forwarder.deliver(&sample_event(), &sample_result()).await;
        mock.assert_async().await;

        let ForwardOutcome::Completed { success_count, error_count, results, .. } = outcome else {
            panic!("expected a completed outcome");
        };
        assert_eq!(success_count, 0);
        assert_eq!(error_count, 1);
        assert_eq!(results[0].attempts, 2);
        assert_eq!(results[0].errors.len(), 2);
        assert!(results[0].errors[0].starts_with("HTTP 500"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_reported_not_raised() {
        let mut endpoint = ForwardEndpoint::new("http://127.0.0.1:1/hook");
        endpoint.retries = 1;
        let forwarder = EventForwarder::new(true, vec![endpoint]);

        let outcome = forwarder.deliver(&sample_event(), &sample_result()).await;
        let ForwardOutcome::Completed { error_count, results, .. } = outcome else {
            panic!("expected a completed outcome");
        };
        assert_eq!(error_count, 1);
        assert!(!results[0].success);
        assert_eq!(results[0].errors.len(), 1);
    }

    #[tokio::test]
    async fn disabled_forwarder_skips_without_touching_stats() {
        let forwarder = EventForwarder::new(false, vec![ForwardEndpoint::new("http://a.example")]);
        let outcome = forwarder.deliver(&sample_event(), &sample_result()).await;

        assert!(!outcome.forwarded());
        let wire = serde_json::to_value(&outcome).unwrap();
        assert_eq!(wire["reason"], SKIPPED_REASON);
        assert_eq!(forwarder.stats().stats.total_forwarded, 0);
    }

    #[tokio::test]
    async fn per_endpoint_disable_flag_is_honored() {
        let mut endpoint = ForwardEndpoint::new("http://a.example");
        endpoint.enabled = false;
        let forwarder = EventForwarder::new(true, vec![endpoint]);

        let outcome = forwarder.deliver(&sample_event(), &sample_result()).await;
        assert!(!outcome.forwarded());

        // The inventory still lists the endpoint.
        let snapshot = forwarder.stats();
        assert_eq!(snapshot.endpoint_count, 1);
        assert!(!snapshot.endpoints[0].enabled);
    }

    #[tokio::test]
    async fn reset_clears_counters() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", "/").with_status(200).create_async().await;

        let forwarder = EventForwarder::new(true, vec![ForwardEndpoint::new(server.url())]);
        forwarder.deliver(&sample_event(), &sample_result()).await;
        assert_eq!(forwarder.stats().stats.total_forwarded, 1);

        forwarder.reset_stats();
        let snapshot = forwarder.stats();
        assert_eq!(snapshot.stats.total_forwarded, 0);
        assert_eq!(snapshot.stats.success_count, 0);
        assert!(snapshot.stats.last_forward_time.is_none());
    }
}
