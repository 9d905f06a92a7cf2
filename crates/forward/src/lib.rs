//! Best-effort webhook delivery of processed events.
//!
//! The gateway hands each event/result pair to an [`EventSink`] on a
//! detached task, so delivery never blocks or rolls back event
//! processing. [`EventForwarder`] is the HTTP implementation: bounded
//! retry with exponential backoff, a per-attempt timeout, and concurrent
//! endpoint fan-out. [`NoopSink`] stands in when forwarding is disabled.

pub mod endpoint;
pub mod forwarder;
pub mod sink;

pub use {
    endpoint::ForwardEndpoint,
    forwarder::{EventForwarder, USER_AGENT},
    sink::{
        DeliveryCounters, EndpointInfo, EndpointReport, EventSink, ForwardOutcome, NoopSink,
        SKIPPED_REASON, StatsSnapshot,
    },
};
