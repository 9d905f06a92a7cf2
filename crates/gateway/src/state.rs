//! Shared gateway state: tracker, dedupe cache, counters.

use {
    chrono::{DateTime, Utc},
    std::{
        collections::HashMap,
        sync::{
            Arc, Mutex, MutexGuard,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, Instant},
    },
};

use {
    upwire_conversations::ConversationTracker,
    upwire_events::EventRouter,
    upwire_forward::EventSink,
};

/// Service name reported on every status surface.
pub const SERVICE_NAME: &str = "RBM Callback Handler";

const DEDUPE_TTL_MS: u64 = 300_000;
const DEDUPE_MAX_ENTRIES: usize = 1000;

/// Everything the callback handlers share. Constructed once at startup and
/// handed to the router as an `Arc`.
pub struct CallbackState {
    pub router: EventRouter,
    pub sink: Arc<dyn EventSink>,
    pub version: &'static str,
    tracker: Mutex<ConversationTracker>,
    dedupe: Mutex<DedupeCache>,
    events_processed: AtomicU64,
    started: Instant,
    start_time: DateTime<Utc>,
}

impl CallbackState {
    #[must_use]
    pub fn new(tracker: ConversationTracker, sink: Arc<dyn EventSink>) -> Arc<Self> {
        Arc::new(Self {
            router: EventRouter::default(),
            sink,
            version: env!("CARGO_PKG_VERSION"),
            tracker: Mutex::new(tracker),
            dedupe: Mutex::new(DedupeCache::new()),
            events_processed: AtomicU64::new(0),
            started: Instant::now(),
            start_time: Utc::now(),
        })
    }

    /// Lock the tracker, recovering from poisoning.
    pub fn tracker(&self) -> MutexGuard<'_, ConversationTracker> {
        self.tracker.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn dedupe(&self) -> MutexGuard<'_, DedupeCache> {
        self.dedupe.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record_event(&self) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn events_processed(&self) -> u64 {
        self.events_processed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn uptime_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Wall-clock moment the state was constructed.
    #[must_use]
    pub fn started_at(&self) -> &DateTime<Utc> {
        &self.start_time
    }
}

// ── Dedupe cache ─────────────────────────────────────────────────────────────

struct DedupeEntry {
    inserted_at: Instant,
}

/// TTL-based idempotency cache over event ids. Bounded: at capacity the
/// oldest entry is evicted before a new id is admitted.
pub struct DedupeCache {
    entries: HashMap<String, DedupeEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl Default for DedupeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(Duration::from_millis(DEDUPE_TTL_MS), DEDUPE_MAX_ENTRIES)
    }

    #[must_use]
    pub fn with_limits(ttl: Duration, max_entries: usize) -> Self {
        Self { entries: HashMap::new(), ttl, max_entries }
    }

    /// Returns true if the key is a duplicate (already seen within TTL).
    pub fn check_and_insert(&mut self, key: &str) -> bool {
        self.evict_expired();
        if self.entries.contains_key(key) {
            return true;
        }
        if self.entries.len() >= self.max_entries
            && let Some(oldest_key) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(key, _)| key.clone())
        {
            self.entries.remove(&oldest_key);
        }
        self.entries.insert(key.to_string(), DedupeEntry { inserted_at: Instant::now() });
        false
    }

    fn evict_expired(&mut self) {
        let cutoff = Instant::now() - self.ttl;
        self.entries.retain(|_, entry| entry.inserted_at > cutoff);
    }
}
