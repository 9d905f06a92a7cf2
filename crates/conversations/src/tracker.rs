//! Conversation lifecycle tracking driven by validated events.

use chrono::Duration;

use upwire_events::{ChatState, EventDetail, RbmEvent};

use crate::{
    clock::{Clock, SystemClock},
    store::{ConversationStore, MemoryStore},
    types::{
        Conversation, ConversationState, ConversationStats, ConversationSummary, EventSummary,
        Participant, UserAction,
    },
};

/// Idle hours after which a conversation is marked expired.
pub const EXPIRE_AFTER_HOURS: i64 = 24;
/// Idle hours after which the purge sweep deletes a conversation.
pub const PURGE_AFTER_HOURS: i64 = 168;

/// What one tracker update did, for logging and response enrichment.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub conversation_id: String,
    /// True when this event started the conversation.
    pub created: bool,
    /// True when pre-update idleness forced the expired state.
    pub expired: bool,
    pub state: ConversationState,
    pub event_count: u64,
}

/// Per-conversation state machine over a [`ConversationStore`].
///
/// Updates run to completion on the calling thread and never leave a record
/// partially mutated. The gateway serializes access with a mutex at its
/// boundary.
pub struct ConversationTracker<S: ConversationStore = MemoryStore> {
    store: S,
    clock: Box<dyn Clock>,
    expire_after: Duration,
}

impl ConversationTracker<MemoryStore> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(
            MemoryStore::default(),
            Box::new(SystemClock),
            Duration::hours(EXPIRE_AFTER_HOURS),
        )
    }
}

impl Default for ConversationTracker<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ConversationStore> ConversationTracker<S> {
    #[must_use]
    pub fn with_parts(store: S, clock: Box<dyn Clock>, expire_after: Duration) -> Self {
        Self { store, clock, expire_after }
    }

    /// Apply one validated event to its conversation and participant.
    ///
    /// Staleness is judged against the conversation's pre-update
    /// `lastActivity`; when the idle window has passed, the state is forced
    /// to expired and the event's own type transition is skipped. Fresh
    /// activity afterwards resumes the conversation normally.
    pub fn update(&mut self, event: &RbmEvent) -> UpdateOutcome {
        let now = self.clock.now();

        let created = self.store.get(&event.conversation_id).is_none();
        if created {
            self.store.put(Conversation::new(
                &event.conversation_id,
                &event.participant_id,
                now,
            ));
            tracing::info!(
                conversation_id = %event.conversation_id,
                participant = %event.participant_id,
                "conversation started"
            );
        }

        let expire_after = self.expire_after;
        let mut outcome = UpdateOutcome {
            conversation_id: event.conversation_id.clone(),
            created,
            expired: false,
            state: ConversationState::Active,
            event_count: 0,
        };

        if let Some(conversation) = self.store.get_mut(&event.conversation_id) {
            let stale = !created && now - conversation.last_activity > expire_after;
            if stale {
                conversation.state = ConversationState::Expired;
                tracing::debug!(
                    conversation_id = %conversation.conversation_id,
                    "conversation expired before this event"
                );
            }

            conversation.events.push(EventSummary::of(event));
            conversation.event_count += 1;
            conversation.last_activity = event.timestamp;

            if !stale {
                apply_transition(conversation, event);
            }

            outcome.expired = stale;
            outcome.state = conversation.state;
            outcome.event_count = conversation.event_count;
        }

        self.touch_participant(event);
        outcome
    }

    fn touch_participant(&mut self, event: &RbmEvent) {
        let now = self.clock.now();
        if self.store.participant(&event.participant_id).is_none() {
            self.store.put_participant(Participant::new(&event.participant_id, now));
        }
        if let Some(participant) = self.store.participant_mut(&event.participant_id) {
            participant.last_seen = now;
            participant.total_events += 1;
            if !participant.conversations.iter().any(|id| id == &event.conversation_id) {
                participant.conversations.push(event.conversation_id.clone());
            }
        }
    }

    /// Delete conversations idle beyond `threshold`; returns how many went.
    /// Run periodically by the gateway's sweep task.
    pub fn purge_idle(&mut self, threshold: Duration) -> usize {
        let now = self.clock.now();
        let idle: Vec<String> = self
            .store
            .list()
            .iter()
            .filter(|conversation| now - conversation.last_activity > threshold)
            .map(|conversation| conversation.conversation_id.clone())
            .collect();

        for conversation_id in &idle {
            self.store.delete(conversation_id);
            tracing::info!(conversation_id = %conversation_id, "purged idle conversation");
        }
        idle.len()
    }

    // ── Read-only queries ────────────────────────────────────────────────────

    #[must_use]
    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.store.get(id)
    }

    #[must_use]
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.store.participant(id)
    }

    /// Conversations a participant belongs to, via their membership set.
    /// Ids whose conversations were purged are skipped.
    #[must_use]
    pub fn participant_conversations(&self, participant_id: &str) -> Vec<&Conversation> {
        self.store
            .participant(participant_id)
            .map(|participant| {
                participant.conversations.iter().filter_map(|id| self.store.get(id)).collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn conversation_stats(&self, id: &str) -> Option<ConversationStats> {
        self.store.get(id).map(ConversationStats::of)
    }

    #[must_use]
    pub fn conversation_count(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.store
            .list()
            .iter()
            .filter(|conversation| conversation.state == ConversationState::Active)
            .count()
    }

    #[must_use]
    pub fn all_conversations(&self) -> Vec<ConversationSummary> {
        self.store.list().iter().map(|conversation| ConversationSummary::of(conversation)).collect()
    }

    /// Last `limit` conversations by insertion, oldest of the window first.
    #[must_use]
    pub fn recent_conversations(&self, limit: usize) -> Vec<ConversationSummary> {
        let listed = self.store.list();
        let start = listed.len().saturating_sub(limit);
        listed[start..].iter().map(|conversation| ConversationSummary::of(conversation)).collect()
    }
}

fn apply_transition(conversation: &mut Conversation, event: &RbmEvent) {
    match &event.detail {
        EventDetail::ChatState { state } => {
            conversation.state = match state {
                ChatState::Composing => ConversationState::Typing,
                ChatState::Idle => ConversationState::Active,
            };
        }
        EventDetail::UserMessage { content, .. } => {
            conversation.state = ConversationState::Active;
            if let Some(text) = content.text.as_deref().filter(|text| !text.is_empty()) {
                conversation.context.last_user_message = Some(text.to_string());
            }
        }
        EventDetail::SuggestionResponse { postback_data, display_text, .. } => {
            conversation.state = ConversationState::Active;
            conversation.context.user_actions.push(UserAction {
                action: postback_data.clone(),
                display_text: display_text.clone(),
                timestamp: event.timestamp,
            });
        }
        EventDetail::DeliveryReceipt { .. } | EventDetail::ReadReceipt { .. } => {}
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::clock::ManualClock,
        chrono::{DateTime, Utc},
        std::sync::Arc,
        upwire_events::MessageContent,
    };

    fn start_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T08:00:00.000Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn tracker_with_clock() -> (ConversationTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_at(start_time()));
        let tracker = ConversationTracker::with_parts(
            MemoryStore::default(),
            Box::new(clock.clone()),
            Duration::hours(EXPIRE_AFTER_HOURS),
        );
        (tracker, clock)
    }

    fn event(conversation_id: &str, event_id: &str, at: DateTime<Utc>, detail: EventDetail) -> RbmEvent {
        RbmEvent {
            event_id: event_id.to_string(),
            timestamp: at,
            conversation_id: conversation_id.to_string(),
            participant_id: "+15551234567".to_string(),
            detail,
        }
    }

    fn text_message(conversation_id: &str, event_id: &str, at: DateTime<Utc>, text: &str) -> RbmEvent {
        event(
            conversation_id,
            event_id,
            at,
            EventDetail::UserMessage {
                message_id: format!("msg_{event_id}"),
                content: MessageContent { text: Some(text.to_string()), media: None },
            },
        )
    }

    fn typing(conversation_id: &str, event_id: &str, at: DateTime<Utc>) -> RbmEvent {
        event(conversation_id, event_id, at, EventDetail::ChatState { state: ChatState::Composing })
    }

    #[test]
    fn first_event_starts_an_active_conversation() {
        let (mut tracker, clock) = tracker_with_clock();
        let outcome = tracker.update(&text_message("conv_1", "e1", clock.now(), "hello"));

        assert!(outcome.created);
        assert!(!outcome.expired);
        assert_eq!(outcome.state, ConversationState::Active);
        assert_eq!(outcome.event_count, 1);

        let conversation = tracker.conversation("conv_1").unwrap();
        assert_eq!(conversation.start_time, start_time());
        assert_eq!(conversation.context.last_user_message.as_deref(), Some("hello"));
    }

    #[test]
    fn event_log_and_count_grow_together() {
        let (mut tracker, clock) = tracker_with_clock();
        for i in 0..4 {
            clock.advance(Duration::minutes(1));
            tracker.update(&text_message("conv_1", &format!("e{i}"), clock.now(), "hi"));
        }

        let conversation = tracker.conversation("conv_1").unwrap();
        assert_eq!(conversation.event_count, 4);
        assert_eq!(conversation.events.len(), 4);
        assert_eq!(conversation.last_activity, clock.now());
    }

    #[test]
    fn chat_states_drive_typing_transitions() {
        let (mut tracker, clock) = tracker_with_clock();
        tracker.update(&typing("conv_1", "e1", clock.now()));
        assert_eq!(tracker.conversation("conv_1").unwrap().state, ConversationState::Typing);

        tracker.update(&event(
            "conv_1",
            "e2",
            clock.now(),
            EventDetail::ChatState { state: ChatState::Idle },
        ));
        assert_eq!(tracker.conversation("conv_1").unwrap().state, ConversationState::Active);
    }

    #[test]
    fn suggestion_responses_append_user_actions() {
        let (mut tracker, clock) = tracker_with_clock();
        tracker.update(&event(
            "conv_1",
            "e1",
            clock.now(),
            EventDetail::SuggestionResponse {
                source_message_id: "msg_0".to_string(),
                postback_data: "place_order".to_string(),
                display_text: "Order now".to_string(),
                response_type: None,
                action_url: None,
                context: None,
            },
        ));

        let conversation = tracker.conversation("conv_1").unwrap();
        assert_eq!(conversation.context.user_actions.len(), 1);
        let action = &conversation.context.user_actions[0];
        assert_eq!(action.action, "place_order");
        assert_eq!(action.display_text, "Order now");
        assert_eq!(action.timestamp, start_time());
    }

    #[test]
    fn idle_conversations_expire_before_the_transition_applies() {
        let (mut tracker, clock) = tracker_with_clock();
        tracker.update(&text_message("conv_1", "e1", clock.now(), "hello"));

        clock.advance(Duration::hours(25));
        let outcome = tracker.update(&typing("conv_1", "e2", clock.now()));

        assert!(outcome.expired);
        assert_eq!(outcome.state, ConversationState::Expired);
        assert_eq!(tracker.conversation("conv_1").unwrap().state, ConversationState::Expired);

        // Fresh activity resumes the conversation normally.
        clock.advance(Duration::minutes(1));
        let outcome = tracker.update(&typing("conv_1", "e3", clock.now()));
        assert!(!outcome.expired);
        assert_eq!(outcome.state, ConversationState::Typing);
    }

    #[test]
    fn boundary_idleness_does_not_expire() {
        let (mut tracker, clock) = tracker_with_clock();
        tracker.update(&text_message("conv_1", "e1", clock.now(), "hello"));

        clock.advance(Duration::hours(EXPIRE_AFTER_HOURS));
        let outcome = tracker.update(&typing("conv_1", "e2", clock.now()));
        assert!(!outcome.expired);
        assert_eq!(outcome.state, ConversationState::Typing);
    }

    #[test]
    fn purge_deletes_only_long_idle_records() {
        let (mut tracker, clock) = tracker_with_clock();
        tracker.update(&text_message("conv_old", "e1", clock.now(), "old"));

        clock.advance(Duration::hours(169));
        tracker.update(&text_message("conv_new", "e2", clock.now(), "new"));

        let purged = tracker.purge_idle(Duration::hours(PURGE_AFTER_HOURS));
        assert_eq!(purged, 1);
        assert!(tracker.conversation("conv_old").is_none());
        assert!(tracker.conversation("conv_new").is_some());
        assert_eq!(tracker.conversation_count(), 1);
    }

    #[test]
    fn participants_accumulate_across_conversations() {
        let (mut tracker, clock) = tracker_with_clock();
        tracker.update(&text_message("conv_1", "e1", clock.now(), "a"));
        clock.advance(Duration::minutes(5));
        tracker.update(&text_message("conv_2", "e2", clock.now(), "b"));
        tracker.update(&text_message("conv_1", "e3", clock.now(), "c"));

        let participant = tracker.participant("+15551234567").unwrap();
        assert_eq!(participant.first_seen, start_time());
        assert_eq!(participant.last_seen, clock.now());
        assert_eq!(participant.total_events, 3);
        assert_eq!(participant.conversations, vec!["conv_1", "conv_2"]);

        let listed = tracker.participant_conversations("+15551234567");
        assert_eq!(listed.len(), 2);
    }

    #[test]
    fn recent_listing_takes_the_insertion_tail() {
        let (mut tracker, clock) = tracker_with_clock();
        for i in 0..5 {
            tracker.update(&text_message(&format!("conv_{i}"), &format!("e{i}"), clock.now(), "x"));
        }

        let recent = tracker.recent_conversations(2);
        let ids: Vec<&str> = recent.iter().map(|row| row.conversation_id.as_str()).collect();
        assert_eq!(ids, vec!["conv_3", "conv_4"]);

        assert_eq!(tracker.all_conversations().len(), 5);
        assert_eq!(tracker.active_count(), 5);
    }

    #[test]
    fn stats_capture_counts_and_duration() {
        let (mut tracker, clock) = tracker_with_clock();
        tracker.update(&text_message("conv_1", "e1", clock.now(), "hello"));
        clock.advance(Duration::seconds(90));
        tracker.update(&typing("conv_1", "e2", clock.now()));

        let stats = tracker.conversation_stats("conv_1").unwrap();
        assert_eq!(stats.event_count, 2);
        assert_eq!(stats.duration_ms, 90_000);
        assert_eq!(stats.event_type_counts.get("userMessage"), Some(&1));
        assert_eq!(stats.event_type_counts.get("chatState"), Some(&1));
    }
}
