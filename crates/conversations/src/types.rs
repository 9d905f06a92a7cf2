//! Conversation and participant records.

use {
    chrono::{DateTime, Utc},
    serde::Serialize,
    std::collections::BTreeMap,
};

use upwire_events::{ChatState, EventDetail, EventType, RbmEvent, iso};

const SUMMARY_TEXT_LEN: usize = 50;

/// Lifecycle state of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    Active,
    Typing,
    Expired,
}

/// One tracked conversation: identity, activity window, the running event
/// log, and accumulated user context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub conversation_id: String,
    pub participant_id: String,
    #[serde(with = "iso")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "iso")]
    pub last_activity: DateTime<Utc>,
    pub state: ConversationState,
    pub event_count: u64,
    pub events: Vec<EventSummary>,
    pub context: ConversationContext,
}

impl Conversation {
    #[must_use]
    pub fn new(conversation_id: &str, participant_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            participant_id: participant_id.to_string(),
            start_time: at,
            last_activity: at,
            state: ConversationState::Active,
            event_count: 0,
            events: Vec::new(),
            context: ConversationContext::default(),
        }
    }

    /// Per-type event tally over the running log, keyed by wire name.
    #[must_use]
    pub fn event_type_counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.event_type.wire_name().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// Accumulated user-side context for a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_user_message: Option<String>,
    pub user_actions: Vec<UserAction>,
}

/// A suggestion tap recorded against the conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAction {
    pub action: String,
    pub display_text: String,
    #[serde(with = "iso")]
    pub timestamp: DateTime<Utc>,
}

/// Compact record of one event in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub event_type: EventType,
    pub event_id: String,
    #[serde(with = "iso")]
    pub timestamp: DateTime<Utc>,
    pub summary: SummaryDetail,
}

impl EventSummary {
    /// Condense an event for the conversation log. User-message text is
    /// clipped to its first 50 characters.
    #[must_use]
    pub fn of(event: &RbmEvent) -> Self {
        let summary = match &event.detail {
            EventDetail::UserMessage { content, .. } => SummaryDetail::Message {
                text: content.display_text().chars().take(SUMMARY_TEXT_LEN).collect(),
            },
            EventDetail::SuggestionResponse { postback_data, display_text, .. } => {
                SummaryDetail::Action {
                    action: postback_data.clone(),
                    text: display_text.clone(),
                }
            }
            EventDetail::ChatState { state } => SummaryDetail::State { state: *state },
            EventDetail::DeliveryReceipt { .. } => {
                SummaryDetail::Receipt { status: ReceiptStatus::Delivered }
            }
            EventDetail::ReadReceipt { .. } => {
                SummaryDetail::Receipt { status: ReceiptStatus::Read }
            }
        };

        Self {
            event_type: event.event_type(),
            event_id: event.event_id.clone(),
            timestamp: event.timestamp,
            summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SummaryDetail {
    Message { text: String },
    Action { action: String, text: String },
    State { state: ChatState },
    Receipt { status: ReceiptStatus },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Delivered,
    Read,
}

/// One sender as seen across all their conversations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub participant_id: String,
    #[serde(with = "iso")]
    pub first_seen: DateTime<Utc>,
    #[serde(with = "iso")]
    pub last_seen: DateTime<Utc>,
    /// Membership set in first-seen order; adds are idempotent.
    pub conversations: Vec<String>,
    pub total_events: u64,
}

impl Participant {
    #[must_use]
    pub fn new(participant_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            participant_id: participant_id.to_string(),
            first_seen: at,
            last_seen: at,
            conversations: Vec::new(),
            total_events: 0,
        }
    }
}

/// Listing row for admin queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub participant_id: String,
    pub state: ConversationState,
    pub event_count: u64,
    #[serde(with = "iso")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "iso")]
    pub last_activity: DateTime<Utc>,
}

impl ConversationSummary {
    #[must_use]
    pub fn of(conversation: &Conversation) -> Self {
        Self {
            conversation_id: conversation.conversation_id.clone(),
            participant_id: conversation.participant_id.clone(),
            state: conversation.state,
            event_count: conversation.event_count,
            start_time: conversation.start_time,
            last_activity: conversation.last_activity,
        }
    }
}

/// Derived per-conversation statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStats {
    pub conversation_id: String,
    pub participant_id: String,
    #[serde(with = "iso")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "iso")]
    pub last_activity: DateTime<Utc>,
    pub duration_ms: i64,
    pub event_count: u64,
    pub state: ConversationState,
    pub event_type_counts: BTreeMap<String, u64>,
}

impl ConversationStats {
    #[must_use]
    pub fn of(conversation: &Conversation) -> Self {
        Self {
            conversation_id: conversation.conversation_id.clone(),
            participant_id: conversation.participant_id.clone(),
            start_time: conversation.start_time,
            last_activity: conversation.last_activity,
            duration_ms: (conversation.last_activity - conversation.start_time).num_milliseconds(),
            event_count: conversation.event_count,
            state: conversation.state,
            event_type_counts: conversation.event_type_counts(),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, upwire_events::MessageContent};

    fn at(iso_text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(iso_text).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn summaries_clip_long_message_text() {
        let event = RbmEvent {
            event_id: "evt_1".to_string(),
            timestamp: at("2026-03-01T10:00:00.000Z"),
            conversation_id: "conv_1".to_string(),
            participant_id: "+15551234567".to_string(),
            detail: EventDetail::UserMessage {
                message_id: "msg_1".to_string(),
                content: MessageContent { text: Some("x".repeat(80)), media: None },
            },
        };

        let summary = EventSummary::of(&event);
        match summary.summary {
            SummaryDetail::Message { text } => assert_eq!(text.len(), 50),
            other => panic!("unexpected summary: {other:?}"),
        }
    }

    #[test]
    fn receipt_summaries_carry_their_status() {
        let event = RbmEvent {
            event_id: "evt_2".to_string(),
            timestamp: at("2026-03-01T10:00:00.000Z"),
            conversation_id: "conv_1".to_string(),
            participant_id: "+15551234567".to_string(),
            detail: EventDetail::ReadReceipt {
                message_id: "msg_1".to_string(),
                read_timestamp: "2026-03-01T10:00:01.000Z".to_string(),
            },
        };

        let rendered = serde_json::to_value(EventSummary::of(&event)).unwrap();
        assert_eq!(rendered["summary"], serde_json::json!({"type": "receipt", "status": "read"}));
    }

    #[test]
    fn stats_derive_duration_and_type_counts() {
        let mut conversation =
            Conversation::new("conv_1", "+15551234567", at("2026-03-01T10:00:00.000Z"));
        conversation.last_activity = at("2026-03-01T10:00:05.500Z");
        conversation.event_count = 2;
        conversation.events = vec![
            EventSummary {
                event_type: EventType::UserMessage,
                event_id: "e1".to_string(),
                timestamp: conversation.start_time,
                summary: SummaryDetail::Message { text: "hi".to_string() },
            },
            EventSummary {
                event_type: EventType::UserMessage,
                event_id: "e2".to_string(),
                timestamp: conversation.last_activity,
                summary: SummaryDetail::Message { text: "again".to_string() },
            },
        ];

        let stats = ConversationStats::of(&conversation);
        assert_eq!(stats.duration_ms, 5500);
        assert_eq!(stats.event_type_counts.get("userMessage"), Some(&2));
    }

    #[test]
    fn conversation_serializes_camel_case_iso() {
        let conversation =
            Conversation::new("conv_9", "+15551234567", at("2026-03-01T10:00:00.000Z"));
        let rendered = serde_json::to_value(&conversation).unwrap();
        assert_eq!(rendered["conversationId"], "conv_9");
        assert_eq!(rendered["startTime"], "2026-03-01T10:00:00.000Z");
        assert_eq!(rendered["state"], "active");
        assert!(rendered.get("context").is_some());
    }
}
