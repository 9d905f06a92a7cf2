//! Typed model for GSMA UP RBM callback events.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::fmt,
};

/// ISO-8601 with fixed millisecond precision and a `Z` suffix, the exact
/// rendering the wire uses. Valid wire timestamps round-trip byte-for-byte
/// through this module, so re-serialized events match their input.
pub mod iso {
    use {
        chrono::{DateTime, SecondsFormat, Utc},
        serde::{Deserialize, Deserializer, Serialize, Serializer},
    };

    pub fn render(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(
        at: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        render(at).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// The closed set of RBM callback event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "userMessage")]
    UserMessage,
    #[serde(rename = "chatState")]
    ChatState,
    #[serde(rename = "suggestionResponse")]
    SuggestionResponse,
    #[serde(rename = "deliveryReceipt")]
    DeliveryReceipt,
    #[serde(rename = "readReceipt")]
    ReadReceipt,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::UserMessage,
        EventType::ChatState,
        EventType::SuggestionResponse,
        EventType::DeliveryReceipt,
        EventType::ReadReceipt,
    ];

    /// The camelCase name used on the wire and in log lines.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            EventType::UserMessage => "userMessage",
            EventType::ChatState => "chatState",
            EventType::SuggestionResponse => "suggestionResponse",
            EventType::DeliveryReceipt => "deliveryReceipt",
            EventType::ReadReceipt => "readReceipt",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// One validated RBM callback event: the common identity fields plus the
/// type-specific detail, flattened to the wire's single-object shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbmEvent {
    pub event_id: String,
    #[serde(with = "iso")]
    pub timestamp: DateTime<Utc>,
    pub conversation_id: String,
    pub participant_id: String,
    #[serde(flatten)]
    pub detail: EventDetail,
}

impl RbmEvent {
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.detail.event_type()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum EventDetail {
    #[serde(rename = "userMessage", rename_all = "camelCase")]
    UserMessage {
        message_id: String,
        content: MessageContent,
    },
    #[serde(rename = "chatState", rename_all = "camelCase")]
    ChatState { state: ChatState },
    #[serde(rename = "suggestionResponse", rename_all = "camelCase")]
    SuggestionResponse {
        source_message_id: String,
        postback_data: String,
        display_text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_type: Option<ResponseType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
    },
    #[serde(rename = "deliveryReceipt", rename_all = "camelCase")]
    DeliveryReceipt {
        message_id: String,
        delivered_timestamp: String,
    },
    #[serde(rename = "readReceipt", rename_all = "camelCase")]
    ReadReceipt {
        message_id: String,
        read_timestamp: String,
    },
}

impl EventDetail {
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            EventDetail::UserMessage { .. } => EventType::UserMessage,
            EventDetail::ChatState { .. } => EventType::ChatState,
            EventDetail::SuggestionResponse { .. } => EventType::SuggestionResponse,
            EventDetail::DeliveryReceipt { .. } => EventType::DeliveryReceipt,
            EventDetail::ReadReceipt { .. } => EventType::ReadReceipt,
        }
    }
}

/// Body of a `userMessage` event. At least one of `text`/`media` is present
/// on validated events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaPointer>,
}

impl MessageContent {
    /// Display text with the wire's empty-means-media semantics.
    #[must_use]
    pub fn display_text(&self) -> &str {
        match self.text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => "[media]",
        }
    }
}

/// Media attachment reference. The wire shape is open-ended, so unmodeled
/// fields ride along in `extra` and survive re-serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPointer {
    #[serde(default)]
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Typing-indicator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatState {
    Composing,
    Idle,
}

/// How a suggestion was surfaced back to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Action,
    Reply,
}
