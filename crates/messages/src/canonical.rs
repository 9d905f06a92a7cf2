//! The canonical internal message model.
//!
//! Every accepted wire shape normalizes into [`CanonicalMessage`]; the serde
//! form of these types doubles as the stable shape handed to UI renderers.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

// ── Actions ──────────────────────────────────────────────────────────────────

/// A button or quick reply attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub display_label: String,
    /// Opaque token returned verbatim when the user taps the action.
    pub postback_data: String,
    #[serde(default)]
    pub variant: ActionVariant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionVariant {
    Primary,
    #[default]
    Secondary,
    Reply,
}

// ── Structured content ───────────────────────────────────────────────────────

/// Rich-card content; also the per-card shape inside a carousel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardContent {
    pub title: String,
    pub description: String,
    /// Image URL; empty when the card has no image.
    pub image: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaType {
    Image,
    Video,
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaContent {
    pub media_type: MediaType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// ── Messages ─────────────────────────────────────────────────────────────────

/// One normalized chat unit. The tagged representation makes "exactly one
/// structured payload per message" unrepresentable as anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CanonicalMessage {
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        suggested_actions: Vec<Action>,
    },
    #[serde(rename_all = "camelCase")]
    RichCard { rich_card: CardContent },
    #[serde(rename_all = "camelCase")]
    Carousel { cards: Vec<CardContent> },
    #[serde(rename_all = "camelCase")]
    Media { media: MediaContent },
}

impl CanonicalMessage {
    /// The wire tag for this kind, for logging and fallbacks.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::RichCard { .. } => "richCard",
            Self::Carousel { .. } => "carousel",
            Self::Media { .. } => "media",
        }
    }
}

/// Identity header wrapping one or more canonical messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    pub message_id: String,
    pub conversation_id: String,
    pub participant_id: String,
    pub timestamp: DateTime<Utc>,
    pub messages: Vec<CanonicalMessage>,
}
