//! Bidirectional mapping between raw wire payloads and the canonical model.
//!
//! Outbound (`to_canonical`) accepts every shape the dev panel and the GSMA
//! wire have ever produced and funnels them into [`CanonicalMessage`].
//! Inbound (`to_wire`) renders canonical messages back into the wire shape;
//! kinds without a wire representation degrade to plain text.

use {
    chrono::Utc,
    serde_json::{Value, json},
};

use crate::{
    canonical::{
        Action, ActionVariant, CanonicalMessage, CardContent, MediaContent, MediaType,
        MessageEnvelope,
    },
    error::{Error, Result},
    format::{self, PayloadFormat},
    ids::MessageDefaults,
};

/// Normalize a raw payload into a canonical envelope.
///
/// Runs format detection itself so the adapter is usable without a prior
/// validation pass; detection failures surface as adaptation failures.
/// Identity fields prefer the payload's own values over `defaults`.
pub fn to_canonical(payload: &Value, defaults: &MessageDefaults) -> Result<MessageEnvelope> {
    let format = format::detect(payload).map_err(Error::adaptation)?;

    let raw: Vec<&Value> = match format {
        PayloadFormat::ArrayFormat => payload
            .get("messages")
            .and_then(Value::as_array)
            .map(|messages| messages.iter().collect())
            .unwrap_or_default(),
        PayloadFormat::SingleFormat => vec![payload],
    };

    let messages = raw
        .into_iter()
        .map(adapt_message)
        .collect::<Result<Vec<_>>>()?;

    Ok(MessageEnvelope {
        message_id: resolve_id(payload, "messageId", &defaults.message_id),
        conversation_id: resolve_id(payload, "conversationId", &defaults.conversation_id),
        participant_id: resolve_id(payload, "participantId", &defaults.participant_id),
        timestamp: Utc::now(),
        messages,
    })
}

fn resolve_id(payload: &Value, field: &str, default: &str) -> String {
    format::truthy_field(payload, field)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

// ── Wire → canonical ─────────────────────────────────────────────────────────

/// Map one raw message, trying shapes in fixed precedence order. A truthy
/// `text` wins over everything; explicit `type` dispatch is the last resort.
fn adapt_message(message: &Value) -> Result<CanonicalMessage> {
    if let Some(text) = format::truthy_field(message, "text") {
        return Ok(CanonicalMessage::Text {
            text: text_of(text),
            suggested_actions: suggestions_of(message),
        });
    }

    if let Some(rich_card) = format::truthy_field(message, "richCard") {
        if let Some(standalone) = format::truthy_field(rich_card, "standaloneCard") {
            return Ok(CanonicalMessage::RichCard {
                rich_card: card_from_content(standalone.get("cardContent").unwrap_or(&Value::Null)),
            });
        }
        if let Some(carousel) = format::truthy_field(rich_card, "carouselCard") {
            let cards = carousel
                .get("cardContents")
                .and_then(Value::as_array)
                .map(|entries| entries.iter().map(card_from_content).collect())
                .unwrap_or_default();
            return Ok(CanonicalMessage::Carousel { cards });
        }
    }

    if let Some(carousel) = format::truthy_field(message, "carousel") {
        return Ok(CanonicalMessage::Carousel {
            cards: card_list(carousel, &["cards", "cardContents"]),
        });
    }

    if let Some(media) = format::truthy_field(message, "media") {
        return Ok(CanonicalMessage::Media { media: media_from_value(media)? });
    }

    match format::truthy_field(message, "type").and_then(Value::as_str) {
        Some("text") => Ok(CanonicalMessage::Text {
            text: string_field(message, "text"),
            suggested_actions: suggestions_of(message),
        }),
        Some("richCard") => Ok(CanonicalMessage::RichCard { rich_card: card_from_flat(message) }),
        Some("media") => Ok(CanonicalMessage::Media {
            media: media_from_value(message.get("media").unwrap_or(&Value::Null))?,
        }),
        Some("carousel") => {
            Ok(CanonicalMessage::Carousel { cards: card_list(message, &["cards"]) })
        }
        _ => Err(Error::UnsupportedMessageType),
    }
}

/// Card from the nested Google-RCS `cardContent` shape.
fn card_from_content(content: &Value) -> CardContent {
    CardContent {
        title: string_field(content, "title"),
        description: string_field(content, "description"),
        image: nested_file_url(content),
        actions: adapt_suggestions(format::truthy_field(content, "suggestions")),
    }
}

/// Card from the flat dev-panel shape; falls back to the nested image URL
/// and either action spelling.
fn card_from_flat(card: &Value) -> CardContent {
    let image = format::truthy_field(card, "image")
        .and_then(Value::as_str)
        .map_or_else(|| nested_file_url(card), str::to_string);
    CardContent {
        title: string_field(card, "title"),
        description: string_field(card, "description"),
        image,
        actions: adapt_suggestions(
            format::truthy_field(card, "actions")
                .or_else(|| format::truthy_field(card, "suggestions")),
        ),
    }
}

fn card_list(container: &Value, fields: &[&str]) -> Vec<CardContent> {
    fields
        .iter()
        .find_map(|field| format::truthy_field(container, field))
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(card_from_flat).collect())
        .unwrap_or_default()
}

fn nested_file_url(value: &Value) -> String {
    value
        .get("media")
        .and_then(|media| media.get("contentInfo"))
        .and_then(|info| info.get("fileUrl"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn media_from_value(media: &Value) -> Result<MediaContent> {
    let media_type = match format::truthy_field(media, "mediaType").and_then(Value::as_str) {
        Some("image") => MediaType::Image,
        Some("video") => MediaType::Video,
        Some("document") => MediaType::Document,
        _ => return Err(Error::UnsupportedMessageType),
    };

    Ok(MediaContent {
        media_type,
        url: string_field(media, "url"),
        name: opt_string_field(media, "name"),
        size_bytes: media
            .get("size")
            .or_else(|| media.get("sizeBytes"))
            .and_then(Value::as_u64),
        text: opt_string_field(media, "text"),
    })
}

/// Actions under whichever suggestion spelling the message uses.
fn suggestions_of(message: &Value) -> Vec<Action> {
    adapt_suggestions(
        format::truthy_field(message, "suggestions")
            .or_else(|| format::truthy_field(message, "suggestedActions")),
    )
}

/// Lenient where the validator is precise: non-array containers and
/// unlabeled entries map to nothing instead of failing the message.
fn adapt_suggestions(container: Option<&Value>) -> Vec<Action> {
    container
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(adapt_suggestion).collect())
        .unwrap_or_default()
}

fn adapt_suggestion(entry: &Value) -> Option<Action> {
    if let Some(action) = format::truthy_field(entry, "action").filter(|v| v.is_object()) {
        return Some(Action {
            display_label: string_field(action, "text"),
            postback_data: string_field(action, "postbackData"),
            variant: ActionVariant::Secondary,
            url: action
                .get("openUrlAction")
                .and_then(|open| open.get("url"))
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }

    let display_label = first_string(entry, &["text", "label"])?;
    Some(Action {
        display_label,
        postback_data: first_string(entry, &["postbackData", "action"]).unwrap_or_default(),
        variant: variant_from(entry.get("type")),
        url: None,
    })
}

fn variant_from(kind: Option<&Value>) -> ActionVariant {
    match kind.and_then(Value::as_str) {
        Some("primary") => ActionVariant::Primary,
        Some("reply") => ActionVariant::Reply,
        _ => ActionVariant::Secondary,
    }
}

fn first_string(value: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        format::truthy_field(value, field)
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

fn string_field(value: &Value, field: &str) -> String {
    format::truthy_field(value, field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_string_field(value: &Value, field: &str) -> Option<String> {
    format::truthy_field(value, field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn text_of(text: &Value) -> String {
    match text {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ── Canonical → wire ─────────────────────────────────────────────────────────

/// Render a canonical envelope into the GSMA wire shape.
pub fn to_wire(envelope: &MessageEnvelope) -> Value {
    json!({
        "messageId": envelope.message_id,
        "conversationId": envelope.conversation_id,
        "participantId": envelope.participant_id,
        "messages": envelope.messages.iter().map(message_to_wire).collect::<Vec<_>>(),
    })
}

/// Wire form of one canonical message.
pub fn message_to_wire(message: &CanonicalMessage) -> Value {
    match message {
        CanonicalMessage::Text { text, suggested_actions } => {
            let mut wire = json!({"text": text});
            if !suggested_actions.is_empty()
                && let Some(fields) = wire.as_object_mut()
            {
                fields.insert("suggestions".to_string(), actions_to_wire(suggested_actions));
            }
            wire
        }
        CanonicalMessage::RichCard { rich_card } => {
            let mut content = json!({
                "title": rich_card.title,
                "description": rich_card.description,
                "suggestions": actions_to_wire(&rich_card.actions),
            });
            if !rich_card.image.is_empty()
                && let Some(fields) = content.as_object_mut()
            {
                fields.insert(
                    "media".to_string(),
                    json!({
                        "height": "MEDIUM",
                        "contentInfo": {"fileUrl": rich_card.image, "mimeType": "image/jpeg"},
                    }),
                );
            }
            json!({"richCard": {"standaloneCard": {"cardContent": content}}})
        }
        CanonicalMessage::Carousel { .. } => text_fallback(message, None),
        CanonicalMessage::Media { media } => text_fallback(message, media.text.as_deref()),
    }
}

/// Kinds with no wire mapping still produce something displayable.
fn text_fallback(message: &CanonicalMessage, caption: Option<&str>) -> Value {
    tracing::debug!(kind = message.kind(), "no wire mapping for message kind, sending text");
    json!({"text": caption.unwrap_or("Unknown message type")})
}

fn actions_to_wire(actions: &[Action]) -> Value {
    let entries: Vec<Value> = actions
        .iter()
        .map(|action| {
            let mut inner = json!({
                "text": action.display_label,
                "postbackData": action.postback_data,
            });
            if let Some(url) = &action.url
                && let Some(fields) = inner.as_object_mut()
            {
                fields.insert("openUrlAction".to_string(), json!({"url": url}));
            }
            json!({"action": inner})
        })
        .collect();
    Value::Array(entries)
}
