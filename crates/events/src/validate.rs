//! Staged validation of raw RBM callback payloads.
//!
//! Three gates: basic structure, type-specific fields, data formats. A
//! stage only runs when every earlier stage passed clean, so a payload
//! missing its `eventType` never produces type-specific noise. Errors
//! accumulate within a stage.

use serde_json::Value;

use crate::{
    error::{Error, Result},
    types::{RbmEvent, iso},
};

const REQUIRED_FIELDS: [&str; 5] =
    ["eventType", "eventId", "timestamp", "conversationId", "participantId"];
const VALID_EVENT_TYPES: [&str; 5] =
    ["userMessage", "chatState", "suggestionResponse", "deliveryReceipt", "readReceipt"];
const VALID_CHAT_STATES: [&str; 2] = ["composing", "idle"];
const VALID_RESPONSE_TYPES: [&str; 2] = ["action", "reply"];
const EVENT_ID_MAX_LEN: usize = 256;

/// Outcome of validating one raw event payload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Validate a raw callback payload without consuming it.
pub fn validate(event: &Value) -> EventValidation {
    let mut errors = Vec::new();

    validate_structure(event, &mut errors);
    if errors.is_empty() {
        validate_type_fields(event, &mut errors);
    }
    if errors.is_empty() {
        validate_data_formats(event, &mut errors);
    }

    EventValidation { is_valid: errors.is_empty(), errors }
}

/// Validate, then convert into the typed model. Downstream code only ever
/// sees well-formed events.
pub fn parse_event(value: &Value) -> Result<RbmEvent> {
    let validation = validate(value);
    if !validation.is_valid {
        return Err(Error::invalid(validation.errors));
    }
    serde_json::from_value(value.clone()).map_err(|e| Error::malformed(e.to_string()))
}

// ── Stage 1: basic structure ─────────────────────────────────────────────────

fn validate_structure(event: &Value, errors: &mut Vec<String>) {
    if !event.is_object() {
        errors.push("Event must be a valid object".to_string());
        return;
    }

    for field in REQUIRED_FIELDS {
        if truthy_field(event, field).is_none() {
            errors.push(format!("Missing required field: {field}"));
        }
    }

    if let Some(kind) = truthy_field(event, "eventType")
        && !VALID_EVENT_TYPES.contains(&kind.as_str().unwrap_or_default())
    {
        errors.push(format!(
            "Invalid eventType: {}. Must be one of: {}",
            display_value(kind),
            VALID_EVENT_TYPES.join(", ")
        ));
    }
}

// ── Stage 2: type-specific fields ────────────────────────────────────────────

fn validate_type_fields(event: &Value, errors: &mut Vec<String>) {
    match truthy_field(event, "eventType").and_then(Value::as_str) {
        Some("userMessage") => {
            if truthy_field(event, "messageId").is_none() {
                errors.push("userMessage events must have messageId".to_string());
            }
            match truthy_field(event, "content") {
                None => errors.push("userMessage events must have content".to_string()),
                Some(content) => {
                    if truthy_field(content, "text").is_none()
                        && truthy_field(content, "media").is_none()
                    {
                        errors
                            .push("userMessage content must have either text or media".to_string());
                    }
                }
            }
        }
        Some("chatState") => match truthy_field(event, "state") {
            None => errors.push("chatState events must have state field".to_string()),
            Some(state) => {
                if !VALID_CHAT_STATES.contains(&state.as_str().unwrap_or_default()) {
                    errors.push(format!(
                        "Invalid chatState: {}. Must be one of: composing, idle",
                        display_value(state)
                    ));
                }
            }
        },
        Some("suggestionResponse") => {
            for field in ["sourceMessageId", "postbackData", "displayText"] {
                if truthy_field(event, field).is_none() {
                    errors.push(format!("suggestionResponse events must have {field}"));
                }
            }
            if let Some(kind) = truthy_field(event, "responseType")
                && !VALID_RESPONSE_TYPES.contains(&kind.as_str().unwrap_or_default())
            {
                errors.push(format!(
                    "Invalid responseType: {}. Must be one of: action, reply",
                    display_value(kind)
                ));
            }
        }
        Some("deliveryReceipt") => {
            validate_receipt(event, "deliveryReceipt", "deliveredTimestamp", errors);
        }
        Some("readReceipt") => validate_receipt(event, "readReceipt", "readTimestamp", errors),
        _ => {}
    }
}

fn validate_receipt(event: &Value, kind: &str, timestamp_field: &str, errors: &mut Vec<String>) {
    if truthy_field(event, "messageId").is_none() {
        errors.push(format!("{kind} events must have messageId"));
    }
    if truthy_field(event, timestamp_field).is_none() {
        errors.push(format!("{kind} events must have {timestamp_field}"));
    }
}

// ── Stage 3: data formats ────────────────────────────────────────────────────

fn validate_data_formats(event: &Value, errors: &mut Vec<String>) {
    if let Some(participant) = truthy_field(event, "participantId")
        && !participant.as_str().is_some_and(is_msisdn)
    {
        errors.push(format!(
            "Invalid participantId format: {}. Should be MSISDN format (e.g., +15551234567)",
            display_value(participant)
        ));
    }

    if let Some(timestamp) = truthy_field(event, "timestamp")
        && !timestamp.as_str().is_some_and(is_strict_iso)
    {
        errors.push(format!(
            "Invalid timestamp format: {}. Should be ISO 8601 format",
            display_value(timestamp)
        ));
    }

    if let Some(event_id) = truthy_field(event, "eventId")
        && !event_id
            .as_str()
            .is_some_and(|id| !id.is_empty() && id.len() < EVENT_ID_MAX_LEN)
    {
        errors.push(format!(
            "Invalid eventId format: {}. Should be unique identifier",
            display_value(event_id)
        ));
    }
}

/// MSISDN shape (`^\+[1-9]\d{1,14}$`): a plus sign, a nonzero digit, then
/// one to fourteen more digits.
fn is_msisdn(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('+') else {
        return false;
    };
    (2..=15).contains(&digits.len())
        && !digits.starts_with('0')
        && digits.chars().all(|c| c.is_ascii_digit())
}

/// The `new Date(t).toISOString() === t` check: parse as RFC 3339 and
/// require the UTC millisecond rendering to reproduce the input exactly.
fn is_strict_iso(value: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(value)
        .is_ok_and(|at| iso::render(&at.with_timezone(&chrono::Utc)) == value)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|f| f != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy_field<'a>(event: &'a Value, field: &str) -> Option<&'a Value> {
    event.get(field).filter(|value| truthy(value))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
