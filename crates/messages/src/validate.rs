//! Payload validation with accumulated, user-presentable errors.
//!
//! The validator never fails the caller: every rule violation lands in the
//! returned error list so a UI can report all of them at once. Only the
//! structural stage (wrong root shape) short-circuits.

use {
    serde::Serialize,
    serde_json::Value,
};

use crate::{
    error::Error,
    format::{self, PayloadFormat},
};

const VALID_TYPES: [&str; 3] = ["text", "richCard", "media"];
const ID_FIELDS: [&str; 3] = ["messageId", "conversationId", "participantId"];

/// Outcome of validating one inbound chat payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    /// `None` when no known format matched (or the root shape was wrong).
    pub format: Option<PayloadFormat>,
    /// True iff at least one identity field is present in the raw payload.
    pub has_explicit_ids: bool,
}

/// Validate a raw payload against the rules of its detected format.
pub fn validate(payload: &Value) -> MessageValidation {
    if let Err(error) = format::structural_check(payload) {
        return MessageValidation {
            valid: false,
            errors: vec![error.to_string()],
            format: None,
            has_explicit_ids: false,
        };
    }

    let mut errors = Vec::new();
    let resolved = resolve_and_validate_format(payload, &mut errors);
    validate_id_fields(payload, &mut errors);

    MessageValidation {
        valid: errors.is_empty(),
        errors,
        format: resolved,
        has_explicit_ids: has_explicit_ids(payload),
    }
}

pub(crate) fn has_explicit_ids(payload: &Value) -> bool {
    ID_FIELDS
        .iter()
        .any(|field| format::truthy_field(payload, field).is_some())
}

// ── Format resolution ────────────────────────────────────────────────────────

/// A present `messages` key always resolves to the array format, even when
/// malformed, so the "must be an array" / "cannot be empty" errors keep
/// their locality instead of collapsing into the unknown-format error.
fn resolve_and_validate_format(payload: &Value, errors: &mut Vec<String>) -> Option<PayloadFormat> {
    if let Some(messages) = format::truthy_field(payload, "messages") {
        match messages.as_array() {
            None => errors.push("Messages field must be an array".to_string()),
            Some(list) if list.is_empty() => {
                errors.push("Messages array cannot be empty".to_string());
            }
            Some(list) => {
                for (index, message) in list.iter().enumerate() {
                    validate_message(message, errors, &format!("Message {}", index + 1));
                }
            }
        }
        return Some(PayloadFormat::ArrayFormat);
    }

    if format::SINGLE_PROBES
        .iter()
        .any(|field| format::truthy_field(payload, field).is_some())
    {
        validate_message(payload, errors, "Message");
        return Some(PayloadFormat::SingleFormat);
    }

    errors.push(Error::UnknownFormat.to_string());
    None
}

// ── Per-message rules ────────────────────────────────────────────────────────

fn validate_message(message: &Value, errors: &mut Vec<String>, context: &str) {
    if let Some(text) = format::truthy_field(message, "text") {
        validate_text(text, message, errors, context);
    } else if let Some(rich_card) = format::truthy_field(message, "richCard") {
        validate_rich_card(rich_card, errors, context);
    } else if let Some(kind) = format::truthy_field(message, "type") {
        validate_typed(kind, message, errors, context);
    } else {
        errors.push(format!("{context}: Must have text, richCard, or type field"));
    }
}

fn validate_text(text: &Value, message: &Value, errors: &mut Vec<String>, context: &str) {
    if text.as_str().is_none_or(|t| t.trim().is_empty()) {
        errors.push(format!("{context}: Text field must be a non-empty string"));
    }
    if let Some(suggestions) = format::truthy_field(message, "suggestions") {
        validate_suggestions(suggestions, errors, context);
    }
}

fn validate_rich_card(rich_card: &Value, errors: &mut Vec<String>, context: &str) {
    let Some(standalone) = format::truthy_field(rich_card, "standaloneCard") else {
        errors.push(format!("{context}: Rich card must have standaloneCard structure"));
        return;
    };
    let Some(content) = format::truthy_field(standalone, "cardContent") else {
        errors.push(format!("{context}: Standalone card must have cardContent"));
        return;
    };

    if format::truthy_field(content, "title")
        .and_then(Value::as_str)
        .is_none()
    {
        errors.push(format!("{context}: Card must have a title string"));
    }
    if let Some(suggestions) = format::truthy_field(content, "suggestions") {
        validate_suggestions(suggestions, errors, context);
    }
}

fn validate_typed(kind: &Value, message: &Value, errors: &mut Vec<String>, context: &str) {
    let name = kind.as_str().unwrap_or_default();
    if !VALID_TYPES.contains(&name) {
        errors.push(format!(
            "{context}: Invalid type \"{}\" - must be: {}",
            display_value(kind),
            VALID_TYPES.join(", ")
        ));
    }

    // Only reachable with a falsy `text`, so type=text always trips this.
    if name == "text"
        && format::truthy_field(message, "text")
            .and_then(Value::as_str)
            .is_none()
    {
        errors.push(format!("{context}: Text type messages must have text field"));
    }
}

fn validate_suggestions(suggestions: &Value, errors: &mut Vec<String>, context: &str) {
    let Some(entries) = suggestions.as_array() else {
        errors.push(format!("{context}: Suggestions must be an array"));
        return;
    };

    for (index, entry) in entries.iter().enumerate() {
        let scoped = format!("{context} suggestion {}", index + 1);
        match format::truthy_field(entry, "action") {
            Some(action) => validate_action(action, errors, &scoped),
            None => errors.push(format!("{scoped}: Must have action field")),
        }
    }
}

fn validate_action(action: &Value, errors: &mut Vec<String>, context: &str) {
    if format::truthy_field(action, "text")
        .and_then(Value::as_str)
        .is_none()
    {
        errors.push(format!("{context}: Action must have text field"));
    }
    if format::truthy_field(action, "postbackData")
        .and_then(Value::as_str)
        .is_none()
    {
        errors.push(format!("{context}: Action must have postbackData field"));
    }
}

fn validate_id_fields(payload: &Value, errors: &mut Vec<String>) {
    for field in ID_FIELDS {
        if let Some(value) = format::truthy_field(payload, field)
            && !value.is_string()
        {
            errors.push(format!("{field} must be a string"));
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_payload_is_valid_without_ids() {
        let report = validate(&serde_json::json!({"text": "hi"}));
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert_eq!(report.format, Some(PayloadFormat::SingleFormat));
        assert!(!report.has_explicit_ids);
    }

    #[test]
    fn array_payload_validates_every_element_with_index_labels() {
        let report = validate(&serde_json::json!({
            "messages": [{"text": "a"}, {"nonsense": true}]
        }));
        assert!(!report.valid);
        assert_eq!(report.format, Some(PayloadFormat::ArrayFormat));
        assert_eq!(
            report.errors,
            vec!["Message 2: Must have text, richCard, or type field".to_string()]
        );
    }

    #[test]
    fn empty_messages_array_is_rejected() {
        let report = validate(&serde_json::json!({"messages": []}));
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Messages array cannot be empty".to_string()]);
        assert_eq!(report.format, Some(PayloadFormat::ArrayFormat));
    }

    #[test]
    fn non_array_messages_field_is_rejected() {
        let report = validate(&serde_json::json!({"messages": "x"}));
        assert_eq!(report.errors, vec!["Messages field must be an array".to_string()]);
    }

    #[test]
    fn suggestion_without_postback_reports_scoped_error() {
        let report = validate(&serde_json::json!({
            "text": "go",
            "suggestions": [{"action": {"text": "Yes"}}]
        }));
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec!["Message suggestion 1: Action must have postbackData field".to_string()]
        );
    }

    #[test]
    fn suggestion_without_action_reports_scoped_error() {
        let report = validate(&serde_json::json!({
            "text": "go",
            "suggestions": [{"text": "legacy", "postbackData": "x"}]
        }));
        assert_eq!(
            report.errors,
            vec!["Message suggestion 1: Must have action field".to_string()]
        );
    }

    #[test]
    fn blank_text_is_not_a_text_message() {
        // Truthiness probe: "" falls through every branch.
        let report = validate(&serde_json::json!({"text": ""}));
        assert_eq!(
            report.errors,
            vec![Error::UnknownFormat.to_string()]
        );
        assert_eq!(report.format, None);

        let report = validate(&serde_json::json!({"text": "   "}));
        assert_eq!(
            report.errors,
            vec!["Message: Text field must be a non-empty string".to_string()]
        );
    }

    #[test]
    fn rich_card_requires_nesting_and_title() {
        let report = validate(&serde_json::json!({"richCard": {"flat": true}}));
        assert_eq!(
            report.errors,
            vec!["Message: Rich card must have standaloneCard structure".to_string()]
        );

        let report = validate(&serde_json::json!({
            "richCard": {"standaloneCard": {"cardContent": {"description": "no title"}}}
        }));
        assert_eq!(
            report.errors,
            vec!["Message: Card must have a title string".to_string()]
        );
    }

    #[test]
    fn typed_messages_check_the_type_enum() {
        let report = validate(&serde_json::json!({"type": "carousel"}));
        assert_eq!(
            report.errors,
            vec!["Message: Invalid type \"carousel\" - must be: text, richCard, media".to_string()]
        );

        let report = validate(&serde_json::json!({"type": "text"}));
        assert_eq!(
            report.errors,
            vec!["Message: Text type messages must have text field".to_string()]
        );
    }

    #[test]
    fn id_fields_must_be_strings_when_present() {
        let report = validate(&serde_json::json!({"text": "hi", "messageId": 7}));
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["messageId must be a string".to_string()]);
        assert!(report.has_explicit_ids);
    }

    #[test]
    fn any_single_explicit_id_flips_the_flag() {
        for field in ID_FIELDS {
            let report = validate(&serde_json::json!({"text": "hi", field: "some-id"}));
            assert!(report.has_explicit_ids, "{field} should count as explicit");
        }
    }

    #[test]
    fn structural_errors_short_circuit() {
        let report = validate(&serde_json::json!([1, 2]));
        assert_eq!(
            report.errors,
            vec!["Root level cannot be an array - use {messages: [...]} format".to_string()]
        );
        assert_eq!(report.format, None);
        assert!(!report.has_explicit_ids);

        let report = validate(&serde_json::json!("just text"));
        assert_eq!(report.errors, vec!["Message must be a valid JSON object".to_string()]);
    }

    #[test]
    fn errors_accumulate_within_a_message() {
        let report = validate(&serde_json::json!({
            "text": "   ",
            "suggestions": [{"action": {}}]
        }));
        assert_eq!(
            report.errors,
            vec![
                "Message: Text field must be a non-empty string".to_string(),
                "Message suggestion 1: Action must have text field".to_string(),
                "Message suggestion 1: Action must have postbackData field".to_string(),
            ]
        );
    }
}
