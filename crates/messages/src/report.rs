//! User-facing presentation of validation errors.

use {serde::Serialize, std::fmt};

use crate::validate::MessageValidation;

/// Coarse buckets the dev panel groups errors under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Format,
    Structure,
    Value,
    General,
}

impl ErrorCategory {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Format => "format",
            ErrorCategory::Structure => "structure",
            ErrorCategory::Value => "value",
            ErrorCategory::General => "general",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One validation error, categorized and with a friendly rendering. The
/// `technical` field always carries the untouched original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedError {
    #[serde(rename = "type")]
    pub category: ErrorCategory,
    pub message: String,
    pub technical: String,
}

/// Keyword-based bucketing; first match wins, so "Invalid type ... must be"
/// lands in `format` rather than `value`.
pub fn categorize(error: &str) -> ErrorCategory {
    if error.contains("must be") || error.contains("must have") {
        ErrorCategory::Format
    } else if error.contains("cannot be") {
        ErrorCategory::Structure
    } else if error.contains("Invalid") {
        ErrorCategory::Value
    } else {
        ErrorCategory::General
    }
}

/// Friendly phrasing for the handful of errors users hit most. Everything
/// else (including context-scoped variants) passes through unchanged.
pub fn humanize(error: &str) -> &str {
    match error {
        "Messages field must be an array" => {
            "The \"messages\" field should contain a list of messages"
        }
        "Messages array cannot be empty" => "You need to include at least one message",
        "Action must have text field" => "Button actions need display text",
        "Action must have postbackData field" => "Button actions need postback data for processing",
        other => other,
    }
}

/// Expand a validation outcome into presentable errors; empty when valid.
pub fn validation_report(validation: &MessageValidation) -> Vec<ReportedError> {
    validation
        .errors
        .iter()
        .map(|error| ReportedError {
            category: categorize(error),
            message: humanize(error).to_string(),
            technical: error.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_pick_the_category() {
        assert_eq!(categorize("Messages field must be an array"), ErrorCategory::Format);
        assert_eq!(
            categorize("Message suggestion 1: Action must have postbackData field"),
            ErrorCategory::Format
        );
        assert_eq!(categorize("Messages array cannot be empty"), ErrorCategory::Structure);
        assert_eq!(
            categorize("Invalid eventType: bogus. Must be one of: userMessage"),
            ErrorCategory::Value
        );
        assert_eq!(categorize("Something else entirely"), ErrorCategory::General);
    }

    #[test]
    fn invalid_type_errors_prefer_the_format_bucket() {
        // Contains both "Invalid" and "must be"; the first keyword wins.
        assert_eq!(
            categorize("Message: Invalid type \"x\" - must be: text, richCard, media"),
            ErrorCategory::Format
        );
    }

    #[test]
    fn humanize_only_rewrites_exact_matches() {
        assert_eq!(humanize("Messages array cannot be empty"), "You need to include at least one message");
        assert_eq!(
            humanize("Message suggestion 1: Action must have postbackData field"),
            "Message suggestion 1: Action must have postbackData field"
        );
    }

    #[test]
    fn report_carries_category_message_and_technical() {
        let validation = crate::validate::validate(&serde_json::json!({
            "text": "go",
            "suggestions": [{"action": {"text": "Yes"}}]
        }));
        let report = validation_report(&validation);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].category, ErrorCategory::Format);
        assert_eq!(report[0].technical, "Message suggestion 1: Action must have postbackData field");

        let rendered = serde_json::to_value(&report[0]).ok();
        assert_eq!(
            rendered.as_ref().and_then(|v| v.get("type")),
            Some(&serde_json::json!("format"))
        );
    }

    #[test]
    fn valid_payloads_report_nothing() {
        let validation = crate::validate::validate(&serde_json::json!({"text": "hi"}));
        assert!(validation_report(&validation).is_empty());
    }
}
