//! Postback intent classification for suggestion responses.

use serde::{Deserialize, Serialize};

/// What a tapped suggestion means for the business flow. Advisory only:
/// classification feeds logs and forwarded payloads, never gates routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub action: String,
    pub intent: String,
    pub next_step: String,
    pub description: String,
}

/// Map a postback token to its business intent. Unknown tokens classify as
/// `unknown`/`log_and_continue` with the display text folded into the
/// description.
#[must_use]
pub fn classify_postback(postback: &str, display_text: &str) -> ActionOutcome {
    let (intent, next_step, description) = match postback {
        "view_products" => {
            ("product_inquiry", "show_catalog", "User wants to browse products".to_string())
        }
        "place_order" => (
            "purchase_intent",
            "collect_order_details",
            "User wants to make a purchase".to_string(),
        ),
        "contact_support" => {
            ("support_request", "route_to_agent", "User needs assistance".to_string())
        }
        "find_store" => (
            "location_inquiry",
            "request_location",
            "User wants to find nearby store".to_string(),
        ),
        _ => ("unknown", "log_and_continue", format!("Generic action: {display_text}")),
    };

    ActionOutcome {
        action: postback.to_string(),
        intent: intent.to_string(),
        next_step: next_step.to_string(),
        description,
    }
}
