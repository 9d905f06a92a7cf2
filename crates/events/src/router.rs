//! Event routing: a per-type handler registry with typed results.

use {
    serde::{Deserialize, Serialize},
    std::collections::HashMap,
};

use crate::{
    error::{Error, Result},
    intent::{self, ActionOutcome},
    types::{ChatState, EventDetail, EventType, RbmEvent},
};

/// A handler for one event type. Handlers are pure over the event and never
/// touch conversation state; the caller applies the tracker update only
/// after routing succeeds.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &RbmEvent) -> Result<ProcessingResult>;
}

impl<F> EventHandler for F
where
    F: Fn(&RbmEvent) -> Result<ProcessingResult> + Send + Sync,
{
    fn handle(&self, event: &RbmEvent) -> Result<ProcessingResult> {
        self(event)
    }
}

/// What a handler produced for one event, in the wire's response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProcessingResult {
    #[serde(rename = "userMessage", rename_all = "camelCase")]
    UserMessage {
        processed: bool,
        message_id: String,
        text: String,
    },
    #[serde(rename = "chatState", rename_all = "camelCase")]
    ChatState { processed: bool, state: ChatState },
    #[serde(rename = "suggestionResponse", rename_all = "camelCase")]
    SuggestionResponse {
        processed: bool,
        action: String,
        display_text: String,
        action_result: ActionOutcome,
    },
    #[serde(rename = "deliveryReceipt", rename_all = "camelCase")]
    DeliveryReceipt { processed: bool, message_id: String },
    #[serde(rename = "readReceipt", rename_all = "camelCase")]
    ReadReceipt { processed: bool, message_id: String },
}

/// Maps event types to boxed handlers. `Default` registers the built-in
/// handler for every type; `empty` starts blank for custom wiring.
pub struct EventRouter {
    handlers: HashMap<EventType, Box<dyn EventHandler>>,
}

impl EventRouter {
    #[must_use]
    pub fn empty() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// Register (or replace) the handler for one event type.
    pub fn register(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.handlers.insert(event_type, handler);
    }

    /// Dispatch an event to its handler. A missing registration is fatal
    /// for the event and surfaces to the caller; it is never retried.
    pub fn route(&self, event: &RbmEvent) -> Result<ProcessingResult> {
        let event_type = event.event_type();
        let handler = self.handlers.get(&event_type).ok_or(Error::NoHandler(event_type))?;
        tracing::debug!(event_type = %event_type, event_id = %event.event_id, "routing event");
        handler.handle(event)
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        let mut router = Self::empty();
        router.register(EventType::UserMessage, Box::new(handle_user_message));
        router.register(EventType::ChatState, Box::new(handle_chat_state));
        router.register(EventType::SuggestionResponse, Box::new(handle_suggestion_response));
        router.register(EventType::DeliveryReceipt, Box::new(handle_delivery_receipt));
        router.register(EventType::ReadReceipt, Box::new(handle_read_receipt));
        router
    }
}

// ── Built-in handlers ────────────────────────────────────────────────────────

fn handle_user_message(event: &RbmEvent) -> Result<ProcessingResult> {
    let EventDetail::UserMessage { message_id, content } = &event.detail else {
        return Err(mismatch("userMessage", event));
    };
    tracing::info!(
        participant = %event.participant_id,
        message_id = %message_id,
        text = %content.display_text(),
        "user message received"
    );
    Ok(ProcessingResult::UserMessage {
        processed: true,
        message_id: message_id.clone(),
        text: content.display_text().to_string(),
    })
}

fn handle_chat_state(event: &RbmEvent) -> Result<ProcessingResult> {
    let EventDetail::ChatState { state } = &event.detail else {
        return Err(mismatch("chatState", event));
    };
    tracing::debug!(participant = %event.participant_id, state = ?state, "chat state changed");
    Ok(ProcessingResult::ChatState { processed: true, state: *state })
}

fn handle_suggestion_response(event: &RbmEvent) -> Result<ProcessingResult> {
    let EventDetail::SuggestionResponse { postback_data, display_text, .. } = &event.detail else {
        return Err(mismatch("suggestionResponse", event));
    };
    let action_result = intent::classify_postback(postback_data, display_text);
    tracing::info!(
        participant = %event.participant_id,
        action = %postback_data,
        intent = %action_result.intent,
        next_step = %action_result.next_step,
        "suggestion response received"
    );
    Ok(ProcessingResult::SuggestionResponse {
        processed: true,
        action: postback_data.clone(),
        display_text: display_text.clone(),
        action_result,
    })
}

fn handle_delivery_receipt(event: &RbmEvent) -> Result<ProcessingResult> {
    let EventDetail::DeliveryReceipt { message_id, .. } = &event.detail else {
        return Err(mismatch("deliveryReceipt", event));
    };
    tracing::debug!(message_id = %message_id, "message delivered");
    Ok(ProcessingResult::DeliveryReceipt { processed: true, message_id: message_id.clone() })
}

fn handle_read_receipt(event: &RbmEvent) -> Result<ProcessingResult> {
    let EventDetail::ReadReceipt { message_id, .. } = &event.detail else {
        return Err(mismatch("readReceipt", event));
    };
    tracing::debug!(message_id = %message_id, "message read");
    Ok(ProcessingResult::ReadReceipt { processed: true, message_id: message_id.clone() })
}

// Only reachable through a registry wired to the wrong handler.
fn mismatch(expected: &str, event: &RbmEvent) -> Error {
    Error::malformed(format!("{expected} handler received a {} event", event.event_type()))
}
