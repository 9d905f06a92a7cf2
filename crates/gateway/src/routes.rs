//! HTTP handlers for the RBM callback surface.

use {
    axum::{
        Json,
        body::Bytes,
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    chrono::Utc,
    serde::Deserialize,
    serde_json::{Value, json},
    std::{sync::Arc, time::Instant},
    tracing::{error, info, warn},
};

use upwire_events::{EventType, iso, parse_event};

use crate::state::{CallbackState, SERVICE_NAME};

// ── POST /api/rbm/callback ───────────────────────────────────────────────────

/// Receive one GSMA UP event: validate, dedupe, route, track, then hand the
/// result to the forwarding sink on a detached task.
pub async fn handle_callback(State(state): State<Arc<CallbackState>>, body: Bytes) -> Response {
    let received = Instant::now();

    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing request body", None);
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "callback body is not JSON");
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body", None);
        }
    };

    let event = match parse_event(&payload) {
        Ok(event) => event,
        Err(upwire_events::Error::Invalid { errors }) => {
            for message in &errors {
                warn!(error = %message, "event validation failed");
            }
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid GSMA UP event format",
                Some(&errors),
            );
        }
        Err(e) => return processing_failure(&e.to_string(), received),
    };

    if state.dedupe().check_and_insert(&event.event_id) {
        warn!(event_id = %event.event_id, "duplicate event dropped");
        return error_response(StatusCode::BAD_REQUEST, "Duplicate eventId", None);
    }

    let result = match state.router.route(&event) {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, event_id = %event.event_id, "event processing failed");
            return processing_failure(&e.to_string(), received);
        }
    };

    let outcome = state.tracker().update(&event);
    state.record_event();
    info!(
        event_id = %event.event_id,
        conversation_id = %outcome.conversation_id,
        state = ?outcome.state,
        "event processed"
    );

    let event_id = event.event_id.clone();
    let event_type = event.event_type();
    let sink = Arc::clone(&state.sink);
    tokio::spawn(async move {
        sink.deliver(&event, &result).await;
    });

    Json(json!({
        "success": true,
        "eventId": event_id,
        "eventType": event_type,
        "processed": true,
        "processingTime": elapsed_ms(received),
    }))
    .into_response()
}

fn error_response(status: StatusCode, message: &str, errors: Option<&[String]>) -> Response {
    let mut body = json!({
        "success": false,
        "error": message,
        "timestamp": iso::render(&Utc::now()),
    });
    if let (Some(errors), Some(envelope)) = (errors, body.as_object_mut()) {
        envelope.insert("errors".to_string(), json!(errors));
    }
    (status, Json(body)).into_response()
}

fn processing_failure(message: &str, received: Instant) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "Internal server error",
            "message": message,
            "processingTime": elapsed_ms(received),
        })),
    )
        .into_response()
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

// ── GET /api/rbm/callback ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ValidationQuery {
    challenge: Option<String>,
    #[serde(rename = "hub.challenge")]
    hub_challenge: Option<String>,
}

/// Webhook validation: echo the challenge as plain text when one is sent,
/// otherwise report readiness.
pub async fn handle_validation(Query(query): Query<ValidationQuery>) -> Response {
    if let Some(challenge) = query.challenge.or(query.hub_challenge) {
        info!(challenge = %challenge, "webhook validation challenge");
        return challenge.into_response();
    }
    Json(json!({
        "service": SERVICE_NAME,
        "validation": "ready",
        "timestamp": iso::render(&Utc::now()),
    }))
    .into_response()
}

// ── GET /api/rbm/status ──────────────────────────────────────────────────────

pub async fn handle_status(State(state): State<Arc<CallbackState>>) -> impl IntoResponse {
    let uptime = state.uptime_ms();
    let (conversation_count, active_conversations) = {
        let tracker = state.tracker();
        (tracker.conversation_count(), tracker.active_count())
    };
    let supported: Vec<&str> = EventType::ALL.iter().map(|kind| kind.wire_name()).collect();

    Json(json!({
        "service": SERVICE_NAME,
        "status": "healthy",
        "uptime": uptime,
        "uptimeFormatted": format_uptime(uptime),
        "startTime": iso::render(state.started_at()),
        "eventsProcessed": state.events_processed(),
        "conversationCount": conversation_count,
        "activeConversations": active_conversations,
        "supportedEventTypes": supported,
        "forwarding": state.sink.stats(),
        "endpoints": {
            "callback": "POST /api/rbm/callback",
            "status": "GET /api/rbm/status",
        },
    }))
}

/// Human uptime, widest nonzero unit first: `2d 3h 4m`, `1m 5s`, `42s`.
fn format_uptime(uptime_ms: u64) -> String {
    let seconds = uptime_ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days}d {}h {}m", hours % 24, minutes % 60)
    } else if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m {}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

// ── GET /api/rbm/conversations ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ListQuery {
    limit: Option<usize>,
}

/// Conversation listing, newest tail first-to-last; `limit` bounds the rows.
pub async fn list_conversations(
    State(state): State<Arc<CallbackState>>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let tracker = state.tracker();
    let conversations = match query.limit {
        Some(limit) => tracker.recent_conversations(limit),
        None => tracker.all_conversations(),
    };
    Json(json!({ "count": conversations.len(), "conversations": conversations }))
}

// ── GET /api/rbm/conversations/{id} ──────────────────────────────────────────

pub async fn conversation_detail(
    State(state): State<Arc<CallbackState>>,
    Path(id): Path<String>,
) -> Response {
    let tracker = state.tracker();
    match (tracker.conversation(&id), tracker.conversation_stats(&id)) {
        (Some(conversation), Some(stats)) => {
            Json(json!({ "conversation": conversation, "stats": stats })).into_response()
        }
        _ => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": "conversation not found" })))
                .into_response()
        }
    }
}

// ── GET /health ──────────────────────────────────────────────────────────────

pub async fn health(State(state): State<Arc<CallbackState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": state.version,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formatting_tiers_by_magnitude() {
        assert_eq!(format_uptime(5_000), "5s");
        assert_eq!(format_uptime(65_000), "1m 5s");
        assert_eq!(format_uptime(7_500_000), "2h 5m");
        assert_eq!(format_uptime(183_840_000), "2d 3h 4m");
    }

    #[test]
    fn sub_second_uptime_rounds_down_to_zero() {
        assert_eq!(format_uptime(999), "0s");
    }
}
