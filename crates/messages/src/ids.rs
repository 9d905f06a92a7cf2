//! Identity defaults for payloads that arrive without them.

use {
    rand::Rng,
    serde::Serialize,
    serde_json::Value,
    std::time::{SystemTime, UNIX_EPOCH},
};

use crate::format;

/// Fallback sender when the payload names no participant.
pub const DEFAULT_PARTICIPANT: &str = "+15551234567";

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// The identity triple a payload is normalized under. Explicit values from
/// the payload win; the rest are generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDefaults {
    pub message_id: String,
    pub conversation_id: String,
    pub participant_id: String,
}

/// Fill in whichever identity fields the payload leaves out. Never touches
/// the payload itself.
pub fn assign_defaults(payload: &Value) -> MessageDefaults {
    let now = now_ms();
    MessageDefaults {
        message_id: explicit(payload, "messageId")
            .unwrap_or_else(|| format!("msg_{now}_{}", base36_suffix(SUFFIX_LEN))),
        conversation_id: explicit(payload, "conversationId")
            .unwrap_or_else(|| format!("conv_{now}")),
        participant_id: explicit(payload, "participantId")
            .unwrap_or_else(|| DEFAULT_PARTICIPANT.to_string()),
    }
}

fn explicit(payload: &Value, field: &str) -> Option<String> {
    format::truthy_field(payload, field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn base36_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
