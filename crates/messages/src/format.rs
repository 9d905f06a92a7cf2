//! Wire-format classification for inbound chat payloads.

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::fmt,
};

use crate::error::{Error, Result};

pub(crate) const NOT_AN_OBJECT: &str = "Message must be a valid JSON object";
pub(crate) const ROOT_IS_ARRAY: &str =
    "Root level cannot be an array - use {messages: [...]} format";

/// Fields whose presence marks a payload as a single message.
pub(crate) const SINGLE_PROBES: [&str; 5] = ["type", "text", "richCard", "carousel", "media"];

/// The closed set of accepted wire shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayloadFormat {
    /// `{messages: [...]}` with one or more entries.
    ArrayFormat,
    /// A bare message object (`text`, `richCard`, `carousel`, `media`, or
    /// `type`-tagged).
    SingleFormat,
}

impl PayloadFormat {
    /// The camelCase name used on the wire and in log lines.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            PayloadFormat::ArrayFormat => "arrayFormat",
            PayloadFormat::SingleFormat => "singleFormat",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Classify a raw payload. Pure; first matching rule wins.
pub fn detect(payload: &Value) -> Result<PayloadFormat> {
    structural_check(payload)?;

    if truthy_field(payload, "messages")
        .and_then(Value::as_array)
        .is_some_and(|messages| !messages.is_empty())
    {
        return Ok(PayloadFormat::ArrayFormat);
    }

    if SINGLE_PROBES
        .iter()
        .any(|field| truthy_field(payload, field).is_some())
    {
        return Ok(PayloadFormat::SingleFormat);
    }

    Err(Error::UnknownFormat)
}

/// Reject non-object roots before any classification.
pub(crate) fn structural_check(payload: &Value) -> Result<()> {
    match payload {
        Value::Object(_) => Ok(()),
        Value::Array(_) => Err(Error::structural(ROOT_IS_ARRAY)),
        _ => Err(Error::structural(NOT_AN_OBJECT)),
    }
}

/// JS-style truthiness: null, false, 0 and "" all count as absent. The
/// original emulator branches on truthiness rather than key presence, and
/// edge cases like `{text: ""}` depend on it.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|f| f != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn truthy_field<'a>(payload: &'a Value, field: &str) -> Option<&'a Value> {
    payload.get(field).filter(|value| truthy(value))
}
