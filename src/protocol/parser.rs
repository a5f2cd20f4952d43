//! Single-payload parser for bridge stream lines.

use serde_json::Value;

use crate::protocol::StreamEvent;

/// SSE end-of-stream sentinel emitted by some bridge builds.
const DONE_SENTINEL: &str = "[DONE]";

/// Outcome of parsing one reassembled payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedUnit {
    /// A decoded protocol event.
    Event(StreamEvent),
    /// Whitespace or an SSE sentinel; skipped without comment.
    Ignorable,
    /// A payload that could not be shaped into an event.
    Failed {
        /// What went wrong.
        reason: String,
        /// The offending payload, verbatim.
        raw: String,
    },
}

impl ParsedUnit {
    fn failed(reason: impl Into<String>, raw: &str) -> Self {
        Self::Failed {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}

/// Parse one payload into a unit.
///
/// Blank input and the `[DONE]` sentinel are `Ignorable`, never errors.
/// Anything else that fails to decode comes back as `Failed` so a single
/// bad payload cannot abort a session. Unrecognized event types decode
/// into [`StreamEvent::Unknown`] and are not failures.
#[must_use]
pub fn parse_unit(text: &str) -> ParsedUnit {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == DONE_SENTINEL {
        return ParsedUnit::Ignorable;
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(e) => return ParsedUnit::failed(format!("invalid JSON: {e}"), trimmed),
    };

    let event_type = match &value {
        Value::Object(map) => match map.get("type") {
            Some(Value::String(event_type)) => event_type.clone(),
            Some(_) => return ParsedUnit::failed("`type` field is not a string", trimmed),
            None => return ParsedUnit::failed("missing `type` field", trimmed),
        },
        _ => return ParsedUnit::failed("payload is not a JSON object", trimmed),
    };

    match serde_json::from_value::<StreamEvent>(value) {
        Ok(event) => ParsedUnit::Event(event),
        Err(e) => ParsedUnit::failed(format!("malformed `{event_type}` event: {e}"), trimmed),
    }
}
