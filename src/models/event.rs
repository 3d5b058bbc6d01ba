//! Wire event normalization and connection-state records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Reserved internal event name the service sends once a subscription is
/// confirmed. Routed to its own host notification, never as a plain event.
pub const SUBSCRIPTION_SUCCEEDED_EVENT: &str = "pusher_internal:subscription_succeeded";

/// A raw inbound protocol message, classified into a structured record.
///
/// `data` holds the decoded payload; a payload that fails to decode leaves
/// `data = Value::Null` and the event still propagates downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub channel_name: String,
    pub event_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub data: Value,
}

impl NormalizedEvent {
    /// Normalize a whole wire message given its event-name tag.
    ///
    /// The envelope is parsed leniently: missing fields become empty/absent
    /// rather than failing, so one malformed message never stalls the
    /// event stream.
    pub fn from_wire(event_name: &str, whole_message: &str) -> Self {
        let envelope: Value = match serde_json::from_str(whole_message) {
            Ok(v) => v,
            Err(e) => {
                warn!(event = %event_name, error = %e, "unparseable wire message");
                Value::Null
            }
        };

        let field = |key: &str| {
            envelope
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Self {
            channel_name: field("channel").unwrap_or_default(),
            event_name: field("event").unwrap_or_else(|| event_name.to_string()),
            user_id: field("user_id"),
            data: decode_payload(envelope.get("data")),
        }
    }

    /// Whether this is the reserved subscription-confirmation event.
    pub fn is_subscription_succeeded(&self) -> bool {
        self.event_name == SUBSCRIPTION_SUCCEEDED_EVENT
    }
}

/// Decode the `data` field of a wire message. The service double-encodes
/// payloads as JSON strings; structured values pass through unchanged.
/// Decode failure yields `Null` — the event is forwarded, not dropped.
fn decode_payload(data: Option<&Value>) -> Value {
    match data {
        None | Some(Value::Null) => Value::Null,
        Some(Value::String(s)) => match serde_json::from_str(s) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "event payload decode failed, forwarding null data");
                Value::Null
            }
        },
        Some(v) => v.clone(),
    }
}

/// Connection lifecycle states as the underlying client reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Connected => "CONNECTED",
            ConnectionState::Disconnecting => "DISCONNECTING",
            ConnectionState::Disconnected => "DISCONNECTED",
            ConnectionState::Reconnecting => "RECONNECTING",
        }
    }
}

/// Immutable record of one connection-state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStateChange {
    pub previous_state: ConnectionState,
    pub current_state: ConnectionState,
}
