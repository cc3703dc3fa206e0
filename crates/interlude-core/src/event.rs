//! Inbound events delivered by the messaging gateway

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A button press (or anything else) reported by the external transport
///
/// Only `payload` matters for correlation; the rest is carried through to the
/// continuation and persisted with the resolved session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Transport-side identifier of the event (e.g. a callback query id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    /// Who pressed the button
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,

    /// The `<token>-<index>` data attached to the pressed button
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,

    /// Raw transport object, kept verbatim
    #[serde(default)]
    pub raw: serde_json::Value,

    /// When the event reached this process
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    /// Create an event carrying `payload`
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(payload.into()),
            ..Self::empty()
        }
    }

    /// Create an event without any payload
    pub fn empty() -> Self {
        Self {
            event_id: None,
            sender: None,
            payload: None,
            raw: serde_json::Value::Null,
            received_at: Utc::now(),
        }
    }

    pub fn with_event_id(mut self, id: impl Into<String>) -> Self {
        self.event_id = Some(id.into());
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = raw;
        self
    }

    /// The payload, if present and not blank
    pub fn payload(&self) -> Option<&str> {
        self.payload
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}
