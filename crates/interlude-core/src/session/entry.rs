//! Session entry data structures
//!
//! Defines the value types stored under each token:
//! - ChoiceOption: One option the end user may pick
//! - NewSession: What a caller supplies to start an interaction
//! - SessionEntry: The stored context for one pending interaction

use crate::continuation::ResumeAction;
use crate::event::InboundEvent;
use crate::token::{CallbackPayload, Token};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One option presented to the end user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Text shown on the button
    pub label: String,
    /// Opaque value handed back to the continuation
    pub value: String,
}

impl ChoiceOption {
    /// Option whose value equals its label
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            value: label.clone(),
            label,
        }
    }

    pub fn with_value(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Live handle to the channel that will deliver the outcome
///
/// Never persisted: a session reloaded from disk has no transport, and
/// continuations must cope with that.
pub trait BoundTransport: fmt::Debug + Send + Sync {
    /// Name of the channel (e.g. "telegram")
    fn channel(&self) -> &str;

    /// Access to the concrete transport for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Lifecycle of a stored session
///
/// Expired sessions are simply gone from the store, so only the two live
/// states are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Waiting for the user
    Issued,
    /// A selection has been recorded
    Resolved,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Issued => write!(f, "issued"),
            SessionState::Resolved => write!(f, "resolved"),
        }
    }
}

/// Request to start a new interaction
#[derive(Debug, Clone)]
pub struct NewSession {
    pub options: Vec<ChoiceOption>,
    pub resume: ResumeAction,
    pub metadata: serde_json::Value,
    pub transport: Option<Arc<dyn BoundTransport>>,
}

impl NewSession {
    pub fn new(options: Vec<ChoiceOption>, resume: ResumeAction) -> Self {
        Self {
            options,
            resume,
            metadata: serde_json::Value::Null,
            transport: None,
        }
    }

    /// Result of the side effect that produced this interaction (e.g. the sent message)
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn BoundTransport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

/// Stored context for one pending interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub token: Token,

    /// Options in display order; immutable after creation
    pub options: Vec<ChoiceOption>,

    /// Continuation to resume once resolved
    pub resume: ResumeAction,

    /// Creation timestamp, used only for expiry
    pub created_at: DateTime<Utc>,

    /// Opaque result metadata supplied by the caller
    #[serde(default)]
    pub metadata: serde_json::Value,

    #[serde(skip)]
    pub transport: Option<Arc<dyn BoundTransport>>,

    /// Chosen option index; write-once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<usize>,

    /// Event that resolved the session; write-once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_event: Option<InboundEvent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SessionEntry {
    pub fn new(token: Token, request: NewSession, created_at: DateTime<Utc>) -> Self {
        Self {
            token,
            options: request.options,
            resume: request.resume,
            created_at,
            metadata: request.metadata,
            transport: request.transport,
            selection: None,
            resolved_event: None,
            resolved_at: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.selection.is_some() {
            SessionState::Resolved
        } else {
            SessionState::Issued
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.selection.is_some()
    }

    /// The option picked by the user, once resolved
    pub fn selected_option(&self) -> Option<&ChoiceOption> {
        self.selection.and_then(|i| self.options.get(i))
    }

    /// Whether the entry is at least `retention` old at `now`
    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        now - self.created_at >= to_chrono(retention)
    }

    /// Whether a resolved entry has outlived `retention` since its resolution
    pub fn is_resolution_stale(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        match self.resolved_at {
            Some(resolved_at) => now - resolved_at >= to_chrono(retention),
            None => false,
        }
    }

    /// Payload to attach to the button for option `index`
    pub fn payload_for(&self, index: usize) -> String {
        CallbackPayload::new(self.token.clone(), index).encode()
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
