//! Continuations resumed when a session is resolved
//!
//! A session does not hold a closure. It holds a serializable [`ResumeAction`]
//! naming a handler `kind` plus whatever data the handler needs, so a session
//! reloaded from disk can still be resumed. Handlers are looked up in a
//! [`ContinuationRegistry`] at resolution time.

use crate::session::SessionEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What to do once the user has picked an option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeAction {
    /// Registry key of the handler
    pub kind: String,
    /// Handler-specific data needed to resume
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ResumeAction {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Capability invoked with the resolved session
///
/// Runs on its own task, never on the thread delivering the event. An error
/// or panic is reported; the session stays resolved either way.
#[async_trait]
pub trait OnResolved: Send + Sync {
    async fn on_resolved(&self, session: &SessionEntry) -> anyhow::Result<()>;
}

/// Adapter turning a plain function into an [`OnResolved`] handler
pub struct FnContinuation<F> {
    f: F,
}

#[async_trait]
impl<F> OnResolved for FnContinuation<F>
where
    F: Fn(&SessionEntry) -> anyhow::Result<()> + Send + Sync,
{
    async fn on_resolved(&self, session: &SessionEntry) -> anyhow::Result<()> {
        (self.f)(session)
    }
}

/// Wrap a synchronous function as a shareable handler
pub fn from_fn<F>(f: F) -> Arc<dyn OnResolved>
where
    F: Fn(&SessionEntry) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(FnContinuation { f })
}

/// Maps resume kinds to their handlers
#[derive(Clone, Default)]
pub struct ContinuationRegistry {
    handlers: HashMap<String, Arc<dyn OnResolved>>,
    fallback: Option<Arc<dyn OnResolved>>,
}

impl ContinuationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any previous one
    pub fn register(&mut self, kind: impl Into<String>, handler: Arc<dyn OnResolved>) -> &mut Self {
        self.handlers.insert(kind.into(), handler);
        self
    }

    /// Builder-style [`ContinuationRegistry::register`]
    pub fn with_handler(mut self, kind: impl Into<String>, handler: Arc<dyn OnResolved>) -> Self {
        self.register(kind, handler);
        self
    }

    /// Handler used for kinds nobody registered
    pub fn with_fallback(mut self, handler: Arc<dyn OnResolved>) -> Self {
        self.fallback = Some(handler);
        self
    }

    /// Look up the handler for `kind`, falling back if configured
    pub fn get(&self, kind: &str) -> Option<Arc<dyn OnResolved>> {
        self.handlers
            .get(kind)
            .cloned()
            .or_else(|| self.fallback.clone())
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl fmt::Debug for ContinuationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationRegistry")
            .field("kinds", &self.kinds())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
