//! Constructor methods for InterludeError

use super::types::InterludeError;

impl InterludeError {
    /// Create a malformed-event error, keeping the offending payload if any
    pub fn malformed(message: impl Into<String>, payload: Option<&str>) -> Self {
        Self::MalformedEvent {
            message: message.into(),
            payload: payload.map(str::to_string),
        }
    }

    /// Create an unknown-token error
    pub fn unknown_token(token: impl Into<String>) -> Self {
        Self::UnknownToken {
            token: token.into(),
        }
    }

    /// Create an already-resolved error
    pub fn already_resolved(token: impl Into<String>, selection: usize) -> Self {
        Self::AlreadyResolved {
            token: token.into(),
            selection,
        }
    }

    /// Create an invalid-selection error
    pub fn invalid_selection(token: impl Into<String>, index: usize, available: usize) -> Self {
        Self::InvalidSelection {
            token: token.into(),
            index,
            available,
        }
    }

    /// Create a snapshot write error
    pub fn persistence_write(message: impl Into<String>, path: Option<String>) -> Self {
        Self::PersistenceWrite {
            message: message.into(),
            path,
        }
    }

    /// Create a snapshot load error
    pub fn persistence_load(message: impl Into<String>, path: Option<String>) -> Self {
        Self::PersistenceLoad {
            message: message.into(),
            path,
        }
    }

    /// Create a continuation error
    pub fn continuation(
        token: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Continuation {
            token: token.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create a sweep error
    pub fn sweep(message: impl Into<String>) -> Self {
        Self::Sweep {
            message: message.into(),
        }
    }

    /// Create a runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a token-exhaustion error
    pub fn tokens_exhausted(last: u64) -> Self {
        Self::TokensExhausted { last }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for InterludeError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}
