//! UnifiedError trait implementation for InterludeError

use super::types::{InterludeError, UnifiedError};

impl UnifiedError for InterludeError {
    fn error_code(&self) -> &str {
        match self {
            Self::MalformedEvent { .. } => "INTERLUDE_MALFORMED_EVENT",
            Self::UnknownToken { .. } => "INTERLUDE_UNKNOWN_TOKEN",
            Self::AlreadyResolved { .. } => "INTERLUDE_ALREADY_RESOLVED",
            Self::InvalidSelection { .. } => "INTERLUDE_INVALID_SELECTION",
            Self::PersistenceWrite { .. } => "INTERLUDE_PERSISTENCE_WRITE",
            Self::PersistenceLoad { .. } => "INTERLUDE_PERSISTENCE_LOAD",
            Self::Continuation { .. } => "INTERLUDE_CONTINUATION",
            Self::Sweep { .. } => "INTERLUDE_SWEEP",
            Self::Runtime { .. } => "INTERLUDE_RUNTIME",
            Self::Config { .. } => "INTERLUDE_CONFIG",
            Self::TokensExhausted { .. } => "INTERLUDE_TOKENS_EXHAUSTED",
            Self::Json { .. } => "INTERLUDE_JSON",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::MalformedEvent { message, .. } => message,
            Self::UnknownToken { .. } => "Unknown or expired token",
            Self::AlreadyResolved { .. } => "Token already resolved",
            Self::InvalidSelection { .. } => "Selected option out of range",
            Self::PersistenceWrite { message, .. } => message,
            Self::PersistenceLoad { message, .. } => message,
            Self::Continuation { message, .. } => message,
            Self::Sweep { message } => message,
            Self::Runtime { message } => message,
            Self::Config { message, .. } => message,
            Self::TokensExhausted { .. } => "Token space exhausted",
            Self::Json { message } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::MalformedEvent { payload, .. } => payload.as_deref(),
            Self::UnknownToken { token } => Some(token),
            Self::AlreadyResolved { token, .. } => Some(token),
            Self::InvalidSelection { token, .. } => Some(token),
            Self::PersistenceWrite { path, .. } => path.as_deref(),
            Self::PersistenceLoad { path, .. } => path.as_deref(),
            Self::Continuation { token, .. } => Some(token),
            Self::Config { context, .. } => context.as_deref(),
            Self::Sweep { .. }
            | Self::Runtime { .. }
            | Self::TokensExhausted { .. }
            | Self::Json { .. } => None,
        }
    }

    fn is_expected_noise(&self) -> bool {
        matches!(
            self,
            Self::MalformedEvent { .. }
                | Self::UnknownToken { .. }
                | Self::AlreadyResolved { .. }
                | Self::InvalidSelection { .. }
        )
    }
}
