//! Error types for Interlude
//!
//! All errors implement the `UnifiedError` trait which provides consistent fields:
//! - error_code: A unique identifier for programmatic error handling
//! - message: Human-readable error message
//! - context: Optional additional context (usually the token or file path)

mod constructors;
mod types;
mod unified_error;

pub use types::{InterludeError, InterludeResult, UnifiedError};
