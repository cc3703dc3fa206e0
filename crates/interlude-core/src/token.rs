//! Token issuance and callback payload encoding
//!
//! A token is the upper-case hexadecimal rendering of a store-wide counter.
//! Buttons shown to the end user carry `<token>-<option index>`; the separator
//! can never occur inside a token because tokens only contain `0-9A-F`.

use crate::error::{InterludeError, InterludeResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Separator between token and option index in a callback payload
pub const PAYLOAD_SEPARATOR: char = '-';

/// Opaque identifier for one pending interaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Derive the token for a counter value
    pub fn from_counter(value: u64) -> Self {
        Self(format!("{:X}", value))
    }

    /// Decode the token back into its counter value
    ///
    /// Returns `None` for strings that were not produced by [`Token::from_counter`].
    pub fn counter(&self) -> Option<u64> {
        if self.0.is_empty() || !self.0.bytes().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F')) {
            return None;
        }
        u64::from_str_radix(&self.0, 16).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Strictly increasing counter shared by every issuance call
///
/// The counter holds the last value handed out; a fresh generator is at 0 and
/// its first [`TokenGenerator::next`] returns 1.
#[derive(Debug, Default)]
pub struct TokenGenerator {
    last: AtomicU64,
}

impl TokenGenerator {
    /// Create a generator that has not issued anything yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator that continues after `last`
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// Issue the next value, or `None` once `u64::MAX` has been handed out
    ///
    /// Read-then-increment is a single atomic step, so concurrent callers can
    /// never observe the same value. An exhausted generator stays exhausted
    /// and never wraps back to 1.
    pub fn next(&self) -> Option<u64> {
        self.last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(1))
            .ok()
            .map(|previous| previous + 1)
    }

    /// Last value issued (0 if none)
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }

    /// Move the counter forward to at least `floor`; never moves it back
    pub fn advance_to(&self, floor: u64) {
        self.last.fetch_max(floor, Ordering::SeqCst);
    }
}

/// Decoded `<token>-<index>` payload carried by an inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackPayload {
    pub token: Token,
    pub selection: usize,
}

impl CallbackPayload {
    pub fn new(token: Token, selection: usize) -> Self {
        Self { token, selection }
    }

    /// Render the payload attached to the button for option `selection`
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.token, PAYLOAD_SEPARATOR, self.selection)
    }

    /// Split a raw payload into token and option index
    ///
    /// The payload must split into exactly two non-empty parts and the second
    /// must be a non-negative integer.
    pub fn parse(raw: &str) -> InterludeResult<Self> {
        let parts: Vec<&str> = raw.split(PAYLOAD_SEPARATOR).collect();
        if parts.len() != 2 {
            return Err(InterludeError::malformed(
                format!("expected 2 parts separated by '{}', got {}", PAYLOAD_SEPARATOR, parts.len()),
                Some(raw),
            ));
        }

        let token = parts[0].trim();
        if token.is_empty() {
            return Err(InterludeError::malformed("empty token", Some(raw)));
        }

        let selection = parts[1].trim().parse::<usize>().map_err(|e| {
            InterludeError::malformed(format!("invalid option index: {}", e), Some(raw))
        })?;

        Ok(Self {
            token: Token::from(token),
            selection,
        })
    }
}

impl fmt::Display for CallbackPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
