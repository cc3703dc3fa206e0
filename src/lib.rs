//! Interlude
//!
//! Issue a token for a pending choice, resume the waiting code when the
//! answer comes back. See [`interlude_core`] for the full API.

pub use interlude_core::*;
