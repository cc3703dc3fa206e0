//! Pending interaction sessions
//!
//! This module provides the token → context mapping at the heart of the crate:
//! - Entry types describing one pending interaction
//! - The concurrent store that issues, resolves and evicts them
//! - Point-in-time snapshots used for persistence

mod entry;
mod snapshot;
mod store;

pub use entry::{BoundTransport, ChoiceOption, NewSession, SessionEntry, SessionState};
pub use snapshot::StoreSnapshot;
pub use store::{Resolution, SessionStore};
