//! Point-in-time copy of a store

use super::entry::SessionEntry;
use crate::token::Token;

/// Counter plus every entry, taken under the store lock
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Last value issued by the token generator
    pub counter: u64,
    /// Entries ordered by token counter
    pub entries: Vec<SessionEntry>,
    /// Monotonic mutation number of the store at capture time; 0 for
    /// snapshots not taken from a live store
    pub generation: u64,
}

impl StoreSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tokens(&self) -> Vec<&Token> {
        self.entries.iter().map(|e| &e.token).collect()
    }

    pub fn get(&self, token: &str) -> Option<&SessionEntry> {
        self.entries.iter().find(|e| e.token.as_str() == token)
    }

    /// Largest counter encoded in any entry's token
    pub fn highest_issued(&self) -> u64 {
        self.entries
            .iter()
            .filter_map(|e| e.token.counter())
            .max()
            .unwrap_or(0)
    }
}
