//! Basic type definitions for the chat server
//!
//! Provides the `ClientId` newtype: a UUID-based connection handle used to
//! identify a client in the roster independently of its display name.

use uuid::Uuid;

/// Unique connection handle (newtype pattern)
///
/// Wraps a UUID v4. Display names may repeat across sessions, so roster
/// membership is keyed on this instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
