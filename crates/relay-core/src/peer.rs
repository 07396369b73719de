//! Peer identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix used for hub-assigned peer identifiers.
pub const PEER_ID_PREFIX: &str = "peer-";

/// Unique identifier for one connected peer.
///
/// Assigned by the hub at registration from a monotonically increasing
/// counter (e.g., "peer-1", "peer-2"), so two live peers never share an ID.
/// Stable for the lifetime of the connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Creates a PeerId from an arbitrary string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates the PeerId for the given registration sequence number.
    pub fn from_sequence(seq: u64) -> Self {
        Self(format!("{PEER_ID_PREFIX}{seq}"))
    }

    /// Extracts the registration sequence number, if this ID was hub-assigned.
    pub fn sequence(&self) -> Option<u64> {
        self.0
            .strip_prefix(PEER_ID_PREFIX)
            .and_then(|s| s.parse().ok())
    }

    /// Returns the underlying string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for PeerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sequence_round_trips() {
        let id = PeerId::from_sequence(42);
        assert_eq!(id.as_str(), "peer-42");
        assert_eq!(id.sequence(), Some(42));
    }

    #[test]
    fn test_sequence_of_foreign_id_is_none() {
        assert_eq!(PeerId::new("alice").sequence(), None);
        assert_eq!(PeerId::new("peer-abc").sequence(), None);
    }

    #[test]
    fn test_display_matches_inner_string() {
        let id = PeerId::from("peer-7");
        assert_eq!(id.to_string(), "peer-7");
        assert_eq!(id.as_ref(), "peer-7");
    }

    #[test]
    fn test_distinct_sequences_are_distinct_ids() {
        assert_ne!(PeerId::from_sequence(1), PeerId::from_sequence(2));
    }
}
