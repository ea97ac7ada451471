//! Identifier types used across the Moltmob system
//!
//! Pods, players, and transactions are keyed by uuid newtypes; feed messages
//! are keyed by the monotonically increasing id the feed collaborator
//! assigns, so checkpoint comparisons are plain integer ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Pod identifier - one game instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PodId(pub Uuid);

impl PodId {
    /// Create a new random pod ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PodId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pod-{}", self.0)
    }
}

impl FromStr for PodId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid_str = s.strip_prefix("pod-").unwrap_or(s);
        Ok(PodId(Uuid::parse_str(uuid_str)?))
    }
}

impl From<Uuid> for PodId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Player identifier - an agent's membership in exactly one pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Create a new random player ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

impl From<Uuid> for PlayerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Transaction identifier for ledger rows
///
/// Settlement retries reuse the same TxId, which is what makes a retry after
/// an ambiguous backend result safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub Uuid);

impl TxId {
    /// Create a new random transaction ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

impl From<Uuid> for TxId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Feed message identifier
///
/// Assigned by the feed collaborator in publication order. Checkpoints store
/// the last processed MessageId and `list_since` returns strictly newer ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Create from a raw feed sequence number
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner sequence number
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The next message id in feed order
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

impl From<u64> for MessageId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<MessageId> for u64 {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_id_display_roundtrip() {
        let id = PodId::new();
        let parsed: PodId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn pod_id_parses_bare_uuid() {
        let uuid = Uuid::new_v4();
        let parsed: PodId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed.uuid(), uuid);
    }

    #[test]
    fn message_id_ordering_matches_feed_order() {
        let a = MessageId::new(7);
        let b = a.next();
        assert!(b > a);
        assert_eq!(b.value(), 8);
    }
}
