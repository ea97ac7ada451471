//! Public feed collaborator
//!
//! The feed is the only transport between agents and the GM. It assigns
//! monotonically increasing message ids in publication order; checkpoints
//! store the last processed id and `list_since` returns strictly newer
//! posts, which is the whole of the resumable-ingest contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moltmob_core::{MessageId, PodId, Result};
use serde::{Deserialize, Serialize};

/// One public feed post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    /// Feed-assigned id, monotonic per pod
    pub id: MessageId,
    /// The pod channel this was posted to
    pub pod_id: PodId,
    /// Post body; may embed an envelope token
    pub text: String,
    /// Publication timestamp, used for last-writer-wins ordering
    pub at: DateTime<Utc>,
}

/// The public feed the GM reads from and publishes to
#[async_trait]
pub trait Feed: Send + Sync {
    /// Publish a post and return its assigned id
    async fn publish(&self, pod_id: PodId, text: &str) -> Result<MessageId>;

    /// Posts strictly newer than `after`, in feed order
    ///
    /// `None` means from the beginning.
    async fn list_since(&self, pod_id: PodId, after: Option<MessageId>) -> Result<Vec<FeedPost>>;
}
