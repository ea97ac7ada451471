//! In-memory public feed

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moltmob_core::{MessageId, PodId, Result};
use moltmob_orchestrator::{Feed, FeedPost};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A feed backed by per-pod vectors
///
/// Ids are globally monotonic, so feed order and id order agree across the
/// whole instance. Tests inject agent posts with explicit timestamps via
/// [`MemoryFeed::post_at`] to exercise last-writer-wins ordering.
#[derive(Default)]
pub struct MemoryFeed {
    posts: Mutex<HashMap<PodId, Vec<FeedPost>>>,
    next_id: AtomicU64,
}

impl MemoryFeed {
    /// Create an empty feed
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a post with an explicit timestamp
    pub fn post_at(&self, pod_id: PodId, text: impl Into<String>, at: DateTime<Utc>) -> MessageId {
        let id = MessageId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.posts.lock().entry(pod_id).or_default().push(FeedPost {
            id,
            pod_id,
            text: text.into(),
            at,
        });
        id
    }

    /// Every post for a pod, in feed order
    pub fn all_posts(&self, pod_id: PodId) -> Vec<FeedPost> {
        self.posts.lock().get(&pod_id).cloned().unwrap_or_default()
    }

    /// Whether any post body contains the given fragment
    pub fn contains(&self, pod_id: PodId, fragment: &str) -> bool {
        self.all_posts(pod_id)
            .iter()
            .any(|post| post.text.contains(fragment))
    }
}

#[async_trait]
impl Feed for MemoryFeed {
    async fn publish(&self, pod_id: PodId, text: &str) -> Result<MessageId> {
        Ok(self.post_at(pod_id, text, Utc::now()))
    }

    async fn list_since(&self, pod_id: PodId, after: Option<MessageId>) -> Result<Vec<FeedPost>> {
        Ok(self
            .all_posts(pod_id)
            .into_iter()
            .filter(|post| after.map_or(true, |last| post.id > last))
            .collect())
    }
}
