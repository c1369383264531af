//! Test doubles shared across the crate's test modules.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{FeedApi, MutationAck, Snapshot};
use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::models::{now_rfc3339, FeedKey, FeedSummary, Post, Reaction, ReactionTarget, Scope};
use crate::runtime::SyncEngine;

/// In-memory [`FeedApi`] with scriptable responses, delays, and failures.
pub(crate) struct MockFeedApi {
    fetch_calls: AtomicUsize,
    mutation_calls: AtomicUsize,
    react_calls: AtomicUsize,
    fail_fetch: AtomicBool,
    fail_mutations: AtomicBool,
    fetch_delay: Duration,
    mutation_delay: Duration,
    snapshots: parking_lot::Mutex<VecDeque<Snapshot>>,
    next_id: parking_lot::Mutex<Option<String>>,
    last_cursor: parking_lot::Mutex<Option<String>>,
    last_edit: parking_lot::Mutex<Option<(String, String)>>,
}

impl MockFeedApi {
    pub(crate) fn new() -> Self {
        Self {
            fetch_calls: AtomicUsize::new(0),
            mutation_calls: AtomicUsize::new(0),
            react_calls: AtomicUsize::new(0),
            fail_fetch: AtomicBool::new(false),
            fail_mutations: AtomicBool::new(false),
            fetch_delay: Duration::ZERO,
            mutation_delay: Duration::ZERO,
            snapshots: parking_lot::Mutex::new(VecDeque::new()),
            next_id: parking_lot::Mutex::new(None),
            last_cursor: parking_lot::Mutex::new(None),
            last_edit: parking_lot::Mutex::new(None),
        }
    }

    pub(crate) fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub(crate) fn with_mutation_delay(mut self, delay: Duration) -> Self {
        self.mutation_delay = delay;
        self
    }

    /// Queue the snapshot the next fetch returns. An empty queue serves
    /// empty snapshots.
    pub(crate) fn push_snapshot(&self, snapshot: Snapshot) {
        self.snapshots.lock().push_back(snapshot);
    }

    /// Id the next acknowledged mutation reports. Consumed on use.
    pub(crate) fn set_next_id(&self, id: impl Into<String>) {
        *self.next_id.lock() = Some(id.into());
    }

    pub(crate) fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn mutation_count(&self) -> usize {
        self.mutation_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn react_count(&self) -> usize {
        self.react_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_cursor(&self) -> Option<String> {
        self.last_cursor.lock().clone()
    }

    /// Target id and body of the most recent edit call.
    pub(crate) fn last_edit(&self) -> Option<(String, String)> {
        self.last_edit.lock().clone()
    }

    async fn mutate(&self) -> Result<MutationAck, CoreError> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        if !self.mutation_delay.is_zero() {
            tokio::time::sleep(self.mutation_delay).await;
        }
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(CoreError::Api {
                status: 500,
                message: "scripted mutation failure".to_string(),
            });
        }
        Ok(MutationAck {
            id: self.next_id.lock().take(),
            feed: None,
        })
    }
}

#[async_trait]
impl FeedApi for MockFeedApi {
    async fn fetch_scope(
        &self,
        _scope: &Scope,
        cursor: Option<&str>,
    ) -> Result<Snapshot, CoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_cursor.lock() = cursor.map(str::to_string);
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(CoreError::Api {
                status: 500,
                message: "scripted fetch failure".to_string(),
            });
        }
        Ok(self.snapshots.lock().pop_front().unwrap_or_default())
    }

    async fn create_post(&self, _feed: &FeedKey, _body: &str) -> Result<MutationAck, CoreError> {
        self.mutate().await
    }

    async fn edit_post(
        &self,
        _feed: &FeedKey,
        post_id: &str,
        body: &str,
    ) -> Result<MutationAck, CoreError> {
        *self.last_edit.lock() = Some((post_id.to_string(), body.to_string()));
        self.mutate().await
    }

    async fn delete_post(&self, _feed: &FeedKey, _post_id: &str) -> Result<MutationAck, CoreError> {
        self.mutate().await
    }

    async fn create_comment(
        &self,
        _feed: &FeedKey,
        _post_id: &str,
        _parent_id: Option<&str>,
        _body: &str,
    ) -> Result<MutationAck, CoreError> {
        self.mutate().await
    }

    async fn edit_comment(
        &self,
        _feed: &FeedKey,
        comment_id: &str,
        body: &str,
    ) -> Result<MutationAck, CoreError> {
        *self.last_edit.lock() = Some((comment_id.to_string(), body.to_string()));
        self.mutate().await
    }

    async fn delete_comment(
        &self,
        _feed: &FeedKey,
        _comment_id: &str,
    ) -> Result<MutationAck, CoreError> {
        self.mutate().await
    }

    async fn react(
        &self,
        _feed: &FeedKey,
        _target: &ReactionTarget,
        _reaction: Reaction,
    ) -> Result<(), CoreError> {
        self.react_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(CoreError::Api {
                status: 500,
                message: "scripted reaction failure".to_string(),
            });
        }
        Ok(())
    }

    async fn subscribe(&self, _feed: &FeedKey) -> Result<MutationAck, CoreError> {
        self.mutate().await
    }

    async fn unsubscribe(&self, _feed: &FeedKey) -> Result<MutationAck, CoreError> {
        self.mutate().await
    }

    async fn create_feed(&self, _name: &str) -> Result<MutationAck, CoreError> {
        self.mutate().await
    }

    async fn search_feeds(&self, _query: &str) -> Result<Vec<FeedSummary>, CoreError> {
        Ok(Vec::new())
    }

    async fn upload_attachment(
        &self,
        _filename: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, CoreError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(CoreError::Api {
                status: 500,
                message: "scripted upload failure".to_string(),
            });
        }
        Ok("https://cdn.invalid/mock-upload".to_string())
    }
}

/// Snapshot carrying one feed summary and one post in that feed.
pub(crate) fn snapshot_with_post(feed: &str, post_id: &str, body: &str) -> Snapshot {
    Snapshot {
        feed: Some(FeedSummary::new(feed)),
        feeds: None,
        posts: Some(vec![Post {
            id: post_id.to_string(),
            feed: FeedKey::new(feed),
            body: body.to_string(),
            created_at: now_rfc3339(),
            reactions: Vec::new(),
            own_reaction: None,
            comments: Vec::new(),
        }]),
        has_more: None,
        next_cursor: None,
    }
}

/// Engine wired to a mock API, an unreachable push endpoint, and a
/// temporary data directory. The directory guard must outlive the engine.
pub(crate) fn test_engine(api: Arc<MockFeedApi>) -> (SyncEngine, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = CoreConfig::new("http://127.0.0.1:9")
        .with_push_base("ws://127.0.0.1:1")
        .with_user("me")
        .with_data_dir(dir.path());
    let engine = SyncEngine::with_api(config, api).expect("engine builds");
    (engine, dir)
}
