use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::{feed, post, resolve_feed_key, FeedKey, FeedSummary, Post};

/// Handle shared by every component that reads or mutates the store.
/// Guards are held only across synchronous sections, never across awaits.
pub type SharedFeedStore = Arc<Mutex<FeedStore>>;

pub fn shared_store() -> SharedFeedStore {
    Arc::new(Mutex::new(FeedStore::new()))
}

/// In-memory cache of feed summaries and per-feed post lists, the single
/// source of truth for rendering. All mutations are synchronous and
/// immediately observable; callers never hold private copies of records.
#[derive(Default)]
pub struct FeedStore {
    feeds: Vec<FeedSummary>,
    posts_by_feed: HashMap<FeedKey, Vec<Post>>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Lookups =====

    pub fn feeds(&self) -> &[FeedSummary] {
        &self.feeds
    }

    /// Canonicalize any identifier form against the known feeds.
    pub fn resolve(&self, identifier: &str) -> FeedKey {
        resolve_feed_key(identifier, &self.feeds)
    }

    pub fn feed(&self, identifier: &str) -> Option<&FeedSummary> {
        let key = self.resolve(identifier);
        self.feeds.iter().find(|feed| feed.id == key)
    }

    pub fn posts(&self, key: &FeedKey) -> &[Post] {
        self.posts_by_feed
            .get(key)
            .map(|posts| posts.as_slice())
            .unwrap_or(&[])
    }

    pub fn post(&self, key: &FeedKey, post_id: &str) -> Option<&Post> {
        self.posts(key).iter().find(|post| post.id == post_id)
    }

    pub(crate) fn post_mut(&mut self, key: &FeedKey, post_id: &str) -> Option<&mut Post> {
        self.posts_by_feed
            .get_mut(key)?
            .iter_mut()
            .find(|post| post.id == post_id)
    }

    pub(crate) fn posts_entry(&mut self, key: &FeedKey) -> &mut Vec<Post> {
        self.posts_by_feed.entry(key.clone()).or_default()
    }

    // ===== Feed mutations =====

    /// Merge a summary into the list by canonical key. Present fields
    /// overwrite, absent fields keep their cached values, so a sparse
    /// record never blanks a fully-populated entry.
    pub fn upsert_feed(&mut self, incoming: FeedSummary) {
        match self.feeds.iter_mut().find(|feed| feed.id == incoming.id) {
            Some(existing) => existing.merge_from(incoming),
            None => self.feeds.push(incoming),
        }
        self.feeds.sort_by(feed::most_recent_first);
    }

    /// Overwrite a feed record exactly as given. Used to restore captured
    /// pre-mutation state; `upsert_feed` cannot clear fields.
    pub fn replace_feed(&mut self, snapshot: FeedSummary) {
        match self.feeds.iter_mut().find(|feed| feed.id == snapshot.id) {
            Some(existing) => *existing = snapshot,
            None => self.feeds.push(snapshot),
        }
        self.feeds.sort_by(feed::most_recent_first);
    }

    /// Drop a feed and its post list. Used to undo a synthesized entry.
    pub fn remove_feed(&mut self, key: &FeedKey) -> Option<FeedSummary> {
        self.posts_by_feed.remove(key);
        let pos = self.feeds.iter().position(|feed| &feed.id == key)?;
        Some(self.feeds.remove(pos))
    }

    /// Rename a feed's key, carrying its post list along. A record already
    /// cached under the new key gives way to the renamed one.
    pub fn retarget_feed(&mut self, old: &FeedKey, new: FeedKey) -> bool {
        if old == &new || !self.feeds.iter().any(|feed| &feed.id == old) {
            return false;
        }
        self.feeds.retain(|feed| feed.id != new);
        if let Some(feed) = self.feeds.iter_mut().find(|feed| &feed.id == old) {
            feed.id = new.clone();
        }
        if let Some(mut posts) = self.posts_by_feed.remove(old) {
            for post in posts.iter_mut() {
                post.feed = new.clone();
            }
            self.posts_by_feed.insert(new, posts);
        }
        true
    }

    // ===== Post mutations =====

    /// Insert or replace a post by id, keeping the list sorted newest
    /// first with unparseable timestamps last.
    pub fn upsert_post(&mut self, key: &FeedKey, incoming: Post) {
        let posts = self.posts_by_feed.entry(key.clone()).or_default();
        if let Some(existing) = posts.iter_mut().find(|post| post.id == incoming.id) {
            *existing = incoming;
            posts.sort_by(post::newest_first);
            return;
        }
        let pos = posts.partition_point(|post| {
            post::newest_first(post, &incoming) == std::cmp::Ordering::Less
        });
        posts.insert(pos, incoming);
    }

    pub fn remove_post(&mut self, key: &FeedKey, post_id: &str) -> Option<Post> {
        let posts = self.posts_by_feed.get_mut(key)?;
        let pos = posts.iter().position(|post| post.id == post_id)?;
        Some(posts.remove(pos))
    }

    /// Swap a placeholder id for the server-confirmed one, preserving the
    /// record and everything attached to it. Applies to posts first, then
    /// comments. A no-op when the placeholder was superseded (edited away,
    /// deleted, or already retargeted) in the meantime.
    pub fn retarget_id(&mut self, old_id: &str, new_id: &str) -> bool {
        if old_id == new_id {
            return false;
        }
        for posts in self.posts_by_feed.values_mut() {
            if posts.iter().any(|post| post.id == old_id) {
                // A refresh may have landed the confirmed record already;
                // the optimistic one keeps its local state and takes over.
                posts.retain(|post| post.id != new_id);
                if let Some(post) = posts.iter_mut().find(|post| post.id == old_id) {
                    post.id = new_id.to_string();
                }
                return true;
            }
        }
        for posts in self.posts_by_feed.values_mut() {
            for post in posts.iter_mut() {
                if post.retarget_comment(old_id, new_id) {
                    return true;
                }
            }
        }
        false
    }
}
