use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::api::Snapshot;
use crate::models::{post, FeedKey, FeedSummary, Post, Scope};
use crate::store::FeedStore;

/// Seed the list with the scope's canonical feed, append the snapshot list,
/// and deduplicate by canonical key keeping the first occurrence, so the
/// canonical record wins over its sparser duplicate from the list.
pub(crate) fn dedup_feeds(
    canonical: Option<FeedSummary>,
    list: Vec<FeedSummary>,
) -> Vec<FeedSummary> {
    let mut seen: HashSet<FeedKey> = HashSet::new();
    let mut merged = Vec::new();
    for feed in canonical.into_iter().chain(list) {
        if seen.insert(feed.id.clone()) {
            merged.push(feed);
        }
    }
    merged
}

/// Union fetched posts into the cached list by id. A fetched record replaces
/// the cached record with the same id; placeholder ids are never
/// server-assigned, so un-retargeted optimistic posts always survive, and a
/// replaced record's placeholder comments are grafted into the replacement.
/// Records absent from the page stay cached, which keeps pagination safe.
pub(crate) fn merge_post_lists(cached: &mut Vec<Post>, fetched: Vec<Post>) {
    for mut incoming in fetched {
        match cached.iter_mut().find(|post| post.id == incoming.id) {
            Some(existing) => {
                incoming.adopt_pending_comments(existing);
                *existing = incoming;
            }
            None => cached.push(incoming),
        }
    }
    cached.sort_by(post::newest_first);
}

/// Fold one fetched snapshot into the store.
pub(crate) fn apply_snapshot(store: &mut FeedStore, scope: &Scope, snapshot: Snapshot) {
    let Snapshot {
        feed, feeds, posts, ..
    } = snapshot;

    for summary in dedup_feeds(feed, feeds.unwrap_or_default()) {
        store.upsert_feed(summary);
    }

    let scope_key = match scope {
        Scope::Feed(identifier) => Some(store.resolve(identifier)),
        Scope::AllFeeds => None,
    };

    let mut grouped: HashMap<FeedKey, Vec<Post>> = HashMap::new();
    for mut incoming in posts.unwrap_or_default() {
        if incoming.feed.is_empty() {
            match &scope_key {
                Some(key) => incoming.feed = key.clone(),
                None => {
                    debug!(post = %incoming.id, "dropping post without a feed key");
                    continue;
                }
            }
        } else {
            incoming.feed = store.resolve(incoming.feed.as_str());
        }
        grouped.entry(incoming.feed.clone()).or_default().push(incoming);
    }
    for (key, batch) in grouped {
        merge_post_lists(store.posts_entry(&key), batch);
    }
}
