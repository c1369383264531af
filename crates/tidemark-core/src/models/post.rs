use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::comment::{self, Comment};
use crate::models::identity::FeedKey;
use crate::models::reaction::{self, Reaction, ReactionEntry, ReactionTally};
use crate::models::{is_placeholder_id, now_rfc3339, parse_ts, placeholder_id};

/// One post with its reply tree, as held in the local cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    /// Owning feed. Snapshots scoped to one feed may omit it on the wire;
    /// reconciliation fills it from the scope before the post is stored.
    #[serde(default)]
    pub feed: FeedKey,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub reactions: Vec<ReactionEntry>,
    #[serde(default, deserialize_with = "reaction::lenient")]
    pub own_reaction: Option<Reaction>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    /// Synthesize an optimistic post awaiting server confirmation.
    pub fn placeholder(feed: FeedKey, body: String) -> Self {
        Self {
            id: placeholder_id(),
            feed,
            body,
            created_at: now_rfc3339(),
            reactions: Vec::new(),
            own_reaction: None,
            comments: Vec::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        is_placeholder_id(&self.id)
    }

    pub fn created_ts(&self) -> Option<i64> {
        parse_ts(&self.created_at)
    }

    pub fn tally(&self, user_id: Option<&str>) -> ReactionTally {
        reaction::tally_reactions(&self.reactions, self.own_reaction, user_id)
    }

    pub fn find_comment(&self, id: &str) -> Option<&Comment> {
        comment::find(&self.comments, id)
    }

    pub fn find_comment_mut(&mut self, id: &str) -> Option<&mut Comment> {
        comment::find_mut(&mut self.comments, id)
    }

    /// Attach a comment under its parent, or at top level when it has none.
    /// Returns false when the parent id matches nothing in this post.
    pub fn add_comment(&mut self, new: Comment) -> bool {
        let parent = new.parent.clone();
        match parent.as_deref() {
            None => {
                self.comments.push(new);
                true
            }
            Some(parent_id) => match comment::find_mut(&mut self.comments, parent_id) {
                Some(parent) => {
                    parent.children.push(new);
                    true
                }
                None => false,
            },
        }
    }

    /// Remove a comment with its subtree, returning it if found.
    pub fn remove_comment(&mut self, id: &str) -> Option<Comment> {
        comment::remove(&mut self.comments, id)
    }

    /// Carry `previous`'s placeholder comments into this post's tree.
    /// Placeholders exist only locally, so a fetched copy never includes
    /// them. Each graft re-attaches under its original parent, or at top
    /// level with the parent reference cleared when that parent is gone.
    pub fn adopt_pending_comments(&mut self, previous: &mut Post) {
        let mut pending = Vec::new();
        comment::drain_placeholders(&mut previous.comments, &mut pending);
        for mut graft in pending {
            let parent = graft
                .parent
                .as_deref()
                .and_then(|parent_id| comment::find_mut(&mut self.comments, parent_id));
            match parent {
                Some(parent) => parent.children.push(graft),
                None => {
                    graft.parent = None;
                    self.comments.push(graft);
                }
            }
        }
    }

    /// Swap a comment's placeholder id for the confirmed one, dropping any
    /// server copy already fetched under the new id. Parent references on
    /// replies follow the change.
    pub fn retarget_comment(&mut self, old_id: &str, new_id: &str) -> bool {
        if comment::find(&self.comments, old_id).is_none() {
            return false;
        }
        comment::remove(&mut self.comments, new_id);
        if let Some(target) = comment::find_mut(&mut self.comments, old_id) {
            target.id = new_id.to_string();
        }
        comment::retarget_parent_refs(&mut self.comments, old_id, new_id);
        true
    }
}

/// Sort order for post lists: newest first, unparseable timestamps last.
pub(crate) fn newest_first(a: &Post, b: &Post) -> Ordering {
    match (a.created_ts(), b.created_ts()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
