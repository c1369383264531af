use serde::{Deserialize, Serialize};

use crate::models::reaction::{self, Reaction, ReactionEntry, ReactionTally};
use crate::models::{is_placeholder_id, now_rfc3339, parse_ts, placeholder_id};

/// One comment in a post's reply tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    /// Id of the comment this replies to; `None` for top-level comments.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub reactions: Vec<ReactionEntry>,
    #[serde(default, deserialize_with = "reaction::lenient")]
    pub own_reaction: Option<Reaction>,
    #[serde(default)]
    pub children: Vec<Comment>,
}

impl Comment {
    /// Synthesize an optimistic comment awaiting server confirmation.
    pub fn placeholder(parent: Option<String>, body: String) -> Self {
        Self {
            id: placeholder_id(),
            parent,
            body,
            created_at: now_rfc3339(),
            reactions: Vec::new(),
            own_reaction: None,
            children: Vec::new(),
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
}

// ===== Tree helpers over a sibling list =====

pub(crate) fn find<'a>(list: &'a [Comment], id: &str) -> Option<&'a Comment> {
    for comment in list {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find(&comment.children, id) {
            return Some(found);
        }
    }
    None
}

pub(crate) fn find_mut<'a>(list: &'a mut [Comment], id: &str) -> Option<&'a mut Comment> {
    for comment in list {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_mut(&mut comment.children, id) {
            return Some(found);
        }
    }
    None
}

/// Remove a comment and its whole subtree, returning it if found.
pub(crate) fn remove(list: &mut Vec<Comment>, id: &str) -> Option<Comment> {
    if let Some(pos) = list.iter().position(|comment| comment.id == id) {
        return Some(list.remove(pos));
    }
    for comment in list {
        if let Some(removed) = remove(&mut comment.children, id) {
            return Some(removed);
        }
    }
    None
}

/// Detach every placeholder comment from the tree, subtree included. A
/// placeholder nested under another placeholder travels with its ancestor
/// instead of detaching on its own.
pub(crate) fn drain_placeholders(list: &mut Vec<Comment>, drained: &mut Vec<Comment>) {
    let mut index = 0;
    while index < list.len() {
        if list[index].is_placeholder() {
            drained.push(list.remove(index));
        } else {
            drain_placeholders(&mut list[index].children, drained);
            index += 1;
        }
    }
}

/// Rewrite parent references after a comment id changed.
pub(crate) fn retarget_parent_refs(list: &mut [Comment], old_id: &str, new_id: &str) {
    for comment in list {
        if comment.parent.as_deref() == Some(old_id) {
            comment.parent = Some(new_id.to_string());
        }
        retarget_parent_refs(&mut comment.children, old_id, new_id);
    }
}
