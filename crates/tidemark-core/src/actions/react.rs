use tracing::warn;

use crate::error::CoreError;
use crate::models::reaction::apply_toggle;
use crate::models::{Reaction, ReactionTarget};
use crate::runtime::SyncEngine;

// ===== Reactions =====

impl SyncEngine {
    /// Toggle the caller's reaction on a post or comment.
    ///
    /// The local transition is immediate and final: selecting the current
    /// kind clears it, selecting another replaces it. Only transitions that
    /// end on a reaction reach the server; clearing is local-only, and a
    /// delivery failure is logged without disturbing the local state.
    ///
    /// Returns the reaction now in effect.
    pub async fn toggle_reaction(
        &self,
        feed: &str,
        target: &ReactionTarget,
        selected: Reaction,
    ) -> Result<Option<Reaction>, CoreError> {
        let (key, next) = {
            let mut store = self.store.lock();
            let key = store.resolve(feed);
            let post = store
                .post_mut(&key, target.post_id())
                .ok_or_else(|| CoreError::unknown("post", target.post_id()))?;
            let slot = match target.comment_id() {
                Some(comment_id) => {
                    &mut post
                        .find_comment_mut(comment_id)
                        .ok_or_else(|| CoreError::unknown("comment", comment_id))?
                        .own_reaction
                }
                None => &mut post.own_reaction,
            };
            let next = apply_toggle(*slot, selected);
            *slot = next;
            (key, next)
        };
        if let Some(kind) = next {
            if let Err(error) = self.api.react(&key, target, kind).await {
                warn!(feed = %key, error = %error, "reaction not delivered");
            }
        }
        Ok(next)
    }
}
