use crate::error::CoreError;
use crate::models::{Comment, Post, Scope};
use crate::runtime::SyncEngine;

// ===== Post and comment composition =====

impl SyncEngine {
    /// Create a post. A placeholder record is visible immediately; on
    /// confirmation it is retargeted to the server id and the feed is
    /// re-fetched. A body edit applied while the create is in flight is
    /// forwarded against the confirmed id. On failure the placeholder
    /// stays put and the error surfaces to the caller.
    ///
    /// Returns the id the post ends up under.
    pub async fn create_post(&self, feed: &str, body: &str) -> Result<String, CoreError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CoreError::validation("post body must not be empty"));
        }
        let (key, placeholder_id) = {
            let mut store = self.store.lock();
            let key = store.resolve(feed);
            let placeholder = Post::placeholder(key.clone(), body.to_string());
            let id = placeholder.id.clone();
            store.upsert_post(&key, placeholder);
            (key, id)
        };
        let ack = self.api.create_post(&key, body).await?;
        let confirmed = ack.id.clone().unwrap_or_else(|| placeholder_id.clone());
        if confirmed != placeholder_id {
            self.store.lock().retarget_id(&placeholder_id, &confirmed);
            let edited = {
                let store = self.store.lock();
                store
                    .post(&key, &confirmed)
                    .filter(|post| post.body != body)
                    .map(|post| post.body.clone())
            };
            if let Some(edited) = edited {
                let edit_ack = self.api.edit_post(&key, &confirmed, &edited).await?;
                self.absorb_ack(&edit_ack);
            }
        }
        self.absorb_ack(&ack);
        self.refresh_after_mutation(Scope::feed(key.as_str())).await;
        Ok(confirmed)
    }

    /// Edit a post's body. Placeholder posts are edited locally only; the
    /// in-flight create forwards the final body once its id is confirmed.
    /// On failure the captured record is restored and the error surfaces.
    pub async fn edit_post(&self, feed: &str, post_id: &str, body: &str) -> Result<(), CoreError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CoreError::validation("post body must not be empty"));
        }
        let (key, snapshot) = {
            let mut store = self.store.lock();
            let key = store.resolve(feed);
            let post = store
                .post_mut(&key, post_id)
                .ok_or_else(|| CoreError::unknown("post", post_id))?;
            let snapshot = post.clone();
            post.body = body.to_string();
            (key, snapshot)
        };
        if snapshot.is_placeholder() {
            return Ok(());
        }
        match self.api.edit_post(&key, post_id, body).await {
            Ok(ack) => {
                self.absorb_ack(&ack);
                self.refresh_after_mutation(Scope::feed(key.as_str())).await;
                Ok(())
            }
            Err(error) => {
                self.store.lock().upsert_post(&key, snapshot);
                Err(error)
            }
        }
    }

    /// Delete a post. Placeholders vanish locally without a server call; a
    /// failed delete reinstates the captured record.
    pub async fn delete_post(&self, feed: &str, post_id: &str) -> Result<(), CoreError> {
        let (key, removed) = {
            let mut store = self.store.lock();
            let key = store.resolve(feed);
            let removed = store
                .remove_post(&key, post_id)
                .ok_or_else(|| CoreError::unknown("post", post_id))?;
            (key, removed)
        };
        if removed.is_placeholder() {
            return Ok(());
        }
        match self.api.delete_post(&key, post_id).await {
            Ok(ack) => {
                self.absorb_ack(&ack);
                self.refresh_after_mutation(Scope::feed(key.as_str())).await;
                Ok(())
            }
            Err(error) => {
                self.store.lock().upsert_post(&key, removed);
                Err(error)
            }
        }
    }

    /// Create a comment under a post, optionally nested under a parent
    /// comment. Behaves like [`Self::create_post`]: the placeholder stays
    /// visible on failure, is retargeted on confirmation, and a body edit
    /// made in flight is forwarded to the confirmed id.
    pub async fn create_comment(
        &self,
        feed: &str,
        post_id: &str,
        parent_id: Option<&str>,
        body: &str,
    ) -> Result<String, CoreError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CoreError::validation("comment body must not be empty"));
        }
        let (key, placeholder_id) = {
            let mut store = self.store.lock();
            let key = store.resolve(feed);
            let post = store
                .post_mut(&key, post_id)
                .ok_or_else(|| CoreError::unknown("post", post_id))?;
            let comment = Comment::placeholder(parent_id.map(str::to_string), body.to_string());
            let id = comment.id.clone();
            if !post.add_comment(comment) {
                return Err(CoreError::unknown("comment", parent_id.unwrap_or_default()));
            }
            (key, id)
        };
        let ack = self.api.create_comment(&key, post_id, parent_id, body).await?;
        let confirmed = ack.id.clone().unwrap_or_else(|| placeholder_id.clone());
        if confirmed != placeholder_id {
            self.store.lock().retarget_id(&placeholder_id, &confirmed);
            let edited = {
                let store = self.store.lock();
                store
                    .post(&key, post_id)
                    .and_then(|post| post.find_comment(&confirmed))
                    .filter(|comment| comment.body != body)
                    .map(|comment| comment.body.clone())
            };
            if let Some(edited) = edited {
                let edit_ack = self.api.edit_comment(&key, &confirmed, &edited).await?;
                self.absorb_ack(&edit_ack);
            }
        }
        self.absorb_ack(&ack);
        self.refresh_after_mutation(Scope::feed(key.as_str())).await;
        Ok(confirmed)
    }

    /// Edit a comment's body. Placeholder comments are edited locally only;
    /// the in-flight create forwards the final body once its id is
    /// confirmed. Rollback restores the whole enclosing post, so nested
    /// replies around the comment come back untouched.
    pub async fn edit_comment(
        &self,
        feed: &str,
        post_id: &str,
        comment_id: &str,
        body: &str,
    ) -> Result<(), CoreError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CoreError::validation("comment body must not be empty"));
        }
        let (key, snapshot, local_only) = {
            let mut store = self.store.lock();
            let key = store.resolve(feed);
            let post = store
                .post_mut(&key, post_id)
                .ok_or_else(|| CoreError::unknown("post", post_id))?;
            let snapshot = post.clone();
            let comment = post
                .find_comment_mut(comment_id)
                .ok_or_else(|| CoreError::unknown("comment", comment_id))?;
            let local_only = comment.is_placeholder();
            comment.body = body.to_string();
            (key, snapshot, local_only)
        };
        if local_only {
            return Ok(());
        }
        match self.api.edit_comment(&key, comment_id, body).await {
            Ok(ack) => {
                self.absorb_ack(&ack);
                self.refresh_after_mutation(Scope::feed(key.as_str())).await;
                Ok(())
            }
            Err(error) => {
                self.store.lock().upsert_post(&key, snapshot);
                Err(error)
            }
        }
    }

    /// Delete a comment and its replies. Placeholders vanish locally; a
    /// failed delete restores the enclosing post from its captured state.
    pub async fn delete_comment(
        &self,
        feed: &str,
        post_id: &str,
        comment_id: &str,
    ) -> Result<(), CoreError> {
        let (key, snapshot, local_only) = {
            let mut store = self.store.lock();
            let key = store.resolve(feed);
            let post = store
                .post_mut(&key, post_id)
                .ok_or_else(|| CoreError::unknown("post", post_id))?;
            let snapshot = post.clone();
            let removed = post
                .remove_comment(comment_id)
                .ok_or_else(|| CoreError::unknown("comment", comment_id))?;
            (key, snapshot, removed.is_placeholder())
        };
        if local_only {
            return Ok(());
        }
        match self.api.delete_comment(&key, comment_id).await {
            Ok(ack) => {
                self.absorb_ack(&ack);
                self.refresh_after_mutation(Scope::feed(key.as_str())).await;
                Ok(())
            }
            Err(error) => {
                self.store.lock().upsert_post(&key, snapshot);
                Err(error)
            }
        }
    }

    /// Upload raw bytes and return the URL to embed in a post body.
    pub async fn upload_attachment(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, CoreError> {
        if bytes.is_empty() {
            return Err(CoreError::validation("attachment must not be empty"));
        }
        self.api.upload_attachment(filename, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::models::{is_placeholder_id, FeedKey, Scope};
    use crate::testutil::{snapshot_with_post, test_engine, MockFeedApi};

    #[tokio::test]
    async fn test_create_post_retargets_placeholder_to_server_id() {
        let api = Arc::new(MockFeedApi::new());
        api.set_next_id("srv-1");
        let (engine, _dir) = test_engine(api.clone());

        let id = engine.create_post("feeds/alpha", "hello").await.unwrap();

        assert_eq!(id, "srv-1");
        let store = engine.store.lock();
        let posts = store.posts(&FeedKey::new("alpha"));
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "srv-1");
        assert!(!posts[0].is_placeholder());
        assert_eq!(api.fetch_count(), 1, "confirmation must trigger a feed refresh");
    }

    #[tokio::test]
    async fn test_create_post_failure_keeps_placeholder_and_surfaces_error() {
        let api = Arc::new(MockFeedApi::new());
        api.fail_mutations(true);
        let (engine, _dir) = test_engine(api.clone());

        let result = engine.create_post("alpha", "hello").await;

        assert!(result.is_err(), "server failure must surface");
        let store = engine.store.lock();
        let posts = store.posts(&FeedKey::new("alpha"));
        assert_eq!(posts.len(), 1, "placeholder must stay visible for retry");
        assert!(is_placeholder_id(&posts[0].id));
        assert_eq!(api.fetch_count(), 0, "no refresh without a confirmation");
    }

    #[tokio::test]
    async fn test_create_post_rejects_blank_body_before_any_write() {
        let api = Arc::new(MockFeedApi::new());
        let (engine, _dir) = test_engine(api.clone());

        let result = engine.create_post("alpha", "   ").await;

        assert!(result.is_err());
        assert_eq!(api.mutation_count(), 0, "validation must reject before the network");
        assert!(engine.store.lock().posts(&FeedKey::new("alpha")).is_empty());
    }

    #[tokio::test]
    async fn test_reaction_during_slow_create_survives_retarget() {
        let api = Arc::new(MockFeedApi::new().with_mutation_delay(Duration::from_millis(50)));
        api.set_next_id("srv-1");
        let (engine, _dir) = test_engine(api.clone());
        let engine = Arc::new(engine);

        let create = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.create_post("alpha", "hello").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        {
            let mut store = engine.store.lock();
            let key = store.resolve("alpha");
            let placeholder_id = store.posts(&key)[0].id.clone();
            if let Some(post) = store.post_mut(&key, &placeholder_id) {
                post.own_reaction = Some(crate::models::Reaction::Like);
            }
        }
        create.await.unwrap().unwrap();

        let store = engine.store.lock();
        let posts = store.posts(&FeedKey::new("alpha"));
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "srv-1");
        assert_eq!(
            posts[0].own_reaction,
            Some(crate::models::Reaction::Like),
            "state attached to the placeholder must carry over to the server id"
        );
    }

    #[tokio::test]
    async fn test_refresh_during_slow_comment_create_keeps_placeholder() {
        let api = Arc::new(MockFeedApi::new().with_mutation_delay(Duration::from_millis(80)));
        api.push_snapshot(snapshot_with_post("alpha", "srv-post", "root"));
        let (engine, _dir) = test_engine(api.clone());
        engine.refresh(&Scope::feed("alpha")).await.unwrap();
        let engine = Arc::new(engine);

        api.fail_mutations(true);
        let create = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .create_comment("alpha", "srv-post", None, "pending reply")
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        {
            let store = engine.store.lock();
            let post = store.post(&FeedKey::new("alpha"), "srv-post").expect("post cached");
            assert_eq!(post.comments.len(), 1, "the optimistic comment must be visible in flight");
        }
        api.push_snapshot(snapshot_with_post("alpha", "srv-post", "root"));
        engine.refresh(&Scope::feed("alpha")).await.unwrap();

        assert!(create.await.unwrap().is_err(), "the scripted failure must surface");
        let store = engine.store.lock();
        let post = store.post(&FeedKey::new("alpha"), "srv-post").expect("post cached");
        assert_eq!(
            post.comments.len(),
            1,
            "a failed confirm must leave the pending comment in place"
        );
        assert!(post.comments[0].is_placeholder());
    }

    #[tokio::test]
    async fn test_edit_during_slow_create_is_forwarded_to_the_server() {
        let api = Arc::new(MockFeedApi::new().with_mutation_delay(Duration::from_millis(50)));
        api.set_next_id("srv-1");
        let (engine, _dir) = test_engine(api.clone());
        let engine = Arc::new(engine);

        let create = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.create_post("alpha", "first draft").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let placeholder_id = {
            let store = engine.store.lock();
            store.posts(&FeedKey::new("alpha"))[0].id.clone()
        };
        engine.edit_post("alpha", &placeholder_id, "final body").await.unwrap();

        assert_eq!(create.await.unwrap().unwrap(), "srv-1");
        assert_eq!(
            api.last_edit(),
            Some(("srv-1".to_string(), "final body".to_string())),
            "the mid-flight edit must reach the confirmed id"
        );
        let store = engine.store.lock();
        let post = store.post(&FeedKey::new("alpha"), "srv-1").expect("post kept");
        assert_eq!(post.body, "final body");
    }

    #[tokio::test]
    async fn test_comment_edit_during_slow_create_is_forwarded() {
        let api = Arc::new(MockFeedApi::new().with_mutation_delay(Duration::from_millis(50)));
        api.set_next_id("srv-post");
        let (engine, _dir) = test_engine(api.clone());
        engine.create_post("alpha", "root").await.unwrap();
        let engine = Arc::new(engine);

        api.set_next_id("srv-c1");
        let create = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .create_comment("alpha", "srv-post", None, "first draft")
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let pending_id = {
            let store = engine.store.lock();
            let post = store.post(&FeedKey::new("alpha"), "srv-post").expect("post cached");
            post.comments[0].id.clone()
        };
        engine
            .edit_comment("alpha", "srv-post", &pending_id, "final body")
            .await
            .unwrap();

        assert_eq!(create.await.unwrap().unwrap(), "srv-c1");
        assert_eq!(
            api.last_edit(),
            Some(("srv-c1".to_string(), "final body".to_string())),
            "the mid-flight edit must follow the comment to its confirmed id"
        );
    }

    #[tokio::test]
    async fn test_edit_post_failure_restores_previous_body() {
        let api = Arc::new(MockFeedApi::new());
        api.set_next_id("srv-1");
        let (engine, _dir) = test_engine(api.clone());
        engine.create_post("alpha", "original").await.unwrap();

        api.fail_mutations(true);
        let result = engine.edit_post("alpha", "srv-1", "changed").await;

        assert!(result.is_err());
        let store = engine.store.lock();
        let post = store.post(&FeedKey::new("alpha"), "srv-1").expect("post kept");
        assert_eq!(post.body, "original", "failed edit must roll back");
    }

    #[tokio::test]
    async fn test_delete_placeholder_post_skips_network() {
        let api = Arc::new(MockFeedApi::new());
        api.fail_mutations(true);
        let (engine, _dir) = test_engine(api.clone());
        let _ = engine.create_post("alpha", "unsent").await;
        let placeholder_id = {
            let store = engine.store.lock();
            store.posts(&FeedKey::new("alpha"))[0].id.clone()
        };
        let mutations_before = api.mutation_count();

        engine.delete_post("alpha", &placeholder_id).await.unwrap();

        assert_eq!(
            api.mutation_count(),
            mutations_before,
            "discarding an unconfirmed post is purely local"
        );
        assert!(engine.store.lock().posts(&FeedKey::new("alpha")).is_empty());
    }

    #[tokio::test]
    async fn test_delete_post_failure_reinstates_record() {
        let api = Arc::new(MockFeedApi::new());
        api.set_next_id("srv-1");
        let (engine, _dir) = test_engine(api.clone());
        engine.create_post("alpha", "keep me").await.unwrap();

        api.fail_mutations(true);
        let result = engine.delete_post("alpha", "srv-1").await;

        assert!(result.is_err());
        let store = engine.store.lock();
        assert!(
            store.post(&FeedKey::new("alpha"), "srv-1").is_some(),
            "failed delete must restore the record"
        );
    }

    #[tokio::test]
    async fn test_create_comment_nests_under_parent_and_retargets() {
        let api = Arc::new(MockFeedApi::new());
        api.set_next_id("srv-post");
        let (engine, _dir) = test_engine(api.clone());
        engine.create_post("alpha", "root").await.unwrap();

        api.set_next_id("srv-c1");
        let top = engine
            .create_comment("alpha", "srv-post", None, "top level")
            .await
            .unwrap();
        api.set_next_id("srv-c2");
        let nested = engine
            .create_comment("alpha", "srv-post", Some(&top), "reply")
            .await
            .unwrap();

        let store = engine.store.lock();
        let post = store.post(&FeedKey::new("alpha"), "srv-post").expect("post");
        let parent = post.find_comment(&top).expect("top comment");
        assert_eq!(parent.children.len(), 1);
        assert_eq!(parent.children[0].id, nested);
    }

    #[tokio::test]
    async fn test_create_comment_under_unknown_parent_is_rejected() {
        let api = Arc::new(MockFeedApi::new());
        api.set_next_id("srv-post");
        let (engine, _dir) = test_engine(api.clone());
        engine.create_post("alpha", "root").await.unwrap();
        let mutations_before = api.mutation_count();

        let result = engine
            .create_comment("alpha", "srv-post", Some("missing"), "reply")
            .await;

        assert!(result.is_err());
        assert_eq!(api.mutation_count(), mutations_before);
    }

    #[tokio::test]
    async fn test_delete_comment_failure_restores_enclosing_post() {
        let api = Arc::new(MockFeedApi::new());
        api.set_next_id("srv-post");
        let (engine, _dir) = test_engine(api.clone());
        engine.create_post("alpha", "root").await.unwrap();
        api.set_next_id("srv-c1");
        engine
            .create_comment("alpha", "srv-post", None, "keep")
            .await
            .unwrap();

        api.fail_mutations(true);
        let result = engine.delete_comment("alpha", "srv-post", "srv-c1").await;

        assert!(result.is_err());
        let store = engine.store.lock();
        let post = store.post(&FeedKey::new("alpha"), "srv-post").expect("post");
        assert!(
            post.find_comment("srv-c1").is_some(),
            "failed delete must restore the comment tree"
        );
    }

    #[tokio::test]
    async fn test_upload_attachment_returns_server_url() {
        let api = Arc::new(MockFeedApi::new());
        let (engine, _dir) = test_engine(api);

        let url = engine
            .upload_attachment("photo.png", vec![1, 2, 3])
            .await
            .unwrap();
        assert!(!url.is_empty());

        let empty = engine.upload_attachment("photo.png", Vec::new()).await;
        assert!(empty.is_err(), "empty attachments are rejected locally");
    }
}
