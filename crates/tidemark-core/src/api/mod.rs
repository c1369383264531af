pub mod envelope;
pub mod http;

pub use envelope::{MutationAck, Snapshot};
pub use http::HttpFeedApi;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::{FeedKey, FeedSummary, Reaction, ReactionTarget, Scope};

/// The request/response surface the engine talks to.
///
/// Implemented over HTTP in production and by an in-memory double in tests;
/// the engine receives it by injection and never constructs one itself.
#[async_trait]
pub trait FeedApi: Send + Sync {
    /// Fetch one page of a scope. `cursor` of `None` means the head page.
    async fn fetch_scope(&self, scope: &Scope, cursor: Option<&str>)
        -> Result<Snapshot, CoreError>;

    async fn create_post(&self, feed: &FeedKey, body: &str) -> Result<MutationAck, CoreError>;
    async fn edit_post(
        &self,
        feed: &FeedKey,
        post_id: &str,
        body: &str,
    ) -> Result<MutationAck, CoreError>;
    async fn delete_post(&self, feed: &FeedKey, post_id: &str) -> Result<MutationAck, CoreError>;

    async fn create_comment(
        &self,
        feed: &FeedKey,
        post_id: &str,
        parent_id: Option<&str>,
        body: &str,
    ) -> Result<MutationAck, CoreError>;
    async fn edit_comment(
        &self,
        feed: &FeedKey,
        comment_id: &str,
        body: &str,
    ) -> Result<MutationAck, CoreError>;
    async fn delete_comment(
        &self,
        feed: &FeedKey,
        comment_id: &str,
    ) -> Result<MutationAck, CoreError>;

    /// Record the caller's reaction on a post or comment. Clearing a
    /// reaction is a local-only transition and never reaches this call.
    async fn react(
        &self,
        feed: &FeedKey,
        target: &ReactionTarget,
        reaction: Reaction,
    ) -> Result<(), CoreError>;

    async fn subscribe(&self, feed: &FeedKey) -> Result<MutationAck, CoreError>;
    async fn unsubscribe(&self, feed: &FeedKey) -> Result<MutationAck, CoreError>;

    async fn create_feed(&self, name: &str) -> Result<MutationAck, CoreError>;
    async fn search_feeds(&self, query: &str) -> Result<Vec<FeedSummary>, CoreError>;

    /// Upload an attachment, returning the URL to embed in a post body.
    async fn upload_attachment(&self, filename: &str, bytes: Vec<u8>) -> Result<String, CoreError>;
}
