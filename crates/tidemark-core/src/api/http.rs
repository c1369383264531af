use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};

use crate::api::envelope::{normalize, AttachmentAck, MutationAck, Snapshot};
use crate::api::FeedApi;
use crate::error::CoreError;
use crate::models::{FeedKey, FeedSummary, Reaction, ReactionTarget, Scope};

/// Production [`FeedApi`] over the request/response HTTP endpoints.
pub struct HttpFeedApi {
    client: Client,
    base: String,
}

impl HttpFeedApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/_{}", self.base, path)
    }

    async fn check(response: Response) -> Result<Response, CoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(CoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_ack(response: Response) -> Result<MutationAck, CoreError> {
        let value: Value = Self::check(response).await?.json().await?;
        Ok(normalize::<MutationAck>(value))
    }
}

#[async_trait]
impl FeedApi for HttpFeedApi {
    async fn fetch_scope(
        &self,
        scope: &Scope,
        cursor: Option<&str>,
    ) -> Result<Snapshot, CoreError> {
        let mut request = self.client.get(self.url("/feed-view"));
        if let Scope::Feed(identifier) = scope {
            request = request.query(&[("feed", identifier.as_str())]);
        }
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        let value: Value = Self::check(request.send().await?).await?.json().await?;
        Ok(normalize::<Snapshot>(value))
    }

    async fn create_post(&self, feed: &FeedKey, body: &str) -> Result<MutationAck, CoreError> {
        let response = self
            .client
            .post(self.url("/posts"))
            .json(&json!({ "feed": feed.as_str(), "body": body }))
            .send()
            .await?;
        Self::read_ack(response).await
    }

    async fn edit_post(
        &self,
        feed: &FeedKey,
        post_id: &str,
        body: &str,
    ) -> Result<MutationAck, CoreError> {
        let response = self
            .client
            .patch(self.url(&format!("/posts/{post_id}")))
            .json(&json!({ "feed": feed.as_str(), "body": body }))
            .send()
            .await?;
        Self::read_ack(response).await
    }

    async fn delete_post(&self, feed: &FeedKey, post_id: &str) -> Result<MutationAck, CoreError> {
        let response = self
            .client
            .delete(self.url(&format!("/posts/{post_id}")))
            .query(&[("feed", feed.as_str())])
            .send()
            .await?;
        Self::read_ack(response).await
    }

    async fn create_comment(
        &self,
        feed: &FeedKey,
        post_id: &str,
        parent_id: Option<&str>,
        body: &str,
    ) -> Result<MutationAck, CoreError> {
        let response = self
            .client
            .post(self.url("/comments"))
            .json(&json!({
                "feed": feed.as_str(),
                "post": post_id,
                "parent": parent_id,
                "body": body,
            }))
            .send()
            .await?;
        Self::read_ack(response).await
    }

    async fn edit_comment(
        &self,
        feed: &FeedKey,
        comment_id: &str,
        body: &str,
    ) -> Result<MutationAck, CoreError> {
        let response = self
            .client
            .patch(self.url(&format!("/comments/{comment_id}")))
            .json(&json!({ "feed": feed.as_str(), "body": body }))
            .send()
            .await?;
        Self::read_ack(response).await
    }

    async fn delete_comment(
        &self,
        feed: &FeedKey,
        comment_id: &str,
    ) -> Result<MutationAck, CoreError> {
        let response = self
            .client
            .delete(self.url(&format!("/comments/{comment_id}")))
            .query(&[("feed", feed.as_str())])
            .send()
            .await?;
        Self::read_ack(response).await
    }

    async fn react(
        &self,
        feed: &FeedKey,
        target: &ReactionTarget,
        reaction: Reaction,
    ) -> Result<(), CoreError> {
        let response = self
            .client
            .post(self.url("/reactions"))
            .json(&json!({
                "feed": feed.as_str(),
                "post": target.post_id(),
                "comment": target.comment_id(),
                "reaction": reaction.as_str(),
            }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn subscribe(&self, feed: &FeedKey) -> Result<MutationAck, CoreError> {
        let response = self
            .client
            .put(self.url(&format!("/feeds/{}/subscription", feed.as_str())))
            .send()
            .await?;
        Self::read_ack(response).await
    }

    async fn unsubscribe(&self, feed: &FeedKey) -> Result<MutationAck, CoreError> {
        let response = self
            .client
            .delete(self.url(&format!("/feeds/{}/subscription", feed.as_str())))
            .send()
            .await?;
        Self::read_ack(response).await
    }

    async fn create_feed(&self, name: &str) -> Result<MutationAck, CoreError> {
        let response = self
            .client
            .post(self.url("/feeds"))
            .json(&json!({ "name": name }))
            .send()
            .await?;
        Self::read_ack(response).await
    }

    async fn search_feeds(&self, query: &str) -> Result<Vec<FeedSummary>, CoreError> {
        let response = self
            .client
            .get(self.url("/feeds"))
            .query(&[("query", query)])
            .send()
            .await?;
        let value: Value = Self::check(response).await?.json().await?;
        let snapshot = normalize::<Snapshot>(value);
        Ok(snapshot.feeds.unwrap_or_default())
    }

    async fn upload_attachment(&self, filename: &str, bytes: Vec<u8>) -> Result<String, CoreError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.url("/attachments"))
            .multipart(form)
            .send()
            .await?;
        let value: Value = Self::check(response).await?.json().await?;
        let ack = normalize::<AttachmentAck>(value);
        if ack.url.is_empty() {
            return Err(CoreError::Malformed {
                message: "attachment response carried no url".to_string(),
            });
        }
        Ok(ack.url)
    }
}
