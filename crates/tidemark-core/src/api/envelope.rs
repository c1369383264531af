use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::models::{FeedSummary, Post};

/// One page of server state for a scope.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// The scope's own feed record, richer than its entry in `feeds`.
    /// Absent for the all-feeds scope.
    #[serde(default)]
    pub feed: Option<FeedSummary>,
    #[serde(default)]
    pub feeds: Option<Vec<FeedSummary>>,
    #[serde(default)]
    pub posts: Option<Vec<Post>>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Confirmation payload for a mutation request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationAck {
    /// Server-assigned id of the created or touched record.
    #[serde(default)]
    pub id: Option<String>,
    /// Updated summary of the affected feed.
    #[serde(default)]
    pub feed: Option<FeedSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AttachmentAck {
    #[serde(default)]
    pub url: String,
}

/// The two historical response shapes: a payload wrapped in `{"data": ...}`
/// or the bare payload itself.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

/// Normalize either envelope shape into the payload type. An unrecognized
/// shape is logged and treated as empty so rendering proceeds with partial
/// data.
pub(crate) fn normalize<T: DeserializeOwned + Default>(value: Value) -> T {
    match serde_json::from_value::<Envelope<T>>(value) {
        Ok(Envelope::Wrapped { data }) => data,
        Ok(Envelope::Bare(payload)) => payload,
        Err(err) => {
            warn!(error = %err, "unrecognized response shape, treating as empty");
            T::default()
        }
    }
}
