use serde::Deserialize;
use tracing::debug;

use crate::constants::push::RECOGNIZED;
use crate::models::{resolve_feed_key, FeedSummary};

/// One invalidation frame from the push socket.
///
/// Frames name the record that changed but never carry its data; the payload
/// of record ids exists so clients can target finer updates later.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PushEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub feed: String,
    #[serde(default)]
    pub post: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
}

impl PushEvent {
    /// Parse a frame's text. Undecodable or incomplete frames yield `None`;
    /// the socket drops them without disturbing the connection.
    pub(crate) fn parse(text: &str) -> Option<PushEvent> {
        let event: PushEvent = match serde_json::from_str(text) {
            Ok(event) => event,
            Err(error) => {
                debug!(error = %error, "dropping undecodable push frame");
                return None;
            }
        };
        if event.kind.is_empty() || event.feed.is_empty() {
            debug!("dropping push frame without type or feed");
            return None;
        }
        Some(event)
    }

    pub(crate) fn is_recognized(&self) -> bool {
        RECOGNIZED.contains(&self.kind.as_str())
    }
}

/// Tracked scope keys that an event for `event_feed` invalidates.
///
/// Matching is identity-insensitive: the event's feed reference and each
/// tracked key are both resolved against the known feeds, so a scope keyed
/// by fingerprint still matches an event naming the feed by id.
pub(crate) fn scopes_to_refresh(
    tracked: &[String],
    event_feed: &str,
    known: &[FeedSummary],
) -> Vec<String> {
    let event_key = resolve_feed_key(event_feed, known);
    tracked
        .iter()
        .filter(|scope| resolve_feed_key(scope, known) == event_key)
        .cloned()
        .collect()
}
