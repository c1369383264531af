pub mod comment;
pub mod feed;
pub mod identity;
pub mod post;
pub mod reaction;

pub use comment::Comment;
pub use feed::FeedSummary;
pub use identity::{resolve_feed_key, FeedKey, Scope};
pub use post::Post;
pub use reaction::{Reaction, ReactionEntry, ReactionTally, ReactionTarget};

use uuid::Uuid;

use crate::constants::PLACEHOLDER_ID_PREFIX;

/// Generate an id for an optimistically created record.
pub fn placeholder_id() -> String {
    format!("{}{}", PLACEHOLDER_ID_PREFIX, Uuid::new_v4())
}

/// True when an id was minted locally and not yet confirmed by the server.
pub fn is_placeholder_id(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_ID_PREFIX)
}

/// Current time in the wire timestamp format.
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Parse a wire timestamp; `None` for anything unparseable.
pub(crate) fn parse_ts(raw: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.timestamp_millis())
}
