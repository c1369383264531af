//! Application-wide constants
//!
//! Centralized location for magic strings and tuning values that are
//! used across multiple modules.

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "https://feeds.tidemark.net";

/// Namespace prefix stripped from raw feed identifiers
pub const FEED_PREFIX: &str = "feeds/";

/// Sentinel scope key meaning "all feeds"
pub const ALL_FEEDS_SCOPE: &str = "_all";

/// Prefix for locally-generated ids awaiting server confirmation
pub const PLACEHOLDER_ID_PREFIX: &str = "local-";

/// Display name used for feeds synthesized before the server describes them
pub const DEFAULT_FEED_NAME: &str = "Untitled feed";

/// Delay before a dropped push connection is reopened
pub const RECONNECT_DELAY_SECS: u64 = 3;

/// File under the data directory recording the last-visited scope
pub const SESSION_FILE: &str = "session.json";

// Push event types emitted by the server
pub mod push {
    /// A post was created in the feed
    pub const POST_CREATE: &str = "post/create";
    /// A post's body or attachments changed
    pub const POST_EDIT: &str = "post/edit";
    /// A post was removed
    pub const POST_DELETE: &str = "post/delete";
    /// A comment was created under a post
    pub const COMMENT_CREATE: &str = "comment/create";
    /// A comment's body changed
    pub const COMMENT_EDIT: &str = "comment/edit";
    /// A comment was removed
    pub const COMMENT_DELETE: &str = "comment/delete";
    /// A reaction tally changed
    pub const REACTION_CHANGE: &str = "reaction/change";

    /// Event types that trigger a scoped refresh; anything else is ignored.
    pub const RECOGNIZED: &[&str] = &[
        POST_CREATE,
        POST_EDIT,
        POST_DELETE,
        COMMENT_CREATE,
        COMMENT_EDIT,
        COMMENT_DELETE,
        REACTION_CHANGE,
    ];
}
