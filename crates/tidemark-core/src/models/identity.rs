use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{ALL_FEEDS_SCOPE, FEED_PREFIX};
use crate::models::FeedSummary;

/// Canonical identity of a feed inside the client cache.
///
/// Construction strips the `feeds/` namespace prefix, so keys built from the
/// raw entity id and the prefixed variant compare equal. Fingerprints are a
/// third identifier form and resolve through [`resolve_feed_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedKey(String);

impl FeedKey {
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        match identifier.strip_prefix(FEED_PREFIX) {
            Some(stripped) => Self(stripped.to_string()),
            None => Self(identifier),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FeedKey {
    fn default() -> Self {
        Self(String::new())
    }
}

impl fmt::Display for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FeedKey {
    fn from(identifier: &str) -> Self {
        Self::new(identifier)
    }
}

impl From<String> for FeedKey {
    fn from(identifier: String) -> Self {
        Self::new(identifier)
    }
}

impl Serialize for FeedKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FeedKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(FeedKey::new(raw))
    }
}

/// Resolve any feed identifier form to a canonical [`FeedKey`].
///
/// Accepts the raw entity id, the `feeds/`-prefixed variant, or a content
/// fingerprint. Fingerprints are opaque and matched only by equality against
/// the fingerprint recorded on a known feed. An identifier matching nothing
/// is returned prefix-stripped as a best-effort key.
pub fn resolve_feed_key(identifier: &str, known: &[FeedSummary]) -> FeedKey {
    let key = FeedKey::new(identifier);
    if known.iter().any(|feed| feed.id == key) {
        return key;
    }
    if let Some(feed) = known
        .iter()
        .find(|feed| feed.fingerprint.as_deref() == Some(identifier))
    {
        return feed.id.clone();
    }
    key
}

/// A unit of synchronization: the all-feeds view or one feed's post list.
///
/// `Feed` holds the identifier in whatever form the caller used; canonical
/// comparison goes through [`Scope::canonical_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    AllFeeds,
    Feed(String),
}

impl Scope {
    pub fn feed(identifier: impl Into<String>) -> Self {
        Self::Feed(identifier.into())
    }

    /// Stable string form used for persistence and push socket keys.
    pub fn storage_key(&self) -> String {
        match self {
            Scope::AllFeeds => ALL_FEEDS_SCOPE.to_string(),
            Scope::Feed(identifier) => identifier.clone(),
        }
    }

    pub fn from_storage_key(key: &str) -> Self {
        if key == ALL_FEEDS_SCOPE {
            Scope::AllFeeds
        } else {
            Scope::Feed(key.to_string())
        }
    }

    /// Identity-insensitive key: two scopes naming the same feed through
    /// different identifier forms produce the same canonical key.
    pub fn canonical_key(&self, known: &[FeedSummary]) -> String {
        match self {
            Scope::AllFeeds => ALL_FEEDS_SCOPE.to_string(),
            Scope::Feed(identifier) => resolve_feed_key(identifier, known).into_string(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::AllFeeds => write!(f, "all feeds"),
            Scope::Feed(identifier) => write!(f, "feed {identifier}"),
        }
    }
}
