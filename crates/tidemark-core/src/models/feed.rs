use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_FEED_NAME;
use crate::models::identity::FeedKey;
use crate::models::parse_ts;

/// Summary record for one feed as held in the local cache.
///
/// Everything but the id is optional on the wire. Absent fields never blank
/// cached values; see [`FeedSummary::merge_from`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSummary {
    pub id: FeedKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriber_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<String>,
}

impl FeedSummary {
    pub fn new(id: impl Into<FeedKey>) -> Self {
        Self {
            id: id.into(),
            fingerprint: None,
            name: None,
            subscriber_count: None,
            subscribed: None,
            owned: None,
            last_active: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_FEED_NAME)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.unwrap_or(false)
    }

    pub fn is_owned(&self) -> bool {
        self.owned.unwrap_or(false)
    }

    pub fn subscribers(&self) -> u32 {
        self.subscriber_count.unwrap_or(0)
    }

    pub fn last_active_ts(&self) -> Option<i64> {
        self.last_active.as_deref().and_then(parse_ts)
    }

    /// Field-wise partial merge: present fields overwrite, absent fields
    /// keep the cached value.
    pub fn merge_from(&mut self, incoming: FeedSummary) {
        if incoming.fingerprint.is_some() {
            self.fingerprint = incoming.fingerprint;
        }
        if incoming.name.is_some() {
            self.name = incoming.name;
        }
        if incoming.subscriber_count.is_some() {
            self.subscriber_count = incoming.subscriber_count;
        }
        if incoming.subscribed.is_some() {
            self.subscribed = incoming.subscribed;
        }
        if incoming.owned.is_some() {
            self.owned = incoming.owned;
        }
        if incoming.last_active.is_some() {
            self.last_active = incoming.last_active;
        }
    }
}

/// Sort order for the feed list: most recently active first, feeds without
/// a parseable timestamp last.
pub(crate) fn most_recent_first(a: &FeedSummary, b: &FeedSummary) -> Ordering {
    match (a.last_active_ts(), b.last_active_ts()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
