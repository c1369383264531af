use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// The fixed set of reaction kinds the client counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Heart,
    Laugh,
    Surprise,
    Sad,
    Angry,
}

impl Reaction {
    pub const ALL: [Reaction; 6] = [
        Reaction::Like,
        Reaction::Heart,
        Reaction::Laugh,
        Reaction::Surprise,
        Reaction::Sad,
        Reaction::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::Like => "like",
            Reaction::Heart => "heart",
            Reaction::Laugh => "laugh",
            Reaction::Surprise => "surprise",
            Reaction::Sad => "sad",
            Reaction::Angry => "angry",
        }
    }

    pub fn parse(raw: &str) -> Option<Reaction> {
        match raw {
            "like" => Some(Reaction::Like),
            "heart" => Some(Reaction::Heart),
            "laugh" => Some(Reaction::Laugh),
            "surprise" => Some(Reaction::Surprise),
            "sad" => Some(Reaction::Sad),
            "angry" => Some(Reaction::Angry),
            _ => None,
        }
    }
}

/// One raw reaction as echoed by the server.
///
/// The kind stays a string so unknown values survive a round trip; they are
/// simply not counted into the tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEntry {
    #[serde(default)]
    pub sender: Option<String>,
    pub kind: String,
}

/// What a reaction is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionTarget {
    Post { post: String },
    Comment { post: String, comment: String },
}

impl ReactionTarget {
    pub fn post_id(&self) -> &str {
        match self {
            ReactionTarget::Post { post } => post,
            ReactionTarget::Comment { post, .. } => post,
        }
    }

    pub fn comment_id(&self) -> Option<&str> {
        match self {
            ReactionTarget::Post { .. } => None,
            ReactionTarget::Comment { comment, .. } => Some(comment),
        }
    }
}

/// Counts per reaction kind, derived on demand and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionTally {
    counts: HashMap<Reaction, u32>,
}

impl ReactionTally {
    pub fn count(&self, kind: Reaction) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn add(&mut self, kind: Reaction) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }
}

/// Selecting the current reaction again clears it; selecting a different one
/// switches to it.
pub fn apply_toggle(current: Option<Reaction>, selected: Reaction) -> Option<Reaction> {
    if current == Some(selected) {
        None
    } else {
        Some(selected)
    }
}

/// Recompute a tally from the raw reaction list plus the caller's own state.
///
/// The caller's server-echoed entries are excluded from the base count and
/// represented solely by `own`, so an optimistic toggle that the server has
/// not echoed yet (or has echoed but the caller since changed) counts once.
pub fn tally_reactions(
    entries: &[ReactionEntry],
    own: Option<Reaction>,
    user_id: Option<&str>,
) -> ReactionTally {
    let mut tally = ReactionTally::default();
    for entry in entries {
        if user_id.is_some() && entry.sender.as_deref() == user_id {
            continue;
        }
        if let Some(kind) = Reaction::parse(&entry.kind) {
            tally.add(kind);
        }
    }
    if let Some(kind) = own {
        tally.add(kind);
    }
    tally
}

/// Lenient deserializer for own-reaction fields: unknown kinds become `None`
/// instead of failing the whole record.
pub(crate) fn lenient<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Reaction>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Reaction::parse))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sender: &str, kind: &str) -> ReactionEntry {
        ReactionEntry {
            sender: Some(sender.to_string()),
            kind: kind.to_string(),
        }
    }

    #[test]
    fn test_toggle_clears_same_and_switches_different() {
        assert_eq!(apply_toggle(None, Reaction::Like), Some(Reaction::Like));
        assert_eq!(apply_toggle(Some(Reaction::Like), Reaction::Like), None);
        assert_eq!(
            apply_toggle(Some(Reaction::Like), Reaction::Heart),
            Some(Reaction::Heart)
        );
    }

    #[test]
    fn test_tally_round_trips_through_toggle() {
        let entries = vec![entry("other", "like")];
        let original = tally_reactions(&entries, None, Some("me"));

        let own = apply_toggle(None, Reaction::Like);
        let liked = tally_reactions(&entries, own, Some("me"));
        assert_eq!(liked.count(Reaction::Like), 2);

        let own = apply_toggle(own, Reaction::Like);
        let reverted = tally_reactions(&entries, own, Some("me"));
        assert_eq!(reverted, original, "toggle off must restore the tally");
    }

    #[test]
    fn test_own_reaction_supersedes_echoed_entry() {
        // The server already echoed the caller's like; switching to heart
        // must not count the stale like.
        let entries = vec![entry("me", "like"), entry("other", "like")];
        let tally = tally_reactions(&entries, Some(Reaction::Heart), Some("me"));
        assert_eq!(tally.count(Reaction::Like), 1);
        assert_eq!(tally.count(Reaction::Heart), 1);
    }

    #[test]
    fn test_unknown_kinds_are_preserved_but_uncounted() {
        let entries = vec![entry("other", "confetti"), entry("other", "like")];
        let tally = tally_reactions(&entries, None, Some("me"));
        assert_eq!(tally.total(), 1, "unknown kinds must not be counted");
    }

    #[test]
    fn test_anonymous_entries_count_as_other_users() {
        let entries = vec![ReactionEntry {
            sender: None,
            kind: "sad".to_string(),
        }];
        let tally = tally_reactions(&entries, None, Some("me"));
        assert_eq!(tally.count(Reaction::Sad), 1);
    }
}
