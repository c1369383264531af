use crate::error::CoreError;
use crate::models::{now_rfc3339, placeholder_id, FeedKey, FeedSummary, Scope};
use crate::runtime::SyncEngine;

// ===== Feed membership =====

impl SyncEngine {
    /// Toggle the caller's subscription to a feed.
    ///
    /// Owned feeds are rejected before any local write. Feeds not yet cached
    /// get a subscribed record synthesized on the spot so search results
    /// react instantly. On failure the captured prior state is restored
    /// exactly; a synthesized record is removed outright.
    ///
    /// Returns the subscription state now in effect.
    pub async fn toggle_subscription(&self, identifier: &str) -> Result<bool, CoreError> {
        let (key, prior, target) = {
            let mut store = self.store.lock();
            let key = store.resolve(identifier);
            let prior = store.feed(identifier).cloned();
            if prior.as_ref().map(FeedSummary::is_owned).unwrap_or(false) {
                return Err(CoreError::OwnedFeed);
            }
            let target = !prior.as_ref().map(FeedSummary::is_subscribed).unwrap_or(false);
            match &prior {
                Some(existing) => {
                    let mut updated = existing.clone();
                    updated.subscribed = Some(target);
                    updated.subscriber_count = Some(if target {
                        existing.subscribers().saturating_add(1)
                    } else {
                        existing.subscribers().saturating_sub(1)
                    });
                    store.replace_feed(updated);
                }
                None => {
                    let mut synthesized = FeedSummary::new(key.clone());
                    synthesized.subscribed = Some(true);
                    synthesized.subscriber_count = Some(1);
                    store.upsert_feed(synthesized);
                }
            }
            (key, prior, target)
        };
        let call = if target {
            self.api.subscribe(&key).await
        } else {
            self.api.unsubscribe(&key).await
        };
        match call {
            Ok(ack) => {
                self.absorb_ack(&ack);
                Ok(target)
            }
            Err(error) => {
                let mut store = self.store.lock();
                match prior {
                    Some(snapshot) => store.replace_feed(snapshot),
                    None => {
                        store.remove_feed(&key);
                    }
                }
                Err(error)
            }
        }
    }

    /// Create a feed and make it the current scope.
    ///
    /// The record is synthesized under a placeholder key so the feed is
    /// browsable immediately; confirmation renames it in place, re-selects
    /// it, and re-fetches the feed list. On failure the placeholder record
    /// stays and the error surfaces.
    ///
    /// Returns the key the feed ends up under.
    pub async fn create_feed(&self, name: &str) -> Result<FeedKey, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("feed name must not be empty"));
        }
        let placeholder = FeedKey::new(placeholder_id());
        {
            let mut store = self.store.lock();
            let mut summary = FeedSummary::new(placeholder.clone());
            summary.name = Some(name.to_string());
            summary.owned = Some(true);
            summary.subscribed = Some(false);
            summary.subscriber_count = Some(0);
            summary.last_active = Some(now_rfc3339());
            store.upsert_feed(summary);
        }
        self.select_scope(&Scope::feed(placeholder.as_str()));
        let ack = self.api.create_feed(name).await?;
        let confirmed = match &ack.id {
            Some(id) => FeedKey::new(id.clone()),
            None => placeholder.clone(),
        };
        if confirmed != placeholder {
            self.store.lock().retarget_feed(&placeholder, confirmed.clone());
            self.select_scope(&Scope::feed(confirmed.as_str()));
        }
        self.absorb_ack(&ack);
        self.refresh_after_mutation(Scope::AllFeeds).await;
        Ok(confirmed)
    }

    /// Query the server's feed directory. Results are returned, not cached;
    /// subscribing to one is what brings it into the store.
    pub async fn search_feeds(&self, query: &str) -> Result<Vec<FeedSummary>, CoreError> {
        self.api.search_feeds(query.trim()).await
    }
}
