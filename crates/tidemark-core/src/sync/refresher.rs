use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use crate::api::FeedApi;
use crate::error::CoreError;
use crate::events::ChangeEvent;
use crate::models::Scope;
use crate::store::SharedFeedStore;
use crate::sync::reconcile;

/// Per-scope refresh gate. The mutex serializes fetches for one scope and
/// the pending flag coalesces triggers that arrive while a fetch is in
/// flight: however many pile up, exactly one follow-up fetch runs after the
/// current one, so the store always ends on post-trigger data.
struct ScopeGate {
    lock: tokio::sync::Mutex<()>,
    pending: AtomicBool,
}

impl ScopeGate {
    fn new() -> Self {
        Self {
            lock: tokio::sync::Mutex::new(()),
            pending: AtomicBool::new(false),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PageState {
    has_more: bool,
    next_cursor: Option<String>,
}

/// Fetches scope snapshots and folds them into the store.
///
/// Scopes are identified by canonical feed key, so triggers phrased against
/// any alias of a feed land on the same gate and the same epoch counter.
pub struct ScopeRefresher {
    api: Arc<dyn FeedApi>,
    store: SharedFeedStore,
    gates: parking_lot::Mutex<HashMap<String, Arc<ScopeGate>>>,
    // Bumped on close_scope; a fetch started before the bump discards its result.
    epochs: parking_lot::Mutex<HashMap<String, u64>>,
    pages: parking_lot::Mutex<HashMap<String, PageState>>,
    events: broadcast::Sender<ChangeEvent>,
}

impl ScopeRefresher {
    pub fn new(api: Arc<dyn FeedApi>, store: SharedFeedStore) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            api,
            store,
            gates: parking_lot::Mutex::new(HashMap::new()),
            epochs: parking_lot::Mutex::new(HashMap::new()),
            pages: parking_lot::Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    fn canonical_key(&self, scope: &Scope) -> String {
        let store = self.store.lock();
        scope.canonical_key(store.feeds())
    }

    fn gate(&self, key: &str) -> Arc<ScopeGate> {
        let mut gates = self.gates.lock();
        gates
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(ScopeGate::new()))
            .clone()
    }

    fn epoch(&self, key: &str) -> u64 {
        *self.epochs.lock().get(key).unwrap_or(&0)
    }

    /// Refresh a scope from the server.
    ///
    /// Concurrent calls for the same scope never fan out: the first caller
    /// fetches while later callers mark the scope dirty and return once the
    /// holder has drained the flag with one follow-up fetch.
    pub async fn refresh(&self, scope: &Scope) -> Result<(), CoreError> {
        let key = self.canonical_key(scope);
        let gate = self.gate(&key);
        gate.pending.store(true, Ordering::SeqCst);
        let _guard = gate.lock.lock().await;
        while gate.pending.swap(false, Ordering::SeqCst) {
            self.run_fetch(scope, &key, None).await?;
        }
        Ok(())
    }

    /// Fetch the next page for a scope, appending to what is cached.
    ///
    /// Returns whether more pages remain. Without a recorded cursor state
    /// (no refresh yet, or the last page reported the end) this is a no-op.
    pub async fn load_older(&self, scope: &Scope) -> Result<bool, CoreError> {
        let key = self.canonical_key(scope);
        let cursor = {
            let pages = self.pages.lock();
            match pages.get(&key) {
                Some(page) if page.has_more => page.next_cursor.clone(),
                _ => return Ok(false),
            }
        };
        let gate = self.gate(&key);
        let _guard = gate.lock.lock().await;
        self.run_fetch(scope, &key, cursor).await?;
        let more = self.pages.lock().get(&key).map(|page| page.has_more);
        Ok(more.unwrap_or(false))
    }

    /// Drop a scope's pagination state and invalidate fetches already in
    /// flight for it, so a response landing after teardown is discarded.
    pub fn close_scope(&self, scope: &Scope) {
        let key = self.canonical_key(scope);
        *self.epochs.lock().entry(key.clone()).or_insert(0) += 1;
        self.pages.lock().remove(&key);
    }

    async fn run_fetch(
        &self,
        scope: &Scope,
        key: &str,
        cursor: Option<String>,
    ) -> Result<(), CoreError> {
        let started_at = self.epoch(key);
        let snapshot = self.api.fetch_scope(scope, cursor.as_deref()).await?;
        if self.epoch(key) != started_at {
            debug!(scope = key, "discarding snapshot for closed scope");
            return Ok(());
        }
        let page = PageState {
            has_more: snapshot.has_more.unwrap_or(false),
            next_cursor: snapshot.next_cursor.clone(),
        };
        {
            let mut store = self.store.lock();
            reconcile::apply_snapshot(&mut store, scope, snapshot);
        }
        self.pages.lock().insert(key.to_string(), page);
        let _ = self.events.send(ChangeEvent::ScopeRefreshed {
            scope: key.to_string(),
        });
        Ok(())
    }
}
