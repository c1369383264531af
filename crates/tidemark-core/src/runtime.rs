use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::api::{FeedApi, HttpFeedApi};
use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::events::ChangeEvent;
use crate::models::{FeedSummary, Scope};
use crate::push::PushManager;
use crate::session::SessionStorage;
use crate::store::{shared_store, SharedFeedStore};
use crate::sync::ScopeRefresher;

/// The client-side synchronization engine.
///
/// Owns the local store, the per-scope refreshers, the push sockets, and the
/// persisted session, and exposes the mutation operations implemented in
/// [`crate::actions`]. One engine serves one signed-in user for the lifetime
/// of the process.
///
/// The engine spawns socket and refresh tasks, so it must be created and
/// driven from within a Tokio runtime.
pub struct SyncEngine {
    config: CoreConfig,
    pub(crate) api: Arc<dyn FeedApi>,
    pub(crate) store: SharedFeedStore,
    pub(crate) refresher: Arc<ScopeRefresher>,
    push: PushManager,
    session: parking_lot::Mutex<SessionStorage>,
    current_scope: parking_lot::Mutex<Option<Scope>>,
}

impl SyncEngine {
    /// Build an engine backed by the HTTP API from the config.
    pub fn new(config: CoreConfig) -> Result<Self, CoreError> {
        let api = Arc::new(HttpFeedApi::new(config.api_base.clone()));
        Self::with_api(config, api)
    }

    /// Build an engine over any [`FeedApi`] implementation.
    pub fn with_api(config: CoreConfig, api: Arc<dyn FeedApi>) -> Result<Self, CoreError> {
        std::fs::create_dir_all(&config.data_dir)?;
        let store = shared_store();
        let refresher = Arc::new(ScopeRefresher::new(api.clone(), store.clone()));
        let push = PushManager::new(
            &config.push_base,
            config.user_id.clone(),
            store.clone(),
            refresher.clone(),
        );
        let session = parking_lot::Mutex::new(SessionStorage::new(&config.data_dir));
        info!(api_base = %config.api_base, "sync engine ready");
        Ok(Self {
            config,
            api,
            store,
            refresher,
            push,
            session,
            current_scope: parking_lot::Mutex::new(None),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Shared handle to the local store. Readers lock it briefly; the engine
    /// never holds the lock across a network call.
    pub fn store(&self) -> SharedFeedStore {
        self.store.clone()
    }

    pub fn push(&self) -> &PushManager {
        &self.push
    }

    /// Receive a notification whenever a refresh pass lands in the store.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.refresher.subscribe_changes()
    }

    /// The scope to show first: the persisted last visit, or the all-feeds
    /// view when none was recorded.
    pub fn initial_scope(&self) -> Scope {
        self.session.lock().last_scope().unwrap_or(Scope::AllFeeds)
    }

    pub fn current_scope(&self) -> Option<Scope> {
        self.current_scope.lock().clone()
    }

    /// Make a scope current: tear down the previous scope's refresh and
    /// push tracking, open the new scope's push socket, and persist the
    /// visit. Selecting the already-current scope changes nothing.
    pub fn select_scope(&self, scope: &Scope) {
        {
            let mut current = self.current_scope.lock();
            if current.as_ref() == Some(scope) {
                return;
            }
            if let Some(previous) = current.take() {
                self.teardown_scope(&previous);
            }
            *current = Some(scope.clone());
        }
        if let Scope::Feed(identifier) = scope {
            self.push.subscribe_scope(identifier);
        }
        self.session.lock().set_last_scope(scope);
    }

    /// Leave the current scope without selecting another.
    pub fn leave_scope(&self) {
        if let Some(previous) = self.current_scope.lock().take() {
            self.teardown_scope(&previous);
        }
    }

    fn teardown_scope(&self, scope: &Scope) {
        self.refresher.close_scope(scope);
        if let Scope::Feed(identifier) = scope {
            self.push.unsubscribe_scope(identifier);
        }
    }

    /// Re-fetch a scope's snapshot. See [`ScopeRefresher::refresh`] for the
    /// coalescing behavior under concurrent triggers.
    pub async fn refresh(&self, scope: &Scope) -> Result<(), CoreError> {
        self.refresher.refresh(scope).await
    }

    /// Fetch the next page of the scope, if the server reported one.
    pub async fn load_older(&self, scope: &Scope) -> Result<bool, CoreError> {
        self.refresher.load_older(scope).await
    }

    /// Feeds currently cached, freshest first.
    pub fn cached_feeds(&self) -> Vec<FeedSummary> {
        self.store.lock().feeds().to_vec()
    }

    /// Tear down scope tracking and every push socket.
    pub fn shutdown(&self) {
        self.leave_scope();
        self.push.shutdown();
    }
}
