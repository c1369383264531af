use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::constants::RECONNECT_DELAY_SECS;
use crate::models::{is_placeholder_id, Scope};
use crate::push::event::{scopes_to_refresh, PushEvent};
use crate::push::socket::run_scope_socket;
use crate::store::SharedFeedStore;
use crate::sync::ScopeRefresher;

/// Lifecycle of one scope's push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    Disconnected,
    Connecting,
    Open,
    ClosedPendingReconnect,
}

/// Handle to an open scope socket. Dropping the sender tells the socket
/// task to wind down, same as an explicit close signal.
struct ScopeConn {
    close_tx: watch::Sender<bool>,
}

pub(crate) struct PushInner {
    pub(crate) push_base: String,
    pub(crate) user_id: Option<String>,
    pub(crate) store: SharedFeedStore,
    pub(crate) refresher: Arc<ScopeRefresher>,
    pub(crate) reconnect_delay: Duration,
    conns: parking_lot::Mutex<HashMap<String, ScopeConn>>,
    states: parking_lot::Mutex<HashMap<String, ScopeState>>,
}

impl PushInner {
    pub(crate) fn tracked_scopes(&self) -> Vec<String> {
        self.conns.lock().keys().cloned().collect()
    }

    pub(crate) fn is_tracked(&self, scope_key: &str) -> bool {
        self.conns.lock().contains_key(scope_key)
    }

    pub(crate) fn set_state(&self, scope_key: &str, state: ScopeState) {
        self.states.lock().insert(scope_key.to_string(), state);
    }

    /// Drop a scope's state entry once its socket task exits. A fresh
    /// subscription may already have replaced the connection; its state
    /// entry belongs to the new task and stays.
    pub(crate) fn clear_state(&self, scope_key: &str) {
        if !self.is_tracked(scope_key) {
            self.states.lock().remove(scope_key);
        }
    }

    /// React to one text frame from a scope socket.
    ///
    /// Frames are invalidation hints, never data: a recognized event for a
    /// tracked feed schedules that scope's refresh and nothing else. A
    /// failed refresh is retried on the reconnect cadence until it lands or
    /// the scope is dropped, so an invalidation is never lost. The caller's
    /// own echoes and unrecognized event types are ignored.
    pub(crate) fn handle_frame(self: &Arc<Self>, text: &str) {
        let event = match PushEvent::parse(text) {
            Some(event) => event,
            None => return,
        };
        if let (Some(sender), Some(user)) = (&event.sender, &self.user_id) {
            if sender == user {
                debug!(kind = %event.kind, "ignoring own push event");
                return;
            }
        }
        if !event.is_recognized() {
            debug!(kind = %event.kind, "ignoring unrecognized push event");
            return;
        }
        let tracked = self.tracked_scopes();
        let known = self.store.lock().feeds().to_vec();
        for scope_key in scopes_to_refresh(&tracked, &event.feed, &known) {
            let inner = Arc::clone(self);
            tokio::spawn(async move {
                let scope = Scope::feed(scope_key.clone());
                loop {
                    match inner.refresher.refresh(&scope).await {
                        Ok(()) => return,
                        Err(error) => {
                            warn!(
                                scope = %scope_key,
                                error = %error,
                                "push-triggered refresh failed; retrying"
                            );
                        }
                    }
                    tokio::time::sleep(inner.reconnect_delay).await;
                    if !inner.is_tracked(&scope_key) {
                        return;
                    }
                }
            });
        }
    }
}

/// Owns one websocket per tracked scope and turns server events into
/// targeted refreshes.
#[derive(Clone)]
pub struct PushManager {
    inner: Arc<PushInner>,
}

impl PushManager {
    pub(crate) fn new(
        push_base: &str,
        user_id: Option<String>,
        store: SharedFeedStore,
        refresher: Arc<ScopeRefresher>,
    ) -> Self {
        Self::with_delay(
            push_base,
            user_id,
            store,
            refresher,
            Duration::from_secs(RECONNECT_DELAY_SECS),
        )
    }

    pub(crate) fn with_delay(
        push_base: &str,
        user_id: Option<String>,
        store: SharedFeedStore,
        refresher: Arc<ScopeRefresher>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(PushInner {
                push_base: push_base.trim_end_matches('/').to_string(),
                user_id,
                store,
                refresher,
                reconnect_delay,
                conns: parking_lot::Mutex::new(HashMap::new()),
                states: parking_lot::Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Open a socket for a scope. A scope already tracked is left alone, so
    /// repeated selections never cycle a healthy connection. Placeholder
    /// keys are skipped outright: the server cannot address a feed whose
    /// creation has not been confirmed yet.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe_scope(&self, scope_key: &str) {
        if is_placeholder_id(scope_key) {
            debug!(scope = %scope_key, "no push socket for an unconfirmed scope");
            return;
        }
        let mut conns = self.inner.conns.lock();
        if conns.contains_key(scope_key) {
            return;
        }
        let (close_tx, close_rx) = watch::channel(false);
        conns.insert(scope_key.to_string(), ScopeConn { close_tx });
        self.inner
            .states
            .lock()
            .insert(scope_key.to_string(), ScopeState::Connecting);
        tokio::spawn(run_scope_socket(
            self.inner.clone(),
            scope_key.to_string(),
            close_rx,
        ));
    }

    /// Close a scope's socket. Safe to call for scopes that were never
    /// tracked. A pending reconnect timer for the scope is cancelled.
    pub fn unsubscribe_scope(&self, scope_key: &str) {
        let removed = self.inner.conns.lock().remove(scope_key);
        if let Some(conn) = removed {
            let _ = conn.close_tx.send(true);
        }
    }

    /// Reconcile the tracked set against `wanted`: missing scopes are
    /// opened, surplus scopes are closed, scopes present in both keep their
    /// connection untouched.
    pub fn update_subscriptions(&self, wanted: &[String]) {
        let current = self.inner.tracked_scopes();
        let (to_open, to_close) = subscription_diff(&current, wanted);
        for scope_key in to_close {
            self.unsubscribe_scope(&scope_key);
        }
        for scope_key in to_open {
            self.subscribe_scope(&scope_key);
        }
    }

    pub fn scope_state(&self, scope_key: &str) -> ScopeState {
        self.inner
            .states
            .lock()
            .get(scope_key)
            .copied()
            .unwrap_or(ScopeState::Disconnected)
    }

    pub fn tracked_scopes(&self) -> Vec<String> {
        self.inner.tracked_scopes()
    }

    /// Close every tracked scope socket.
    pub fn shutdown(&self) {
        for scope_key in self.inner.tracked_scopes() {
            self.unsubscribe_scope(&scope_key);
        }
    }
}

fn subscription_diff(current: &[String], wanted: &[String]) -> (Vec<String>, Vec<String>) {
    let current_set: HashSet<&String> = current.iter().collect();
    let wanted_set: HashSet<&String> = wanted.iter().collect();
    let to_open = wanted
        .iter()
        .filter(|scope| !current_set.contains(*scope))
        .cloned()
        .collect();
    let to_close = current
        .iter()
        .filter(|scope| !wanted_set.contains(*scope))
        .cloned()
        .collect();
    (to_open, to_close)
}
