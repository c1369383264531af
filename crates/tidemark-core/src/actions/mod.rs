//! Optimistic mutations layered over the local store.
//!
//! Every operation writes its local effect first and then settles with the
//! server. Confirmations fold server truth back in; failures either restore
//! a captured snapshot or leave the optimistic record in place, depending on
//! what the operation promises.

mod compose;
mod react;
mod subscribe;

use tracing::warn;

use crate::api::MutationAck;
use crate::models::Scope;
use crate::runtime::SyncEngine;

impl SyncEngine {
    /// Fold a mutation acknowledgement's feed summary into the store.
    pub(crate) fn absorb_ack(&self, ack: &MutationAck) {
        if let Some(summary) = &ack.feed {
            self.store.lock().upsert_feed(summary.clone());
        }
    }

    /// Re-fetch a scope once a mutation is confirmed. The optimistic state
    /// is already visible, so a failed refresh only logs.
    pub(crate) async fn refresh_after_mutation(&self, scope: Scope) {
        if let Err(error) = self.refresher.refresh(&scope).await {
            warn!(scope = %scope, error = %error, "refresh after mutation failed");
        }
    }
}
