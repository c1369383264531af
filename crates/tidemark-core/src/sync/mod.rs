//! Scope refresh and snapshot reconciliation.

pub(crate) mod reconcile;
mod refresher;

pub use refresher::ScopeRefresher;
