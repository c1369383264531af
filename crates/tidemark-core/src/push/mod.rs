//! Push invalidation over per-scope websockets.

pub(crate) mod event;
mod manager;
mod socket;

pub use manager::{PushManager, ScopeState};
