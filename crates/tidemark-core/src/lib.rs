//! Client-side synchronization engine for a federated feed browser.
//!
//! The engine keeps a local cache of feeds and their post trees, refreshes
//! it scope by scope from a request/response API, applies mutations
//! optimistically with placeholder ids, and listens on per-scope push
//! sockets for invalidation events that trigger targeted refreshes.
//!
//! [`SyncEngine`] is the entry point; construct one with a [`CoreConfig`]
//! inside a Tokio runtime and subscribe to [`ChangeEvent`]s to re-render on
//! store changes.

pub mod actions;
pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod models;
pub mod push;
pub mod runtime;
pub mod session;
pub mod store;
pub mod sync;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::CoreConfig;
pub use error::CoreError;
pub use events::ChangeEvent;
pub use models::{Comment, FeedKey, FeedSummary, Post, Reaction, ReactionTally, ReactionTarget, Scope};
pub use push::ScopeState;
pub use runtime::SyncEngine;
