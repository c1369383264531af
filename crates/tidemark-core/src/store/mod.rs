mod feed_store;

pub use feed_store::{shared_store, FeedStore, SharedFeedStore};
