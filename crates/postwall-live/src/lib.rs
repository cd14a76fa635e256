//! # Postwall Live
//!
//! Turns a callback-style collection listener into a stream of feed
//! snapshots.
//!
//! ```text
//! RemoteStore listener ─► map + sort ─► FeedSubscription (Stream)
//!                                           │
//!                            SubscriptionHandle::cancel()
//! ```
//!
//! ## Guarantees
//!
//! - Every emitted snapshot is sorted newest first, stable on ties
//! - One malformed document never fails a snapshot
//! - A store error ends the stream with that error
//! - After `cancel()` returns, nothing more is emitted and the store
//!   listener has been removed exactly once

mod mapping;
mod subscription;

pub use mapping::{map_record, map_snapshot};
pub use subscription::{FeedSubscriber, FeedSubscription, SubscriptionHandle};
