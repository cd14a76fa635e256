//! Live feed subscriptions.
//!
//! A [`FeedSubscriber`] opens one store listener per [`FeedSubscription`].
//! The listener and the stream share a bridge holding an active flag and the
//! sending half of an unbounded channel. Cancelling clears the flag and drops
//! the sender under the same lock the listener emits under, then removes the
//! store registration.

use crate::mapping::map_snapshot;
use futures_util::Stream;
use parking_lot::Mutex;
use postwall_core::{
    Clock, FeedError, FeedRecord, FeedResult, ListenerRegistration, RemoteStore, SnapshotEvent,
};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, warn};

type SnapshotSender = mpsc::UnboundedSender<FeedResult<Vec<FeedRecord>>>;
type SnapshotReceiver = mpsc::UnboundedReceiver<FeedResult<Vec<FeedRecord>>>;

/// Opens live subscriptions to one collection.
#[derive(Clone)]
pub struct FeedSubscriber {
    store: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    collection: String,
}

impl FeedSubscriber {
    /// Creates a subscriber for `collection`.
    pub fn new(
        store: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            collection: collection.into(),
        }
    }

    /// The collection this subscriber listens to.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Registers a store listener and returns the stream of its snapshots.
    ///
    /// Each call opens a new, independent listener, so a cancelled
    /// subscription can be replaced by subscribing again.
    pub fn subscribe(&self) -> FeedSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let bridge = Arc::new(Bridge {
            collection: self.collection.clone(),
            active: AtomicBool::new(true),
            sender: Mutex::new(Some(sender)),
            registration: Mutex::new(None),
        });

        let weak: Weak<Bridge> = Arc::downgrade(&bridge);
        let clock = self.clock.clone();
        let registration = self.store.subscribe_to_collection(
            &self.collection,
            Box::new(move |event| {
                if let Some(bridge) = weak.upgrade() {
                    bridge.deliver(event, clock.as_ref());
                }
            }),
        );
        *bridge.registration.lock() = Some(registration);
        debug!(collection = %self.collection, "live feed subscription opened");

        FeedSubscription {
            handle: SubscriptionHandle { bridge },
            receiver,
        }
    }
}

impl std::fmt::Debug for FeedSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSubscriber")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

struct Bridge {
    collection: String,
    active: AtomicBool,
    sender: Mutex<Option<SnapshotSender>>,
    registration: Mutex<Option<Box<dyn ListenerRegistration>>>,
}

impl Bridge {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn deliver(&self, event: SnapshotEvent, clock: &dyn Clock) {
        if !self.is_active() {
            return;
        }
        // Mapping runs unlocked so a concurrent cancel never waits on it.
        let item = match event {
            Ok(raw) => {
                let posts = map_snapshot(&raw, clock.now());
                debug!(collection = %self.collection, posts = posts.len(), "snapshot received");
                Ok(posts)
            }
            Err(error) => {
                warn!(collection = %self.collection, error = %error, "live subscription failed");
                Err(FeedError::SubscriptionFailure(error))
            }
        };
        let terminal = item.is_err();

        let mut slot = self.sender.lock();
        if !self.is_active() {
            return;
        }
        let Some(sender) = slot.as_ref() else {
            return;
        };
        let _ = sender.send(item);
        if terminal {
            // Nothing follows an error: dropping the sender ends the stream.
            slot.take();
        }
    }

    fn cancel(&self) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.sender.lock().take();
        if let Some(registration) = self.registration.lock().take() {
            registration.remove();
        }
        debug!(collection = %self.collection, "live feed subscription released");
        true
    }
}

/// Cloneable handle that can release a subscription from anywhere.
#[derive(Clone)]
pub struct SubscriptionHandle {
    bridge: Arc<Bridge>,
}

impl SubscriptionHandle {
    /// Releases the subscription.
    ///
    /// Returns true for the call that actually released it; later calls are
    /// no-ops that return false. No snapshot is emitted once this returns.
    pub fn cancel(&self) -> bool {
        self.bridge.cancel()
    }

    /// Returns true until the subscription is released.
    pub fn is_active(&self) -> bool {
        self.bridge.is_active()
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("collection", &self.bridge.collection)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Stream of sorted snapshots from one store listener.
///
/// Yields `Ok(posts)` per snapshot, at most one `Err` after which the stream
/// ends, and ends immediately once released. Dropping it releases it.
pub struct FeedSubscription {
    handle: SubscriptionHandle,
    receiver: SnapshotReceiver,
}

impl FeedSubscription {
    /// Waits for the next snapshot.
    pub async fn recv(&mut self) -> Option<FeedResult<Vec<FeedRecord>>> {
        if !self.handle.is_active() {
            return None;
        }
        let item = self.receiver.recv().await?;
        self.handle.is_active().then_some(item)
    }

    /// Returns the next snapshot if one is already queued.
    pub fn try_recv(&mut self) -> Option<FeedResult<Vec<FeedRecord>>> {
        if !self.handle.is_active() {
            return None;
        }
        self.receiver.try_recv().ok()
    }

    /// Returns a handle that can release this subscription.
    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    /// Releases this subscription.
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }
}

impl Stream for FeedSubscription {
    type Item = FeedResult<Vec<FeedRecord>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if !self.handle.is_active() {
            return Poll::Ready(None);
        }
        match self.receiver.poll_recv(cx) {
            Poll::Ready(Some(item)) if self.handle.is_active() => Poll::Ready(Some(item)),
            Poll::Ready(_) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

impl std::fmt::Debug for FeedSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSubscription")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use futures_util::StreamExt;
    use postwall_core::{FixedClock, MemoryStore, RawRecord, StoreError};
    use serde_json::json;

    fn raw(text: &str, posted: &str) -> RawRecord {
        match json!({ "text": text, "date_posted": posted }) {
            serde_json::Value::Object(map) => RawRecord::new(map),
            _ => unreachable!(),
        }
    }

    fn subscriber(store: &MemoryStore) -> FeedSubscriber {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
        FeedSubscriber::new(Arc::new(store.clone()), Arc::new(clock), "posts")
    }

    #[tokio::test]
    async fn emits_sorted_snapshots() {
        let store = MemoryStore::without_initial_snapshot();
        let mut subscription = subscriber(&store).subscribe();

        store.set_records(
            "posts",
            vec![
                raw("t1", "2024-06-15T09:00:00Z"),
                raw("t3", "2024-06-15T11:00:00Z"),
                raw("t2", "2024-06-15T10:00:00Z"),
            ],
        );

        let posts = subscription.recv().await.unwrap().unwrap();
        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["t3", "t2", "t1"]);
    }

    #[tokio::test]
    async fn initial_snapshot_arrives_on_subscribe() {
        let store = MemoryStore::new();
        store.set_records("posts", vec![raw("hello", "2024-06-15T09:00:00Z")]);

        let mut subscription = subscriber(&store).subscribe();
        let posts = subscription.try_recv().unwrap().unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn store_error_terminates_the_stream() {
        let store = MemoryStore::without_initial_snapshot();
        let mut subscription = subscriber(&store).subscribe();

        let denied = StoreError::PermissionDenied("rules".to_string());
        store.fail_listeners("posts", denied.clone());
        store.push_record("posts", raw("after", "2024-06-15T09:00:00Z"));

        assert_eq!(
            subscription.next().await,
            Some(Err(FeedError::SubscriptionFailure(denied)))
        );
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn cancel_removes_listener_exactly_once() {
        let store = MemoryStore::without_initial_snapshot();
        let subscription = subscriber(&store).subscribe();
        assert_eq!(store.active_listeners(), 1);

        assert!(subscription.cancel());
        assert!(!subscription.cancel());
        assert!(!subscription.handle().cancel());

        assert_eq!(store.active_listeners(), 0);
        assert_eq!(store.removals(), 1);
    }

    #[tokio::test]
    async fn nothing_is_emitted_after_cancel() {
        let store = MemoryStore::without_initial_snapshot();
        let mut subscription = subscriber(&store).subscribe();

        store.push_record("posts", raw("queued", "2024-06-15T09:00:00Z"));
        subscription.cancel();
        store.push_record("posts", raw("late", "2024-06-15T10:00:00Z"));

        assert!(subscription.try_recv().is_none());
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn dropping_the_stream_releases_the_listener() {
        let store = MemoryStore::without_initial_snapshot();
        {
            let _subscription = subscriber(&store).subscribe();
            assert_eq!(store.active_listeners(), 1);
        }
        assert_eq!(store.active_listeners(), 0);
        assert_eq!(store.removals(), 1);
    }

    #[tokio::test]
    async fn subscribing_again_after_cancel_opens_a_new_listener() {
        let store = MemoryStore::without_initial_snapshot();
        let subscriber = subscriber(&store);

        let first = subscriber.subscribe();
        first.cancel();

        let mut second = subscriber.subscribe();
        store.push_record("posts", raw("fresh", "2024-06-15T09:00:00Z"));

        assert_eq!(store.subscribe_calls(), 2);
        assert_eq!(second.recv().await.unwrap().unwrap()[0].text, "fresh");
    }

    /// Clock that cancels the subscription when the snapshot is mapped.
    struct CancellingClock {
        handle: parking_lot::Mutex<Option<SubscriptionHandle>>,
    }

    impl Clock for CancellingClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            if let Some(handle) = self.handle.lock().take() {
                assert!(handle.cancel());
            }
            Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
        }
    }

    #[tokio::test]
    async fn cancel_during_mapping_does_not_wait_and_drops_the_snapshot() {
        let store = MemoryStore::without_initial_snapshot();
        let clock = Arc::new(CancellingClock {
            handle: parking_lot::Mutex::new(None),
        });
        let subscriber = FeedSubscriber::new(Arc::new(store.clone()), clock.clone(), "posts");
        let mut subscription = subscriber.subscribe();
        *clock.handle.lock() = Some(subscription.handle());

        store.push_record("posts", raw("racing", "2024-06-15T09:00:00Z"));

        assert!(clock.handle.lock().is_none());
        assert_eq!(store.active_listeners(), 0);
        assert!(subscription.try_recv().is_none());
        assert_eq!(subscription.next().await, None);
    }
}
