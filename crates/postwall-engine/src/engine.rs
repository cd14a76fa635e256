//! The feed engine.
//!
//! One engine backs one feed screen. [`FeedEngine::start`] spawns an owner
//! task that checks the signed-in user once and, if there is one, follows
//! the live collection, publishing a `Loaded` state per snapshot. Intents
//! (`update_draft`, `submit`) are synchronous and never wait on the store.
//!
//! # Release
//!
//! [`FeedEngine::stop`] (or dropping the engine) closes the state stream,
//! cancels the live subscription, and aborts the owner task and any write
//! still in flight. Once it returns no state is published again.

use crate::avatar::avatar_url;
use crate::config::EngineConfig;
use crate::draft::DraftBuffer;
use crate::state::{StatePublisher, UiStateStream};
use crate::submit::{post_fields, PendingWrites, WriteFailureHook};
use parking_lot::{Mutex, RwLock};
use postwall_core::{Collaborators, FeedError, FeedResult, Identity, UiState};
use postwall_live::{FeedSubscriber, SubscriptionHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// State shared between the engine and its owner task.
struct Shared {
    collaborators: Collaborators,
    config: EngineConfig,
    publisher: StatePublisher,
    draft: DraftBuffer,
    subscriber: FeedSubscriber,
    subscription: Mutex<Option<SubscriptionHandle>>,
    writes: PendingWrites,
    write_failure_hook: RwLock<Option<WriteFailureHook>>,
    released: AtomicBool,
}

impl Shared {
    fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Avatar for whoever is signed in now, or `fallback` if nobody is.
    fn avatar_for(&self, fallback: &Identity) -> String {
        let current = self.collaborators.auth.current_identity();
        let identity = current.as_ref().unwrap_or(fallback);
        let token = self.collaborators.tokens.current_access_token();
        avatar_url(identity, token.as_deref(), &self.config.avatar_size)
    }
}

/// Feed state synchronizer for one screen.
pub struct FeedEngine {
    shared: Arc<Shared>,
    runtime: Handle,
    task: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl FeedEngine {
    /// Creates an idle engine. Nothing is read or subscribed until
    /// [`start`](Self::start).
    ///
    /// # Arguments
    /// * `collaborators` - Auth, token, store, and clock
    /// * `config` - Collection and avatar settings
    /// * `runtime` - Tokio runtime handle for the owner task and writes
    pub fn new(collaborators: Collaborators, config: EngineConfig, runtime: Handle) -> Self {
        let subscriber = FeedSubscriber::new(
            collaborators.store.clone(),
            collaborators.clock.clone(),
            config.collection.clone(),
        );
        Self {
            shared: Arc::new(Shared {
                collaborators,
                config,
                publisher: StatePublisher::new(),
                draft: DraftBuffer::new(),
                subscriber,
                subscription: Mutex::new(None),
                writes: PendingWrites::default(),
                write_failure_hook: RwLock::new(None),
                released: AtomicBool::new(false),
            }),
            runtime,
            task: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// Begins the auth check and, if signed in, the live subscription.
    ///
    /// Calling it again is a no-op. Fails with [`FeedError::Released`]
    /// after [`stop`](Self::stop).
    pub fn start(&self) -> FeedResult<()> {
        if self.shared.is_released() {
            return Err(FeedError::Released);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            debug!("feed engine already started");
            return Ok(());
        }

        let task = self.runtime.spawn(run(self.shared.clone()));
        *self.task.lock() = Some(task);
        Ok(())
    }

    /// Releases the engine. Idempotent.
    pub fn stop(&self) {
        if self.shared.released.swap(true, Ordering::AcqRel) {
            return;
        }

        self.shared.publisher.close();
        if let Some(subscription) = self.shared.subscription.lock().take() {
            subscription.cancel();
        }
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        self.shared.writes.abort_all();
        info!(collection = %self.shared.config.collection, "feed engine released");
    }

    /// Returns true once [`stop`](Self::stop) has run.
    pub fn is_released(&self) -> bool {
        self.shared.is_released()
    }

    /// A reader of the published state, starting from the current value.
    pub fn state(&self) -> UiStateStream {
        self.shared.publisher.subscribe()
    }

    /// The published state as of now.
    pub fn current_state(&self) -> UiState {
        self.shared.publisher.current()
    }

    /// Replaces the draft with `text`.
    pub fn update_draft(&self, text: impl Into<String>) {
        self.shared.draft.replace(text.into());
    }

    /// The current draft.
    pub fn draft(&self) -> String {
        self.shared.draft.get()
    }

    /// Submits the draft as a new post and clears it.
    ///
    /// The write is issued before this returns but not awaited; its outcome
    /// only reaches the write-failure hook and the log. Without a signed-in
    /// user nothing is written and the draft is kept.
    pub fn submit(&self) -> FeedResult<()> {
        if self.shared.is_released() {
            return Err(FeedError::Released);
        }
        let Some(identity) = self.shared.collaborators.auth.current_identity() else {
            warn!("submit without a signed-in user");
            return Err(FeedError::Unauthenticated);
        };

        let avatar = self.shared.avatar_for(&identity);
        let posted_at = self.shared.collaborators.clock.now();
        let text = self.shared.draft.take();
        let fields = post_fields(&text, posted_at, identity.author_name(), &avatar);

        let collection = &self.shared.config.collection;
        let write = self
            .shared
            .collaborators
            .store
            .write_record(collection, fields);
        let hook = self.shared.write_failure_hook.read().clone();
        self.shared
            .writes
            .track(&self.runtime, collection, write, hook);

        debug!(%collection, uid = %identity.uid, chars = text.chars().count(), "post submitted");
        Ok(())
    }

    /// Sets the callback invoked when a submitted post fails to write.
    pub fn set_write_failure_hook(&self, hook: WriteFailureHook) {
        *self.shared.write_failure_hook.write() = Some(hook);
    }

    /// Number of submitted writes not yet acknowledged.
    pub fn writes_in_flight(&self) -> usize {
        self.shared.writes.in_flight()
    }

    /// The settings this engine runs with.
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }
}

impl Drop for FeedEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for FeedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedEngine")
            .field("collection", &self.shared.config.collection)
            .field("state", &self.current_state().as_str())
            .field("released", &self.is_released())
            .finish()
    }
}

/// Owner task body.
async fn run(shared: Arc<Shared>) {
    let Some(identity) = shared.collaborators.auth.current_identity() else {
        info!("no signed-in user, feed needs authentication");
        shared.publisher.publish(UiState::NeedsAuthentication);
        return;
    };

    let mut subscription = {
        let mut slot = shared.subscription.lock();
        // Checked under the slot lock so a concurrent stop either sees the
        // handle or prevents the subscription.
        if shared.is_released() {
            return;
        }
        let subscription = shared.subscriber.subscribe();
        *slot = Some(subscription.handle());
        subscription
    };
    info!(
        uid = %identity.uid,
        collection = %shared.subscriber.collection(),
        "following feed"
    );

    while let Some(item) = subscription.recv().await {
        match item {
            Ok(posts) => {
                let count = posts.len();
                let avatar_ref = shared.avatar_for(&identity);
                if shared.publisher.publish(UiState::Loaded { posts, avatar_ref }) {
                    debug!(posts = count, "feed state published");
                }
            }
            Err(error) => {
                warn!(%error, "feed subscription ended");
                shared.publisher.fail(error);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use postwall_core::{FixedClock, MemoryStore, StaticAuth, StaticToken};

    fn engine_with(auth: StaticAuth, store: MemoryStore) -> FeedEngine {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
        let collaborators = Collaborators::new(
            Arc::new(auth),
            Arc::new(StaticToken::new("tok")),
            Arc::new(store),
        )
        .with_clock(Arc::new(clock));
        FeedEngine::new(collaborators, EngineConfig::default(), Handle::current())
    }

    #[tokio::test]
    async fn idle_engine_stays_loading() {
        let store = MemoryStore::new();
        let engine = engine_with(StaticAuth::signed_in(Identity::new("u1")), store.clone());

        tokio::task::yield_now().await;
        assert_eq!(engine.current_state(), UiState::Loading);
        assert_eq!(store.subscribe_calls(), 0);
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let store = MemoryStore::new();
        let engine = engine_with(StaticAuth::signed_in(Identity::new("u1")), store.clone());
        engine.start().unwrap();
        engine.start().unwrap();

        let mut states = engine.state();
        states.wait_for(|s| s.posts().is_some()).await.unwrap();
        assert_eq!(store.subscribe_calls(), 1);
    }

    #[tokio::test]
    async fn start_after_stop_is_rejected() {
        let engine = engine_with(StaticAuth::signed_out(), MemoryStore::new());
        engine.stop();
        assert_eq!(engine.start(), Err(FeedError::Released));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let store = MemoryStore::new();
        let engine = engine_with(StaticAuth::signed_in(Identity::new("u1")), store.clone());
        engine.start().unwrap();
        engine.state().wait_for(|s| s.posts().is_some()).await.unwrap();

        engine.stop();
        engine.stop();
        assert_eq!(store.removals(), 1);
        assert_eq!(store.active_listeners(), 0);
    }
}
