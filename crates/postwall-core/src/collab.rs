//! Contracts for the collaborators the feed engine depends on.
//!
//! # Design Principles
//!
//! - Collaborators are injected, never reached through globals
//! - Reads of the identity and token happen at the moment they are needed
//! - Writes are fire-and-forget; the returned future only reports the outcome
//! - A listener registration is removed by value, so removal happens once

use crate::error::StoreResult;
use crate::types::{Identity, RawRecord, RecordFields};
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use std::sync::Arc;

/// One delivery from a live collection listener.
pub type SnapshotEvent = StoreResult<Vec<RawRecord>>;

/// Callback invoked by the remote store for every snapshot or error.
pub type SnapshotListener = Box<dyn Fn(SnapshotEvent) + Send + Sync>;

/// Outcome of a write, resolved once the store acknowledges it.
pub type WriteFuture = BoxFuture<'static, StoreResult<()>>;

/// Source of the signed-in user.
pub trait AuthProvider: Send + Sync {
    /// Returns the current identity, or None if nobody is signed in.
    fn current_identity(&self) -> Option<Identity>;
}

/// Source of the short-lived credential that authorizes avatar fetches.
pub trait AccessTokenProvider: Send + Sync {
    /// Returns the current access token, if any.
    fn current_access_token(&self) -> Option<String>;
}

/// Handle to a listener registered with a [`RemoteStore`].
pub trait ListenerRegistration: Send + Sync {
    /// Unregisters the listener.
    ///
    /// Once this returns the store must not invoke the listener again.
    fn remove(self: Box<Self>);
}

/// The remote document store.
pub trait RemoteStore: Send + Sync {
    /// Registers a live listener on a collection.
    ///
    /// The listener receives full snapshots of the collection, or an error
    /// after which no further snapshots are delivered.
    fn subscribe_to_collection(
        &self,
        collection: &str,
        listener: SnapshotListener,
    ) -> Box<dyn ListenerRegistration>;

    /// Issues a write of a new document.
    ///
    /// The request is considered issued when this returns. Awaiting the
    /// future is optional and only yields the store's acknowledgement.
    fn write_record(&self, collection: &str, fields: RecordFields) -> WriteFuture;
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Everything the feed engine needs from the outside world.
#[derive(Clone)]
pub struct Collaborators {
    /// Signed-in user lookup.
    pub auth: Arc<dyn AuthProvider>,
    /// Avatar access token lookup.
    pub tokens: Arc<dyn AccessTokenProvider>,
    /// Remote document store.
    pub store: Arc<dyn RemoteStore>,
    /// Time source for fallback and submission timestamps.
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Bundles collaborators using the wall clock.
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        tokens: Arc<dyn AccessTokenProvider>,
        store: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            auth,
            tokens,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
