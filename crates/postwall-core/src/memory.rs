//! In-memory collaborators.
//!
//! These back the tests and local demos. [`MemoryStore`] behaves like a live
//! document store: listeners get the current contents on registration and a
//! full snapshot after every change, and every write request is recorded so
//! tests can assert on emission rather than on remote behavior.

use crate::collab::{
    AccessTokenProvider, AuthProvider, Clock, ListenerRegistration, RemoteStore, SnapshotEvent,
    SnapshotListener, WriteFuture,
};
use crate::error::StoreError;
use crate::types::{Identity, RawRecord, RecordFields};
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

type SharedListener = Arc<dyn Fn(SnapshotEvent) + Send + Sync>;

/// A write request as received by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenRecord {
    pub collection: String,
    pub fields: RecordFields,
}

#[derive(Default)]
struct StoreState {
    collections: HashMap<String, Vec<RawRecord>>,
    listeners: HashMap<u64, (String, SharedListener)>,
    next_listener_id: u64,
    subscribe_calls: usize,
    removals: usize,
    writes: Vec<WrittenRecord>,
    write_failure: Option<StoreError>,
}

impl StoreState {
    fn listeners_for(&self, collection: &str) -> Vec<SharedListener> {
        self.listeners
            .values()
            .filter(|(name, _)| name == collection)
            .map(|(_, listener)| listener.clone())
            .collect()
    }
}

/// In-memory live document store.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
    deliver_initial: bool,
}

impl MemoryStore {
    /// Creates an empty store that delivers an initial snapshot on subscribe.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            deliver_initial: true,
        }
    }

    /// Creates an empty store that stays silent until contents change.
    pub fn without_initial_snapshot() -> Self {
        Self {
            deliver_initial: false,
            ..Self::new()
        }
    }

    /// Replaces a collection's contents and notifies its listeners.
    pub fn set_records(&self, collection: &str, records: Vec<RawRecord>) {
        let listeners = {
            let mut state = self.state.lock();
            state
                .collections
                .insert(collection.to_string(), records.clone());
            state.listeners_for(collection)
        };
        for listener in listeners {
            listener(Ok(records.clone()));
        }
    }

    /// Appends one document and notifies the collection's listeners.
    pub fn push_record(&self, collection: &str, record: RawRecord) {
        let (listeners, snapshot) = {
            let mut state = self.state.lock();
            let records = state
                .collections
                .entry(collection.to_string())
                .or_default();
            records.push(record);
            let snapshot = records.clone();
            (state.listeners_for(collection), snapshot)
        };
        for listener in listeners {
            listener(Ok(snapshot.clone()));
        }
    }

    /// Delivers an error to every listener of a collection.
    pub fn fail_listeners(&self, collection: &str, error: StoreError) {
        let listeners = self.state.lock().listeners_for(collection);
        for listener in listeners {
            listener(Err(error.clone()));
        }
    }

    /// Makes every subsequent write resolve with `error`, or succeed again
    /// when None.
    pub fn fail_writes_with(&self, error: Option<StoreError>) {
        self.state.lock().write_failure = error;
    }

    /// Current contents of a collection.
    pub fn records(&self, collection: &str) -> Vec<RawRecord> {
        self.state
            .lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// All write requests received so far, in order.
    pub fn writes(&self) -> Vec<WrittenRecord> {
        self.state.lock().writes.clone()
    }

    /// Number of times a listener was registered.
    pub fn subscribe_calls(&self) -> usize {
        self.state.lock().subscribe_calls
    }

    /// Number of listeners currently registered.
    pub fn active_listeners(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Number of listener registrations removed.
    pub fn removals(&self) -> usize {
        self.state.lock().removals
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

struct MemoryRegistration {
    id: u64,
    state: Weak<Mutex<StoreState>>,
}

impl ListenerRegistration for MemoryRegistration {
    fn remove(self: Box<Self>) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.lock();
            if state.listeners.remove(&self.id).is_some() {
                state.removals += 1;
            }
        }
    }
}

impl RemoteStore for MemoryStore {
    fn subscribe_to_collection(
        &self,
        collection: &str,
        listener: SnapshotListener,
    ) -> Box<dyn ListenerRegistration> {
        let listener: SharedListener = Arc::from(listener);
        let (id, initial) = {
            let mut state = self.state.lock();
            state.subscribe_calls += 1;
            let id = state.next_listener_id;
            state.next_listener_id += 1;
            state
                .listeners
                .insert(id, (collection.to_string(), listener.clone()));
            let initial = state
                .collections
                .get(collection)
                .cloned()
                .unwrap_or_default();
            (id, initial)
        };
        debug!(collection, listener_id = id, "memory store listener registered");

        if self.deliver_initial {
            listener(Ok(initial));
        }

        Box::new(MemoryRegistration {
            id,
            state: Arc::downgrade(&self.state),
        })
    }

    fn write_record(&self, collection: &str, fields: RecordFields) -> WriteFuture {
        let failure = {
            let mut state = self.state.lock();
            state.writes.push(WrittenRecord {
                collection: collection.to_string(),
                fields: fields.clone(),
            });
            state.write_failure.clone()
        };

        let store = self.clone();
        let collection = collection.to_string();
        Box::pin(async move {
            if let Some(error) = failure {
                return Err(error);
            }
            store.push_record(&collection, RawRecord::new(fields));
            Ok(())
        })
    }
}

/// Auth collaborator with a settable identity.
#[derive(Debug, Default)]
pub struct StaticAuth {
    identity: RwLock<Option<Identity>>,
}

impl StaticAuth {
    /// Creates a provider with `identity` signed in.
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: RwLock::new(Some(identity)),
        }
    }

    /// Creates a provider with nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Replaces the signed-in identity.
    pub fn set_identity(&self, identity: Option<Identity>) {
        *self.identity.write() = identity;
    }
}

impl AuthProvider for StaticAuth {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.read().clone()
    }
}

/// Access token collaborator with a settable token.
#[derive(Debug, Default)]
pub struct StaticToken {
    token: RwLock<Option<String>>,
}

impl StaticToken {
    /// Creates a provider holding `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Creates a provider with no token.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replaces the token, e.g. after a credential refresh.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }
}

impl AccessTokenProvider for StaticToken {
    fn current_access_token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
