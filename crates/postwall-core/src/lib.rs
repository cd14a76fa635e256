//! # Postwall Core
//!
//! The pieces every other Postwall crate agrees on: the feed domain model,
//! the contracts of the external collaborators the engine talks to, and the
//! error taxonomy.
//!
//! ## Architecture
//!
//! ```text
//! AuthProvider ─┐
//! TokenProvider ┼─► engine ─► UiState ─► rendering layer
//! RemoteStore ──┘      ▲
//!                      └── draft / submit intents
//! ```
//!
//! The engine never reaches a process-wide singleton. Every collaborator is
//! injected through [`Collaborators`], which is what lets the tests swap in
//! the implementations from [`memory`].
//!
//! ## Crate Structure
//!
//! - [`types`] - Feed records, UI state, identities, raw documents
//! - [`collab`] - Collaborator traits
//! - [`date_label`] - Relative "posted at" labels
//! - [`memory`] - In-memory collaborators
//! - [`error`] - Store and feed errors

pub mod collab;
pub mod date_label;
pub mod error;
pub mod memory;
pub mod types;

pub use collab::{
    AccessTokenProvider, AuthProvider, Clock, Collaborators, ListenerRegistration, RemoteStore,
    SnapshotEvent, SnapshotListener, SystemClock, WriteFuture,
};
pub use date_label::date_label;
pub use error::{FeedError, FeedResult, StoreError, StoreResult};
pub use memory::{FixedClock, MemoryStore, StaticAuth, StaticToken, WrittenRecord};
pub use types::{
    DocumentId, FeedRecord, Identity, RawRecord, RecordFields, UiState, FIELD_AUTHOR_AVATAR_URL,
    FIELD_AUTHOR_NAME, FIELD_DATE_POSTED, FIELD_TEXT,
};
