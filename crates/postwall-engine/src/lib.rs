//! # Postwall Engine
//!
//! The state synchronizer behind the feed screen. It gates on the signed-in
//! user, follows the live post collection, and republishes one consolidated
//! [`UiState`](postwall_core::UiState) while owning the composer's draft.
//!
//! ## Architecture
//!
//! ```text
//! start:
//!   auth check ─► none ─► NeedsAuthentication (no subscription)
//!              └► some ─► FeedSubscription ─► Loaded { posts, avatar } ...
//!
//! intents:
//!   update_draft ─► DraftBuffer
//!   submit ─► DraftBuffer::take ─► RemoteStore::write_record (not awaited)
//!
//! stop / drop:
//!   close state stream ─► cancel subscription ─► abort owner task + writes
//! ```
//!
//! ## Crate Structure
//!
//! - [`engine`] - The feed engine and its owner task
//! - [`state`] - Published UI state stream
//! - [`draft`] - Composer draft buffer
//! - [`submit`] - Post fields and pending fire-and-forget writes
//! - [`avatar`] - Avatar URL construction
//! - [`host`] - Screen host switching between feed and sign-in
//! - [`config`] - Engine settings

pub mod avatar;
pub mod config;
pub mod draft;
pub mod engine;
pub mod host;
pub mod state;
pub mod submit;

pub use avatar::avatar_url;
pub use config::EngineConfig;
pub use draft::DraftBuffer;
pub use engine::FeedEngine;
pub use host::{Route, ScreenHost, SignInOutcome};
pub use state::{StreamStatus, UiStateStream};
pub use submit::{post_fields, WriteFailureHook};
