//! Error types shared by the Postwall crates.

use thiserror::Error;

/// Failure reported by the remote store collaborator.
///
/// Values are cloned into the published UI state stream, so the type stays
/// `Clone` and carries only strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Network or transport-level failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The store refused access to the collection.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The store rejected a write.
    #[error("Write rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    /// Returns true if the failure may resolve on its own.
    ///
    /// Nothing in Postwall retries; this only informs the UI shell.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transport(_))
    }
}

/// Convenience alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the feed engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// An intent that needs a signed-in user was invoked without one.
    #[error("Not signed in")]
    Unauthenticated,

    /// The live subscription reported an error and has terminated.
    #[error("Live subscription failed: {0}")]
    SubscriptionFailure(StoreError),

    /// A fire-and-forget submission write failed.
    #[error("Write failed: {0}")]
    WriteFailure(StoreError),

    /// The engine was released before the intent was invoked.
    #[error("Feed engine has been released")]
    Released,

    /// Sign-in completed without producing an authenticated identity.
    #[error("Sign-in failed: {0}")]
    SignInFailed(String),
}

/// Convenience alias for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
