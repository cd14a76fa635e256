//! Published UI state.
//!
//! The engine keeps its consolidated [`UiState`] in a `watch` cell. Readers
//! see the latest value only: a state replaced before it was read is never
//! delivered. Besides the state the cell carries the stream's status, so a
//! live subscription failure or a release reaches every reader.

use postwall_core::{FeedError, FeedResult, UiState};
use tokio::sync::watch;

/// Lifecycle of a state stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    /// States are still being published.
    Open,
    /// The live subscription failed. No further states follow.
    Failed(FeedError),
    /// The engine was released.
    Closed,
}

impl StreamStatus {
    /// Returns true while states can still change.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

#[derive(Debug, Clone)]
struct Published {
    state: UiState,
    status: StreamStatus,
}

/// Writing side of the state cell. Owned by the engine.
#[derive(Debug)]
pub(crate) struct StatePublisher {
    tx: watch::Sender<Published>,
}

impl StatePublisher {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(Published {
            state: UiState::Loading,
            status: StreamStatus::Open,
        });
        Self { tx }
    }

    /// Replaces the current state. Ignored once the stream has ended.
    pub(crate) fn publish(&self, state: UiState) -> bool {
        self.tx.send_if_modified(|published| {
            if !published.status.is_open() || published.state == state {
                return false;
            }
            published.state = state;
            true
        })
    }

    /// Ends the stream with `error`. Ignored once the stream has ended.
    pub(crate) fn fail(&self, error: FeedError) -> bool {
        self.tx.send_if_modified(|published| {
            if !published.status.is_open() {
                return false;
            }
            published.status = StreamStatus::Failed(error);
            true
        })
    }

    /// Ends the stream without an error. A prior failure is kept.
    pub(crate) fn close(&self) -> bool {
        self.tx.send_if_modified(|published| {
            if !published.status.is_open() {
                return false;
            }
            published.status = StreamStatus::Closed;
            true
        })
    }

    pub(crate) fn current(&self) -> UiState {
        self.tx.borrow().state.clone()
    }

    pub(crate) fn subscribe(&self) -> UiStateStream {
        let rx = self.tx.subscribe();
        let seen = rx.borrow().state.clone();
        UiStateStream {
            rx,
            seen,
            finished: false,
        }
    }
}

/// Reader of an engine's UI state.
///
/// [`next`](Self::next) waits for the state to change and yields the
/// latest value. A state published before the stream ended is still
/// delivered. After it, a subscription failure is yielded once as `Err`
/// and the stream ends; a release ends it with `None`.
#[derive(Debug, Clone)]
pub struct UiStateStream {
    rx: watch::Receiver<Published>,
    /// Last state handed to this reader, or the state at subscribe time.
    seen: UiState,
    finished: bool,
}

impl UiStateStream {
    /// The state as of now.
    pub fn current(&self) -> UiState {
        self.rx.borrow().state.clone()
    }

    /// The stream's status as of now.
    pub fn status(&self) -> StreamStatus {
        self.rx.borrow().status.clone()
    }

    /// Waits for the next state.
    pub async fn next(&mut self) -> Option<FeedResult<UiState>> {
        let mut sender_gone = false;
        loop {
            if self.finished {
                return None;
            }
            let published = self.rx.borrow_and_update().clone();
            if published.state != self.seen {
                self.seen = published.state.clone();
                return Some(Ok(published.state));
            }
            match published.status {
                StreamStatus::Failed(error) => {
                    self.finished = true;
                    return Some(Err(error));
                }
                StreamStatus::Closed => {
                    self.finished = true;
                    return None;
                }
                StreamStatus::Open => {}
            }
            if sender_gone {
                // Engine dropped without closing.
                self.finished = true;
                return None;
            }
            if self.rx.changed().await.is_err() {
                sender_gone = true;
            }
        }
    }

    /// Waits until the state satisfies `predicate`, checking the latest
    /// state first, even if the stream has already ended.
    ///
    /// Returns None if the stream ends or fails before that happens.
    pub async fn wait_for(&mut self, predicate: impl Fn(&UiState) -> bool) -> Option<UiState> {
        let latest = self.rx.borrow_and_update().state.clone();
        if predicate(&latest) {
            self.seen = latest.clone();
            return Some(latest);
        }
        loop {
            match self.next().await? {
                Ok(state) if predicate(&state) => return Some(state),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }
}
