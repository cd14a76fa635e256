//! Screen host.
//!
//! Owns the feed engine on behalf of the UI shell and switches between the
//! feed and the sign-in screen. The feed is the start route. When an engine
//! reports [`UiState::NeedsAuthentication`] the host releases it and moves
//! to sign-in; a successful sign-in builds a fresh engine and moves back.

use crate::config::EngineConfig;
use crate::engine::FeedEngine;
use parking_lot::Mutex;
use postwall_core::{Collaborators, FeedError, FeedResult, UiState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Message reported when sign-in ends without a signed-in user.
pub const SIGN_IN_FAILED: &str = "could not sign in";

/// Screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Feed,
    SignIn,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Feed => "feed",
            Route::SignIn => "sign_in",
        }
    }
}

/// How the external sign-in flow ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// The flow reports success.
    Completed,
    /// The user backed out.
    Cancelled,
    /// The flow reports an error.
    Failed(String),
}

struct ActiveEngine {
    generation: u64,
    engine: Arc<FeedEngine>,
    watcher: JoinHandle<()>,
}

struct HostShared {
    collaborators: Collaborators,
    config: EngineConfig,
    runtime: Handle,
    route: watch::Sender<Route>,
    active: Mutex<Option<ActiveEngine>>,
    generation: AtomicU64,
}

impl HostShared {
    fn release_active(&self) {
        if let Some(active) = self.active.lock().take() {
            active.watcher.abort();
            active.engine.stop();
        }
    }

    /// Moves to sign-in if `generation` is still the live engine.
    fn redirect_to_sign_in(&self, generation: u64) {
        let released = {
            let mut slot = self.active.lock();
            let current = slot
                .as_ref()
                .is_some_and(|active| active.generation == generation);
            if current {
                slot.take()
            } else {
                None
            }
        };
        let Some(active) = released else {
            return;
        };
        active.engine.stop();
        self.route.send_replace(Route::SignIn);
        info!(generation, "feed needs authentication, showing sign-in");
    }
}

/// Hosts the feed screen and its sign-in fallback.
pub struct ScreenHost {
    shared: Arc<HostShared>,
}

impl ScreenHost {
    /// Creates a host on the feed route. No engine runs until
    /// [`enter_feed`](Self::enter_feed).
    pub fn new(collaborators: Collaborators, config: EngineConfig, runtime: Handle) -> Self {
        let (route, _) = watch::channel(Route::Feed);
        Self {
            shared: Arc::new(HostShared {
                collaborators,
                config,
                runtime,
                route,
                active: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Shows the feed with a fresh engine, releasing any previous one.
    pub fn enter_feed(&self) -> FeedResult<Arc<FeedEngine>> {
        // Held until the new engine is installed so its watcher cannot
        // redirect before the slot and route are set.
        let mut slot = self.shared.active.lock();
        if let Some(previous) = slot.take() {
            previous.watcher.abort();
            previous.engine.stop();
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let engine = Arc::new(FeedEngine::new(
            self.shared.collaborators.clone(),
            self.shared.config.clone(),
            self.shared.runtime.clone(),
        ));
        let mut states = engine.state();
        engine.start()?;

        let host: Weak<HostShared> = Arc::downgrade(&self.shared);
        let watcher = self.shared.runtime.spawn(async move {
            if states.wait_for(UiState::needs_authentication).await.is_some() {
                if let Some(host) = host.upgrade() {
                    host.redirect_to_sign_in(generation);
                }
            }
        });

        *slot = Some(ActiveEngine {
            generation,
            engine: engine.clone(),
            watcher,
        });
        self.shared.route.send_replace(Route::Feed);
        drop(slot);

        info!(generation, "showing feed");
        Ok(engine)
    }

    /// Handles the end of the sign-in flow.
    ///
    /// Returns the route shown afterwards. A reported success without a
    /// signed-in user counts as a failure.
    pub fn complete_sign_in(&self, outcome: SignInOutcome) -> FeedResult<Route> {
        match outcome {
            SignInOutcome::Completed => {
                if self.shared.collaborators.auth.current_identity().is_none() {
                    warn!("sign-in completed without a signed-in user");
                    return Err(FeedError::SignInFailed(SIGN_IN_FAILED.to_string()));
                }
                self.enter_feed()?;
                Ok(Route::Feed)
            }
            SignInOutcome::Cancelled => Ok(self.route()),
            SignInOutcome::Failed(reason) => {
                warn!(%reason, "sign-in failed");
                Err(FeedError::SignInFailed(SIGN_IN_FAILED.to_string()))
            }
        }
    }

    /// The route shown now.
    pub fn route(&self) -> Route {
        *self.shared.route.borrow()
    }

    /// Watches route changes.
    pub fn routes(&self) -> watch::Receiver<Route> {
        self.shared.route.subscribe()
    }

    /// The engine behind the feed, if the feed is showing.
    pub fn engine(&self) -> Option<Arc<FeedEngine>> {
        self.shared
            .active
            .lock()
            .as_ref()
            .map(|active| active.engine.clone())
    }

    /// Releases the engine. The route is left as is.
    pub fn exit(&self) {
        self.shared.release_active();
    }
}

impl Drop for ScreenHost {
    fn drop(&mut self) {
        self.exit();
    }
}

impl std::fmt::Debug for ScreenHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenHost")
            .field("route", &self.route().as_str())
            .field("engine", &self.shared.active.lock().is_some())
            .finish()
    }
}
