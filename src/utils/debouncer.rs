//! # Debouncer
//!
//! Fixed-window trailing-edge coalescer. The first [`Debouncer::execute`]
//! call arms a timer of `min_interval`; further calls inside the window only
//! mark the request as pending and never push the deadline back. When the
//! timer fires the bound action runs once and the pending flag is cleared.
//!
//! ```text
//! execute ─► arm timer ─► execute, execute ... ─► timer fires ─► action()
//!               │                                     ▲
//!   pause ──────┴── timer dropped ── resume (pending) ┘ (fresh window)
//! ```
//!
//! Pauses nest: the timer is re-armed only when the last pause is released
//! and a request is still pending.
//!
//! A debouncer is bound to the Tokio runtime it was created on. Timers are
//! spawned through that runtime's handle, so `execute`, `pause` and
//! `resume` may be called from any thread.

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Action invoked when a debounce window closes
pub type DebouncedAction = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Debug, Default)]
struct DebounceState {
    pending: bool,
    paused: u32,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every arm/disarm so a stale timer never fires
    generation: u64,
}

struct DebouncerInner {
    name: String,
    action: DebouncedAction,
    min_interval: Duration,
    runtime: Handle,
    state: Mutex<DebounceState>,
}

/// Cloneable handle to a debounced action
#[derive(Clone)]
pub struct Debouncer {
    inner: Arc<DebouncerInner>,
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Debouncer")
            .field("name", &self.inner.name)
            .field("min_interval", &self.inner.min_interval)
            .field("pending", &state.pending)
            .field("paused", &state.paused)
            .field("armed", &state.timer.is_some())
            .finish()
    }
}

impl Debouncer {
    /// Bind `action` to a window on the current Tokio runtime
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new<F, Fut>(name: impl Into<String>, min_interval: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let action: DebouncedAction =
            Arc::new(move || -> BoxFuture<'static, anyhow::Result<()>> { Box::pin(action()) });
        Self::with_action(name, min_interval, action)
    }

    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn with_action(
        name: impl Into<String>,
        min_interval: Duration,
        action: DebouncedAction,
    ) -> Self {
        Self::with_handle(name, min_interval, action, Handle::current())
    }

    /// Bind the timers to an explicit runtime
    pub fn with_handle(
        name: impl Into<String>,
        min_interval: Duration,
        action: DebouncedAction,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(DebouncerInner {
                name: name.into(),
                action,
                min_interval,
                runtime,
                state: Mutex::new(DebounceState::default()),
            }),
        }
    }

    /// Request a run of the action at the end of the current window
    pub fn execute(&self) {
        let mut state = self.inner.state.lock();
        state.pending = true;
        if state.paused == 0 && state.timer.is_none() {
            self.arm(&mut state);
        }
    }

    /// Hold back firing until a matching [`resume`](Self::resume)
    pub fn pause(&self) {
        let mut state = self.inner.state.lock();
        state.paused += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
            state.generation += 1;
        }
        debug!(debouncer = %self.inner.name, paused = state.paused, "Debouncer paused");
    }

    /// Release one pause; re-arms if a request is still pending
    pub fn resume(&self) {
        let mut state = self.inner.state.lock();
        state.paused = state.paused.saturating_sub(1);
        if state.paused == 0 && state.pending && state.timer.is_none() {
            self.arm(&mut state);
        }
        debug!(debouncer = %self.inner.name, paused = state.paused, "Debouncer resumed");
    }

    /// Pause until the returned guard is dropped
    pub fn pause_guard(&self) -> PauseGuard<'_> {
        self.pause();
        PauseGuard { debouncer: self }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().pending
    }

    pub fn is_paused(&self) -> bool {
        self.inner.state.lock().paused > 0
    }

    pub fn min_interval(&self) -> Duration {
        self.inner.min_interval
    }

    fn arm(&self, state: &mut DebounceState) {
        state.generation += 1;
        let generation = state.generation;
        let weak = Arc::downgrade(&self.inner);
        let window = self.inner.min_interval;

        state.timer = Some(self.inner.runtime.spawn(async move {
            tokio::time::sleep(window).await;
            DebouncerInner::fire(weak, generation).await;
        }));
    }
}

impl DebouncerInner {
    async fn fire(weak: Weak<DebouncerInner>, generation: u64) {
        let Some(inner) = weak.upgrade() else {
            return;
        };

        let action = {
            let mut state = inner.state.lock();
            if state.generation != generation {
                return;
            }
            state.timer = None;
            if state.paused > 0 || !state.pending {
                return;
            }
            state.pending = false;
            Arc::clone(&inner.action)
        };

        debug!(debouncer = %inner.name, "Debounce window elapsed, running action");
        if let Err(e) = action().await {
            error!(debouncer = %inner.name, error = %e, "Debounced action failed");
        }
    }
}

/// Resumes the debouncer when dropped
pub struct PauseGuard<'a> {
    debouncer: &'a Debouncer,
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        self.debouncer.resume();
    }
}
