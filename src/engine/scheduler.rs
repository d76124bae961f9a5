//! Rate-limited callback scheduling.
//!
//! - [`Throttle`]: at most one invocation per window; a call that lands
//!   mid-window is deferred to the end of the window (latest argument wins).
//! - [`Debounce`]: only the last call within a quiet period fires.
//!
//! Deferred calls run on spawned Tokio tasks. A call that would need one
//! outside a Tokio runtime returns `LabError::Runtime` and is dropped.
//! Dropping either wrapper cancels its pending call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{LabError, LabResult};

type Callback<A> = Arc<dyn Fn(A) + Send + Sync>;

#[derive(Debug, Default)]
struct ThrottleState {
    last_fired: Option<Instant>,
    trailing: Option<JoinHandle<()>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn runtime() -> LabResult<Handle> {
    Handle::try_current()
        .map_err(|e| LabError::Runtime(format!("deferred call needs a Tokio runtime: {e}")))
}

/// Leading-edge throttle with a trailing call.
pub struct Throttle<A> {
    func: Callback<A>,
    window: Duration,
    state: Arc<Mutex<ThrottleState>>,
}

impl<A: Send + 'static> Throttle<A> {
    /// Wrap `func` so it fires at most once per `window`.
    pub fn new(window: Duration, func: impl Fn(A) + Send + Sync + 'static) -> Self {
        Self {
            func: Arc::new(func),
            window,
            state: Arc::new(Mutex::new(ThrottleState::default())),
        }
    }

    /// Invoke now if the window has elapsed, otherwise schedule a trailing call.
    ///
    /// # Errors
    ///
    /// Returns `LabError::Runtime` if a trailing call is needed outside a
    /// Tokio runtime. The earlier trailing call, if any, is kept.
    pub fn call(&self, arg: A) -> LabResult<()> {
        let now = Instant::now();
        let mut state = lock(&self.state);

        let since_last = state.last_fired.map(|last| now.duration_since(last));
        match since_last {
            Some(elapsed) if elapsed < self.window => {
                let handle = runtime()?;
                if let Some(pending) = state.trailing.take() {
                    pending.abort();
                }
                let wait = self.window - elapsed;
                let func = Arc::clone(&self.func);
                let shared = Arc::clone(&self.state);
                state.trailing = Some(handle.spawn(async move {
                    tokio::time::sleep(wait).await;
                    {
                        let mut state = lock(&shared);
                        state.last_fired = Some(Instant::now());
                        state.trailing = None;
                    }
                    func(arg);
                }));
            }
            _ => {
                if let Some(pending) = state.trailing.take() {
                    pending.abort();
                }
                state.last_fired = Some(now);
                drop(state);
                (self.func)(arg);
            }
        }
        Ok(())
    }

    /// Whether a trailing call is waiting.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        lock(&self.state).trailing.is_some()
    }

    /// Throttle window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}

impl<A> Drop for Throttle<A> {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.state).trailing.take() {
            pending.abort();
        }
    }
}

impl<A> std::fmt::Debug for Throttle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

/// Trailing-edge debounce.
pub struct Debounce<A> {
    func: Callback<A>,
    quiet: Duration,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<A: Send + 'static> Debounce<A> {
    /// Wrap `func` so it fires once `quiet` has passed without another call.
    pub fn new(quiet: Duration, func: impl Fn(A) + Send + Sync + 'static) -> Self {
        Self {
            func: Arc::new(func),
            quiet,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Restart the quiet period with `arg` as the value to deliver.
    ///
    /// # Errors
    ///
    /// Returns `LabError::Runtime` outside a Tokio runtime; the pending call,
    /// if any, is kept.
    pub fn call(&self, arg: A) -> LabResult<()> {
        let handle = runtime()?;
        let mut pending = lock(&self.pending);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        let func = Arc::clone(&self.func);
        let slot = Arc::clone(&self.pending);
        let quiet = self.quiet;
        *pending = Some(handle.spawn(async move {
            tokio::time::sleep(quiet).await;
            lock(&slot).take();
            func(arg);
        }));
        Ok(())
    }

    /// Drop the pending call, if any.
    pub fn cancel(&self) {
        if let Some(previous) = lock(&self.pending).take() {
            previous.abort();
        }
    }

    /// Whether a call is waiting for the quiet period to end.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        lock(&self.pending).is_some()
    }
}

impl<A> Drop for Debounce<A> {
    fn drop(&mut self) {
        if let Some(previous) = lock(&self.pending).take() {
            previous.abort();
        }
    }
}

impl<A> std::fmt::Debug for Debounce<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debounce")
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}
