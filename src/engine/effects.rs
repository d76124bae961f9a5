//! Named, cancelable visual effects and delayed callbacks.
//!
//! The engines never draw anything. They describe effects declaratively
//! ([`EffectSpec`]) and hand them to an [`EffectController`], which tracks
//! each effect's lifecycle under a caller-chosen id. A renderer reads the
//! active specs and animates them however it likes.
//!
//! Invariants:
//! - At most one effect and at most one pending callback per id. Starting
//!   an effect or scheduling a callback under a taken id cancels the old one.
//! - [`EffectController::stop_all`] cancels every effect and every pending
//!   callback and empties the registry. Engine teardown relies on this.
//!
//! Starting a finite effect or scheduling a callback spawns a Tokio task;
//! outside a Tokio runtime those calls return `LabError::Runtime`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{LabError, LabResult};

fn runtime(what: &str) -> LabResult<Handle> {
    Handle::try_current()
        .map_err(|e| LabError::Runtime(format!("{what} needs a Tokio runtime: {e}")))
}

/// Default highlight colour.
pub const HIGHLIGHT_COLOR: &str = "#f39c12";

/// Direction a slide-in effect enters from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideDirection {
    /// From the left edge.
    #[default]
    Left,
    /// From the right edge.
    Right,
    /// From the top edge.
    Up,
    /// From the bottom edge.
    Down,
}

/// What the renderer should animate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectKind {
    /// Breathing opacity/scale pulse.
    Pulse,
    /// Dash sweep along a path of the given length.
    DataFlow {
        /// Total path length in renderer units.
        path_length: f64,
    },
    /// Glow around the target.
    Highlight {
        /// CSS-style colour.
        color: String,
    },
    /// Slide into place.
    SlideIn {
        /// Entry edge.
        direction: SlideDirection,
    },
}

/// How many times an effect repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Iterations {
    /// Repeat a fixed number of times, then finish.
    Finite(u32),
    /// Repeat until cancelled.
    Infinite,
}

/// Declarative description of one effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    /// Component or path the effect applies to.
    pub target: String,
    /// Animation kind.
    pub kind: EffectKind,
    /// Duration of one iteration.
    pub duration: Duration,
    /// Repeat count.
    pub iterations: Iterations,
}

impl EffectSpec {
    /// Endless pulse.
    #[must_use]
    pub fn pulse(target: impl Into<String>, duration: Duration) -> Self {
        Self {
            target: target.into(),
            kind: EffectKind::Pulse,
            duration,
            iterations: Iterations::Infinite,
        }
    }

    /// Endless data-flow sweep along a path.
    #[must_use]
    pub fn data_flow(target: impl Into<String>, path_length: f64, duration: Duration) -> Self {
        Self {
            target: target.into(),
            kind: EffectKind::DataFlow { path_length },
            duration,
            iterations: Iterations::Infinite,
        }
    }

    /// Three one-second glows.
    #[must_use]
    pub fn highlight(target: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: EffectKind::Highlight {
                color: color.into(),
            },
            duration: Duration::from_millis(1000),
            iterations: Iterations::Finite(3),
        }
    }

    /// Single half-second slide.
    #[must_use]
    pub fn slide_in(target: impl Into<String>, direction: SlideDirection) -> Self {
        Self {
            target: target.into(),
            kind: EffectKind::SlideIn { direction },
            duration: Duration::from_millis(500),
            iterations: Iterations::Finite(1),
        }
    }

    /// Total play time, `None` for endless effects.
    #[must_use]
    pub fn total_duration(&self) -> Option<Duration> {
        match self.iterations {
            Iterations::Finite(n) => Some(self.duration * n),
            Iterations::Infinite => None,
        }
    }
}

/// Lifecycle of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectStatus {
    /// Created, not yet playing.
    Pending,
    /// Playing.
    Running,
    /// Played to the end.
    Finished,
    /// Stopped early.
    Cancelled,
}

impl EffectStatus {
    /// Finished or cancelled.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

/// Completion signal of one effect.
#[derive(Debug)]
pub struct EffectCompletion {
    rx: watch::Receiver<EffectStatus>,
}

impl EffectCompletion {
    /// Wait until the effect finishes or is cancelled.
    ///
    /// Endless effects only complete when cancelled.
    pub async fn wait(mut self) -> EffectStatus {
        let status = match self.rx.wait_for(|status| status.is_terminal()).await {
            Ok(status) => *status,
            Err(_) => EffectStatus::Cancelled,
        };
        status
    }
}

/// A playing (or played) effect.
#[derive(Debug)]
pub struct Effect {
    spec: EffectSpec,
    status: Arc<watch::Sender<EffectStatus>>,
    timer: Option<JoinHandle<()>>,
}

impl Effect {
    /// Create a pending effect.
    #[must_use]
    pub fn new(spec: EffectSpec) -> Self {
        let (tx, _rx) = watch::channel(EffectStatus::Pending);
        Self {
            spec,
            status: Arc::new(tx),
            timer: None,
        }
    }

    /// The effect's description.
    #[must_use]
    pub const fn spec(&self) -> &EffectSpec {
        &self.spec
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> EffectStatus {
        *self.status.borrow()
    }

    /// Completion signal; resolves immediately if already terminal.
    #[must_use]
    pub fn completion(&self) -> EffectCompletion {
        EffectCompletion {
            rx: self.status.subscribe(),
        }
    }

    /// Start playing. Finite effects finish on their own after
    /// [`EffectSpec::total_duration`].
    ///
    /// # Errors
    ///
    /// Returns `LabError::Runtime` for a finite effect outside a Tokio
    /// runtime; the effect stays pending.
    pub fn play(&mut self) -> LabResult<()> {
        if self.status() != EffectStatus::Pending {
            return Ok(());
        }
        let total = self.spec.total_duration();
        let handle = total.map(|_| runtime("finite effect")).transpose()?;
        self.status.send_replace(EffectStatus::Running);
        if let (Some(total), Some(handle)) = (total, handle) {
            let status = Arc::clone(&self.status);
            self.timer = Some(handle.spawn(async move {
                tokio::time::sleep(total).await;
                status.send_if_modified(|s| {
                    if *s == EffectStatus::Running {
                        *s = EffectStatus::Finished;
                        true
                    } else {
                        false
                    }
                });
            }));
        }
        Ok(())
    }

    /// Stop early. No effect on finished effects.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.status.send_if_modified(|s| {
            if s.is_terminal() {
                false
            } else {
                *s = EffectStatus::Cancelled;
                true
            }
        });
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug, Default)]
struct Registry {
    effects: HashMap<String, Effect>,
    timers: HashMap<String, JoinHandle<()>>,
}

impl Registry {
    fn stop(&mut self, id: &str) -> bool {
        let mut stopped = false;
        if let Some(mut effect) = self.effects.remove(id) {
            effect.cancel();
            stopped = true;
        }
        if let Some(timer) = self.timers.remove(id) {
            timer.abort();
            stopped = true;
        }
        stopped
    }
}

/// One entry of an effect sequence.
pub struct SequenceStep {
    /// Registry id the effect runs under.
    pub id: String,
    /// Builds the effect when its turn comes.
    pub factory: Box<dyn FnOnce() -> EffectSpec + Send>,
    /// Pause before starting this effect.
    pub delay: Duration,
}

impl SequenceStep {
    /// Step with no pre-delay.
    pub fn new(
        id: impl Into<String>,
        factory: impl FnOnce() -> EffectSpec + Send + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            factory: Box::new(factory),
            delay: Duration::ZERO,
        }
    }

    /// Set the pre-delay.
    #[must_use]
    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl std::fmt::Debug for SequenceStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceStep")
            .field("id", &self.id)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

/// Shared registry of effects and delayed callbacks.
///
/// Cheap to clone; clones share the same registry. Construct one per engine
/// (or per test) and pass it in.
#[derive(Debug, Clone, Default)]
pub struct EffectController {
    inner: Arc<Mutex<Registry>>,
}

impl EffectController {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start `spec` under `id`, cancelling whatever effect or pending
    /// callback held the id.
    ///
    /// # Errors
    ///
    /// Returns `LabError::Runtime` for a finite effect outside a Tokio
    /// runtime. The registry is left untouched.
    pub fn start(&self, id: impl Into<String>, spec: EffectSpec) -> LabResult<EffectCompletion> {
        let id = id.into();
        let mut effect = Effect::new(spec);
        effect.play()?;
        let completion = effect.completion();

        let mut registry = self.registry();
        if registry.stop(&id) {
            debug!(%id, "replaced effect or callback");
        } else {
            debug!(%id, "effect started");
        }
        registry.effects.insert(id, effect);
        Ok(completion)
    }

    /// Cancel the effect and pending callback registered under `id`.
    ///
    /// Returns `true` if anything was cancelled.
    pub fn stop(&self, id: &str) -> bool {
        self.registry().stop(id)
    }

    /// Cancel everything and clear the registry.
    pub fn stop_all(&self) {
        let mut registry = self.registry();
        let count = registry.effects.len() + registry.timers.len();
        for (_, mut effect) in registry.effects.drain() {
            effect.cancel();
        }
        for (_, timer) in registry.timers.drain() {
            timer.abort();
        }
        if count > 0 {
            debug!(count, "cancelled all effects and timers");
        }
    }

    /// Run `callback` after `delay` under `id`.
    ///
    /// Any effect or callback already registered under `id` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `LabError::Runtime` outside a Tokio runtime; nothing is
    /// cancelled or registered.
    pub fn schedule<F>(&self, id: impl Into<String>, delay: Duration, callback: F) -> LabResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = runtime("delayed callback")?;
        let id = id.into();
        let mut registry = self.registry();
        registry.stop(&id);

        let inner = Arc::clone(&self.inner);
        let key = id.clone();
        let task = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .timers
                .remove(&key);
            callback();
        });
        registry.timers.insert(id, task);
        Ok(())
    }

    /// Run effects strictly one after another, each after its pre-delay,
    /// waiting for every effect to finish before starting the next.
    ///
    /// An endless effect in the list blocks the sequence until it is
    /// cancelled through [`Self::stop`] or [`Self::stop_all`].
    ///
    /// # Errors
    ///
    /// Propagates the first failure to start an effect; later steps do not run.
    pub async fn sequence(&self, steps: Vec<SequenceStep>) -> LabResult<()> {
        for step in steps {
            if !step.delay.is_zero() {
                tokio::time::sleep(step.delay).await;
            }
            let spec = (step.factory)();
            self.start(step.id, spec)?.wait().await;
        }
        Ok(())
    }

    /// Whether an effect is registered under `id` and not yet terminal.
    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.registry()
            .effects
            .get(id)
            .is_some_and(|e| !e.status().is_terminal())
    }

    /// Status of the effect registered under `id`.
    #[must_use]
    pub fn status(&self, id: &str) -> Option<EffectStatus> {
        self.registry().effects.get(id).map(Effect::status)
    }

    /// Ids and specs of effects that are still playing, sorted by id.
    #[must_use]
    pub fn active_effects(&self) -> Vec<(String, EffectSpec)> {
        let registry = self.registry();
        let mut active: Vec<(String, EffectSpec)> = registry
            .effects
            .iter()
            .filter(|(_, e)| !e.status().is_terminal())
            .map(|(id, e)| (id.clone(), e.spec().clone()))
            .collect();
        active.sort_by(|a, b| a.0.cmp(&b.0));
        active
    }

    /// Number of callbacks that have not fired yet.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.registry().timers.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let registry = self.registry();
        registry.effects.is_empty() && registry.timers.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn flow(target: &str) -> EffectSpec {
        EffectSpec::data_flow(target, 120.0, Duration::from_millis(2000))
    }

    #[test]
    fn test_total_duration() {
        assert_eq!(
            EffectSpec::highlight("cpu", HIGHLIGHT_COLOR).total_duration(),
            Some(Duration::from_millis(3000))
        );
        assert_eq!(
            EffectSpec::slide_in("log", SlideDirection::Up).total_duration(),
            Some(Duration::from_millis(500))
        );
        assert_eq!(flow("bus").total_duration(), None);
        assert_eq!(
            EffectSpec::pulse("cpu", Duration::from_millis(1000)).total_duration(),
            None
        );
    }

    #[test]
    fn test_effect_cancel_without_runtime() {
        let mut effect = Effect::new(flow("bus"));
        effect.play().unwrap();
        assert_eq!(effect.status(), EffectStatus::Running);
        effect.cancel();
        assert_eq!(effect.status(), EffectStatus::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finite_effect_finishes() {
        let controller = EffectController::new();
        let done = controller
            .start("glow", EffectSpec::highlight("cpu", HIGHLIGHT_COLOR))
            .unwrap();
        assert!(controller.is_active("glow"));

        let start = tokio::time::Instant::now();
        assert_eq!(done.wait().await, EffectStatus::Finished);
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
        assert!(!controller.is_active("glow"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_previous() {
        let controller = EffectController::new();
        let first = controller.start("bus", flow("a")).unwrap();
        let _second = controller.start("bus", flow("b")).unwrap();

        assert_eq!(first.wait().await, EffectStatus::Cancelled);
        let active = controller.active_effects();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].1.target, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_cancels_effects_and_timers() {
        let controller = EffectController::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let a = controller.start("a", flow("a")).unwrap();
        let b = controller
            .start("b", EffectSpec::pulse("cpu", Duration::from_millis(1000)))
            .unwrap();
        let counter = Arc::clone(&fired);
        controller
            .schedule("later", Duration::from_millis(100), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(controller.pending_timers(), 1);

        controller.stop_all();
        assert!(controller.is_empty());
        assert_eq!(a.wait().await, EffectStatus::Cancelled);
        assert_eq!(b.wait().await, EffectStatus::Cancelled);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_fires_once_and_unregisters() {
        let controller = EffectController::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        controller
            .schedule("tick", Duration::from_millis(250), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(controller.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_callback() {
        let controller = EffectController::new();
        let fired = Arc::new(AtomicUsize::new(0));
        for value in [1, 10] {
            let counter = Arc::clone(&fired);
            controller
                .schedule("tick", Duration::from_millis(100), move || {
                    counter.fetch_add(value, Ordering::SeqCst);
                })
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_runs_in_order() {
        let controller = EffectController::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let steps = ["first", "second", "third"]
            .into_iter()
            .map(|name| {
                let order = Arc::clone(&order);
                SequenceStep::new(name, move || {
                    order.lock().unwrap().push(name);
                    EffectSpec::slide_in(name, SlideDirection::Left)
                })
                .after(Duration::from_millis(100))
            })
            .collect();

        let start = tokio::time::Instant::now();
        controller.sequence(steps).await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
        // three pre-delays of 100ms plus three 500ms slides
        assert_eq!(start.elapsed(), Duration::from_millis(1800));
        assert_eq!(controller.status("third"), Some(EffectStatus::Finished));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_cancels_callback_under_same_id() {
        let controller = EffectController::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        controller
            .schedule("cpu", Duration::from_millis(100), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        controller
            .start("cpu", EffectSpec::pulse("cpu", Duration::from_millis(1000)))
            .unwrap();
        assert_eq!(controller.pending_timers(), 0);
        assert!(controller.is_active("cpu"));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_finite_effect_outside_runtime_is_an_error() {
        let controller = EffectController::new();
        let result = controller.start("glow", EffectSpec::highlight("cpu", HIGHLIGHT_COLOR));
        assert!(matches!(result, Err(LabError::Runtime(_))));
        assert!(controller.is_empty());

        let mut effect = Effect::new(EffectSpec::slide_in("log", SlideDirection::Down));
        assert!(effect.play().is_err());
        assert_eq!(effect.status(), EffectStatus::Pending);
    }

    #[test]
    fn test_endless_effect_outside_runtime_still_starts() {
        let controller = EffectController::new();
        assert!(controller.start("bus", flow("bus")).is_ok());
        assert!(controller.is_active("bus"));
        controller.stop_all();
        assert!(controller.is_empty());
    }

    #[test]
    fn test_schedule_outside_runtime_is_an_error() {
        let controller = EffectController::new();
        controller.start("tick", flow("bus")).unwrap();
        let result = controller.schedule("tick", Duration::from_millis(10), || {});
        assert!(matches!(result, Err(LabError::Runtime(_))));
        // the failed call cancels nothing
        assert!(controller.is_active("tick"));
        assert_eq!(controller.pending_timers(), 0);
    }
}
