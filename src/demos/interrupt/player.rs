//! Auto-play driver and lifecycle around [`StepEngine`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::engine::StepEngine;
use super::snapshot::Snapshot;
use crate::config::InterruptConfig;
use crate::engine::effects::EffectController;
use crate::error::{LabError, LabResult};

fn lock(engine: &Mutex<StepEngine>) -> MutexGuard<'_, StepEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Interactive interrupt-handling demo.
///
/// Manual navigation goes straight to the shared [`StepEngine`]; auto-play
/// runs as a Tokio task that advances one step per interval and stops itself
/// on the final step. Dropping the demo cancels the task and every effect
/// registered with its [`EffectController`].
#[derive(Debug)]
pub struct InterruptDemo {
    engine: Arc<Mutex<StepEngine>>,
    effects: EffectController,
    autoplay: Option<JoinHandle<()>>,
}

impl InterruptDemo {
    /// Demo on step 1 with the default auto-play interval.
    #[must_use]
    pub fn new(effects: EffectController) -> Self {
        Self {
            engine: Arc::new(Mutex::new(StepEngine::new())),
            effects,
            autoplay: None,
        }
    }

    /// Demo configured from the `interrupt` config section.
    #[must_use]
    pub fn from_config(config: &InterruptConfig, effects: EffectController) -> Self {
        let demo = Self::new(effects);
        lock(&demo.engine).set_auto_play_interval(config.autoplay_interval());
        demo
    }

    /// Run `f` against the current engine state.
    pub fn read<R>(&self, f: impl FnOnce(&StepEngine) -> R) -> R {
        f(&lock(&self.engine))
    }

    /// Copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.read(|e| e.snapshot().clone())
    }

    /// Current 1-based step.
    #[must_use]
    pub fn current_step(&self) -> usize {
        self.read(StepEngine::current_step)
    }

    /// Progress through the catalog, in percent.
    #[must_use]
    pub fn progress_percentage(&self) -> f64 {
        self.read(StepEngine::progress_percentage)
    }

    /// Whether auto-play is running.
    #[must_use]
    pub fn is_auto_playing(&self) -> bool {
        self.read(StepEngine::is_auto_playing)
    }

    /// Effect registry owned by the demo.
    #[must_use]
    pub const fn effects(&self) -> &EffectController {
        &self.effects
    }

    /// Advance one step.
    pub fn next_step(&self) -> bool {
        lock(&self.engine).next_step()
    }

    /// Go back one step.
    pub fn previous_step(&self) -> bool {
        lock(&self.engine).previous_step()
    }

    /// Jump to a 1-based step.
    pub fn go_to_step(&self, step: usize) -> bool {
        lock(&self.engine).go_to_step(step)
    }

    /// Start auto-play if stopped, stop it if running.
    ///
    /// Returns whether auto-play is running afterwards.
    ///
    /// # Errors
    ///
    /// Returns `LabError::Runtime` when called outside a Tokio runtime.
    pub fn toggle_auto_play(&mut self) -> LabResult<bool> {
        if self.is_auto_playing() {
            self.stop_auto_play();
            Ok(false)
        } else {
            self.start_auto_play()
        }
    }

    /// Start advancing one step per interval.
    ///
    /// Does nothing (and returns `Ok(false)`) when already on the final
    /// step. The first advance happens one full interval after the call.
    ///
    /// # Errors
    ///
    /// Returns `LabError::Runtime` when called outside a Tokio runtime.
    pub fn start_auto_play(&mut self) -> LabResult<bool> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| LabError::Runtime(format!("auto-play needs a Tokio runtime: {e}")))?;
        self.abort_task();

        let period = {
            let mut engine = lock(&self.engine);
            if !engine.can_go_next() {
                engine.set_auto_playing(false);
                debug!("auto-play not started on the final step");
                return Ok(false);
            }
            engine.set_auto_playing(true);
            engine.auto_play_interval()
        };

        let engine = Arc::clone(&self.engine);
        self.autoplay = Some(runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut engine = lock(&engine);
                if !engine.is_auto_playing() {
                    break;
                }
                engine.next_step();
                if !engine.can_go_next() {
                    engine.set_auto_playing(false);
                    info!(step = engine.current_step(), "auto-play finished");
                    break;
                }
            }
        }));
        info!(interval = ?period, "auto-play started");
        Ok(true)
    }

    /// Stop auto-play. Safe to call when not running.
    pub fn stop_auto_play(&mut self) {
        self.abort_task();
        lock(&self.engine).set_auto_playing(false);
    }

    /// Change the auto-play interval, restarting auto-play if it is running.
    ///
    /// # Errors
    ///
    /// Returns `LabError::Config` for a zero interval, or
    /// `LabError::Runtime` if a restart is needed outside a Tokio runtime.
    pub fn set_auto_play_speed(&mut self, interval: Duration) -> LabResult<()> {
        if interval.is_zero() {
            return Err(LabError::config("auto-play interval must be positive"));
        }
        let was_playing = {
            let mut engine = lock(&self.engine);
            engine.set_auto_play_interval(interval);
            engine.is_auto_playing()
        };
        if was_playing {
            self.stop_auto_play();
            self.start_auto_play()?;
        }
        Ok(())
    }

    /// Stop auto-play, return to step 1 and clear the register history.
    pub fn reset_demo(&mut self) {
        self.abort_task();
        lock(&self.engine).reset_demo();
        info!("interrupt demo reset");
    }

    /// Cancel the auto-play task and every effect. Idempotent.
    pub fn dispose(&mut self) {
        self.stop_auto_play();
        self.effects.stop_all();
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.autoplay.take() {
            task.abort();
        }
    }
}

impl Drop for InterruptDemo {
    fn drop(&mut self) {
        self.dispose();
    }
}
