//! The continuous I/O simulator.
//!
//! A run is a fixed, mode-specific sequence of timed phases. It cannot be
//! paused, stepped or rewound: it plays to completion or fails, and then the
//! running flag drops.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::modes::{IoMode, ModeConfig};
use super::state::{CpuStatus, Flow, IoSimState, LogEntry, Severity};
use crate::config::IoConfig;
use crate::engine::clock::{Pacer, Speed, TokioPacer};
use crate::engine::effects::{EffectController, EffectSpec};
use crate::engine::perf::{PerfMonitor, TimingStats};
use crate::engine::rng::IdGen;
use crate::engine::util::format_duration;
use crate::error::LabResult;

/// Perf-monitor label for a whole run.
pub const RUN_TIMING_LABEL: &str = "simulation";

/// Default horizon for [`IoSimulator::simulation_progress`].
pub const DEFAULT_PROGRESS_HORIZON: Duration = Duration::from_millis(10_000);

/// Labels shown while polling.
pub const POLLING_PHASES: [&str; 6] = [
    "Initialise CPU state",
    "Enter polling loop",
    "Check device status",
    "Device not ready, keep polling",
    "Device ready, start transfer",
    "Transfer complete",
];

const POLL_ITERATIONS: usize = 5;
const DMA_CHUNKS: usize = 3;
const DMA_CHUNK_COUNT: u32 = 256;
const FLOW_PATH_LENGTH: f64 = 100.0;
const FLOW_DURATION: Duration = Duration::from_millis(2000);

/// Clears the running flag when the run ends, however it ends.
struct RunGuard<'a> {
    state: &'a Mutex<IoSimState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .running = false;
    }
}

/// Continuous I/O transfer simulator.
///
/// Generic over the [`Pacer`] so tests can inject failing waits; the default
/// sleeps on the Tokio clock.
#[derive(Debug)]
pub struct IoSimulator<P: Pacer = TokioPacer> {
    state: Arc<Mutex<IoSimState>>,
    ids: Mutex<IdGen>,
    perf: Mutex<PerfMonitor>,
    effects: EffectController,
    pacer: P,
    progress_horizon: Duration,
}

impl IoSimulator<TokioPacer> {
    /// Simulator in polling mode at normal speed.
    #[must_use]
    pub fn new(effects: EffectController) -> Self {
        Self::with_pacer(TokioPacer, effects)
    }

    /// Simulator configured from the `io` config section.
    ///
    /// # Errors
    ///
    /// Returns `LabError::InvalidSpeed` if the configured speed is unusable.
    pub fn from_config(config: &IoConfig, effects: EffectController) -> LabResult<Self> {
        let mut sim = Self::new(effects);
        sim.progress_horizon = config.progress_horizon();
        if let Some(seed) = config.id_seed {
            sim.ids = Mutex::new(IdGen::seeded(seed));
        }
        {
            let mut state = sim.state();
            state.mode = config.mode;
            state.speed = Speed::new(config.speed)?;
        }
        Ok(sim)
    }
}

impl<P: Pacer> IoSimulator<P> {
    /// Simulator that waits through `pacer`.
    #[must_use]
    pub fn with_pacer(pacer: P, effects: EffectController) -> Self {
        Self {
            state: Arc::new(Mutex::new(IoSimState::default())),
            ids: Mutex::new(IdGen::default()),
            perf: Mutex::new(PerfMonitor::new()),
            effects,
            pacer,
            progress_horizon: DEFAULT_PROGRESS_HORIZON,
        }
    }

    fn state(&self) -> MutexGuard<'_, IoSimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn perf(&self) -> MutexGuard<'_, PerfMonitor> {
        self.perf.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Read access ===

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> IoSimState {
        self.state().clone()
    }

    /// Run `f` against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&IoSimState) -> R) -> R {
        f(&self.state())
    }

    /// Whether a run is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Selected mode.
    #[must_use]
    pub fn mode(&self) -> IoMode {
        self.state().mode
    }

    /// Static configuration of the selected mode.
    #[must_use]
    pub fn current_mode_config(&self) -> &'static ModeConfig {
        self.mode().config()
    }

    /// Log entries, oldest first.
    #[must_use]
    pub fn logs(&self) -> Vec<LogEntry> {
        self.state().logs.to_vec()
    }

    /// Timing statistics collected so far.
    #[must_use]
    pub fn perf_report(&self) -> BTreeMap<String, TimingStats> {
        self.perf().report()
    }

    /// Effect registry used for the data-flow animations.
    #[must_use]
    pub const fn effects(&self) -> &EffectController {
        &self.effects
    }

    /// Elapsed share of the progress horizon, `0..=100`. Zero when idle.
    #[must_use]
    pub fn simulation_progress(&self) -> f64 {
        let state = self.state();
        match (state.running, state.started_at) {
            (true, Some(start)) => {
                let ratio = start.elapsed().as_secs_f64() / self.progress_horizon.as_secs_f64();
                (ratio * 100.0).min(100.0)
            }
            _ => 0.0,
        }
    }

    // === Operations ===

    /// Append a log entry.
    pub fn add_log(&self, message: impl Into<String>, severity: Severity) {
        let id = self
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_id();
        let entry = LogEntry {
            id,
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            message: message.into(),
            severity,
        };
        self.state().logs.push(entry);
    }

    /// Run the selected mode to completion.
    ///
    /// Returns `false` without doing anything if a run is already in flight.
    /// Phase failures never escape: they end the run with an error log entry.
    pub async fn start_simulation(&self) -> bool {
        let mode = {
            let mut state = self.state();
            if state.running {
                debug!("start ignored, a run is in flight");
                return false;
            }
            state.running = true;
            state.started_at = Some(Instant::now());
            state.phase = 0;
            state.restore_components();
            state.mode
        };
        let _guard = RunGuard { state: &self.state };
        for flow in [Flow::Polling, Flow::Interrupt, Flow::Dma] {
            self.effects.stop(flow.effect_id());
        }

        self.perf().start(RUN_TIMING_LABEL);
        let config = mode.config();
        self.add_log(format!("Starting {} simulation", config.name), Severity::Info);
        self.state().apply_metrics(config);
        info!(%mode, "simulation started");

        let outcome = match mode {
            IoMode::Polling => self.simulate_polling().await,
            IoMode::Interrupt => self.simulate_interrupt().await,
            IoMode::Dma => self.simulate_dma().await,
        };

        let elapsed = self.perf().end(RUN_TIMING_LABEL).unwrap_or_default();
        match outcome {
            Ok(()) => {
                self.add_log(
                    format!("Simulation complete in {}", format_duration(elapsed)),
                    Severity::Success,
                );
                info!(%mode, ?elapsed, "simulation finished");
            }
            Err(e) => {
                self.add_log(format!("Simulation error: {e}"), Severity::Error);
                warn!(%mode, error = %e, "simulation failed");
            }
        }
        true
    }

    /// Restore every component to its default, clear the log and cancel all
    /// effects. The running flag of an in-flight run is left alone.
    pub fn reset_simulation(&self) {
        self.effects.stop_all();
        {
            let mut state = self.state();
            state.restore_defaults();
            if !state.running {
                state.started_at = None;
            }
            state.logs.clear();
        }
        self.add_log("Simulator reset", Severity::Info);
        info!("simulator reset");
    }

    /// Switch mode and reset. Refused (returns `false`) while running.
    pub fn change_mode(&self, mode: IoMode) -> bool {
        {
            let mut state = self.state();
            if state.running {
                debug!(%mode, "mode change refused during a run");
                return false;
            }
            state.mode = mode;
        }
        self.reset_simulation();
        self.add_log(format!("Switched to {}", mode.config().name), Severity::Info);
        info!(%mode, "mode changed");
        true
    }

    /// Set the delay multiplier. Takes effect at the next wait.
    ///
    /// # Errors
    ///
    /// Returns `LabError::InvalidSpeed` for non-finite or non-positive values;
    /// the current speed is kept.
    pub fn set_simulation_speed(&self, factor: f64) -> LabResult<()> {
        let speed = Speed::new(factor)?;
        self.state().speed = speed;
        self.add_log(format!("Simulation speed set to {speed}"), Severity::Info);
        debug!(%speed, "speed changed");
        Ok(())
    }

    /// Cancel all effects and forget collected timings.
    pub fn dispose(&self) {
        self.effects.stop_all();
        self.perf().clear();
    }

    // === Phases ===

    async fn pause(&self, base_ms: u64) -> LabResult<()> {
        let delay = self.state().speed.scale_millis(base_ms);
        self.pacer.wait(delay).await
    }

    fn show_flow(&self, flow: Flow, on: bool) {
        self.state().animation.set(flow, on);
        if on {
            let spec = EffectSpec::data_flow(flow.effect_id(), FLOW_PATH_LENGTH, FLOW_DURATION);
            if let Err(e) = self.effects.start(flow.effect_id(), spec) {
                warn!(flow = flow.effect_id(), error = %e, "flow effect not started");
            }
        } else {
            self.effects.stop(flow.effect_id());
        }
    }

    async fn simulate_polling(&self) -> LabResult<()> {
        {
            let mut state = self.state();
            state.phase_labels = POLLING_PHASES.iter().map(ToString::to_string).collect();
            state.set_cpu(CpuStatus::Busy, "Polling I/O status");
        }

        for i in 0..POLL_ITERATIONS {
            {
                let mut state = self.state();
                state.phase = i + 1;
                state.controller.active = true;
            }
            self.show_flow(Flow::Polling, true);
            self.add_log(
                format!("Poll #{} - device not ready", i + 1),
                Severity::Warning,
            );
            self.pause(1000).await?;

            self.show_flow(Flow::Polling, false);
            self.state().controller.active = false;
            self.pause(500).await?;
        }

        self.state().device.ready("Data_001");
        self.add_log("Device ready, starting transfer", Severity::Success);

        self.show_flow(Flow::Polling, true);
        {
            let mut state = self.state();
            state.controller.active = true;
            state.controller.data = "Data_001".to_string();
        }
        self.pause(1000).await?;

        self.state().write_memory(0, "Data_001")?;
        self.add_log("Transfer complete", Severity::Success);
        self.state().set_cpu(CpuStatus::Idle, "Handling other tasks");
        Ok(())
    }

    async fn simulate_interrupt(&self) -> LabResult<()> {
        self.state().set_cpu(CpuStatus::Idle, "Running other tasks");
        self.add_log("CPU running other tasks, waiting for interrupt", Severity::Info);
        self.pause(2000).await?;

        self.state().device.ready("Data_002");
        self.add_log("I/O device ready, raising interrupt", Severity::Info);

        self.show_flow(Flow::Interrupt, true);
        self.pause(500).await?;

        self.state().set_cpu(CpuStatus::Busy, "Handling interrupt");
        self.add_log("CPU responds to interrupt, starting transfer", Severity::Success);
        {
            let mut state = self.state();
            state.controller.active = true;
            state.controller.data = "Data_002".to_string();
        }
        self.pause(1000).await?;

        self.state().write_memory(1, "Data_002")?;
        self.add_log("Transfer complete, returning to main program", Severity::Success);
        self.state().set_cpu(CpuStatus::Idle, "Resuming main program");
        self.show_flow(Flow::Interrupt, false);
        Ok(())
    }

    async fn simulate_dma(&self) -> LabResult<()> {
        {
            let mut state = self.state();
            state.set_cpu(CpuStatus::Busy, "Configuring DMA");
            state.dma.active = true;
        }
        self.add_log("CPU configures DMA controller", Severity::Info);
        self.pause(1000).await?;

        self.add_log("DMA configured, CPU continues other work", Severity::Success);
        {
            let mut state = self.state();
            state.set_cpu(CpuStatus::Idle, "Running other tasks");
            state.device.ready("Data_003");
        }
        self.add_log("I/O device ready, DMA transfer starting", Severity::Info);

        self.show_flow(Flow::Dma, true);
        self.state().controller.active = true;

        for i in 0..DMA_CHUNKS {
            self.pause(800).await?;
            {
                let mut state = self.state();
                state.phase = i + 1;
                state.write_memory(i + 2, &format!("Data_00{}", i + 3))?;
                state.dma.count = state.dma.count.saturating_sub(DMA_CHUNK_COUNT);
            }
            let percent = (i + 1) as f64 / DMA_CHUNKS as f64 * 100.0;
            self.add_log(
                format!("DMA transfer progress: {percent:.0}%"),
                Severity::Info,
            );
        }

        self.add_log("DMA transfer complete, notifying CPU", Severity::Success);
        self.show_flow(Flow::Dma, false);
        self.state().dma.active = false;
        Ok(())
    }
}

impl<P: Pacer> Drop for IoSimulator<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}
