//! Live state of the continuous I/O simulation.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::modes::{IoMode, ModeConfig};
use crate::engine::clock::Speed;
use crate::engine::log::BoundedLog;
use crate::error::{LabError, LabResult};

/// Simulation log entries kept.
pub const SIM_LOG_CAPACITY: usize = 20;

/// Number of memory slots in the bank.
pub const MEMORY_SLOTS: usize = 8;

/// Transfer count the DMA controller starts with.
pub const DMA_INITIAL_COUNT: u32 = 1024;

/// CPU activity state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuStatus {
    /// Free for other work.
    #[default]
    Idle,
    /// Occupied by I/O.
    Busy,
}

/// Device controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    /// Currently moving data.
    pub active: bool,
    /// Status label.
    pub status: String,
    /// Buffered payload.
    pub data: String,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            active: false,
            status: "Ready".to_string(),
            data: "None".to_string(),
        }
    }
}

/// The I/O device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Has data ready.
    pub active: bool,
    /// Status label.
    pub status: String,
    /// Payload.
    pub data: String,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            active: false,
            status: "Idle".to_string(),
            data: "No data".to_string(),
        }
    }
}

impl DeviceState {
    /// Mark the device ready with `payload`.
    pub fn ready(&mut self, payload: &str) {
        self.active = true;
        self.status = "Ready".to_string();
        self.data = payload.to_string();
    }
}

/// DMA controller registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmaState {
    /// Transfer in progress.
    pub active: bool,
    /// Source address.
    pub source_addr: u16,
    /// Target address.
    pub target_addr: u16,
    /// Remaining transfer count.
    pub count: u32,
}

impl Default for DmaState {
    fn default() -> Self {
        Self {
            active: false,
            source_addr: 0x2000,
            target_addr: 0x3000,
            count: DMA_INITIAL_COUNT,
        }
    }
}

/// One memory cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySlot {
    /// Stored payload (empty when unused).
    pub data: String,
    /// Written during this run.
    pub active: bool,
}

/// Metrics derived from the mode table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Transfer efficiency, percent.
    pub transfer_efficiency: u32,
    /// Response-time estimate, milliseconds.
    pub response_time_ms: u32,
    /// Throughput estimate.
    pub throughput: u32,
}

impl PerformanceMetrics {
    /// Metrics seeded from `config`.
    #[must_use]
    pub const fn from_mode(config: &ModeConfig) -> Self {
        Self {
            transfer_efficiency: config.efficiency,
            response_time_ms: config.response.millis(),
            throughput: config.throughput(),
        }
    }
}

/// Log entry severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Progress information.
    Info,
    /// Something completed.
    Success,
    /// Device not ready and similar.
    Warning,
    /// Run failed.
    Error,
}

/// One simulation log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Nine-character base-36 id.
    pub id: String,
    /// Local wall-clock time, `HH:MM:SS`.
    pub timestamp: String,
    /// Message text.
    pub message: String,
    /// Severity.
    pub severity: Severity,
}

/// Data-flow animations the renderer can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// CPU ↔ controller status polling.
    Polling,
    /// Device → CPU interrupt signal.
    Interrupt,
    /// Device → memory DMA transfer.
    Dma,
}

impl Flow {
    /// Effect identifier used with the effect controller.
    #[must_use]
    pub const fn effect_id(self) -> &'static str {
        match self {
            Self::Polling => "polling-flow",
            Self::Interrupt => "interrupt-flow",
            Self::Dma => "dma-flow",
        }
    }
}

/// Animation visibility flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationFlags {
    /// Polling flow shown.
    pub show_polling_flow: bool,
    /// Interrupt flow shown.
    pub show_interrupt_flow: bool,
    /// DMA flow shown.
    pub show_dma_flow: bool,
    /// Any data flow shown.
    pub data_flow_active: bool,
}

impl AnimationFlags {
    /// Whether `flow` is shown.
    #[must_use]
    pub const fn get(&self, flow: Flow) -> bool {
        match flow {
            Flow::Polling => self.show_polling_flow,
            Flow::Interrupt => self.show_interrupt_flow,
            Flow::Dma => self.show_dma_flow,
        }
    }

    /// Show or hide `flow`.
    pub fn set(&mut self, flow: Flow, on: bool) {
        match flow {
            Flow::Polling => self.show_polling_flow = on,
            Flow::Interrupt => self.show_interrupt_flow = on,
            Flow::Dma => self.show_dma_flow = on,
        }
        self.data_flow_active =
            self.show_polling_flow || self.show_interrupt_flow || self.show_dma_flow;
    }
}

/// Everything the renderer reads from the I/O simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoSimState {
    /// Selected mode.
    pub mode: IoMode,
    /// A run is in flight.
    pub running: bool,
    /// Delay multiplier.
    pub speed: Speed,
    /// CPU status.
    pub cpu_status: CpuStatus,
    /// CPU activity label.
    pub cpu_activity: String,
    /// Program counter shown next to the CPU.
    pub program_counter: u16,
    /// CPU utilization, percent.
    pub cpu_utilization: u32,
    /// Device controller.
    pub controller: ControllerState,
    /// I/O device.
    pub device: DeviceState,
    /// DMA controller.
    pub dma: DmaState,
    /// Memory bank.
    pub memory: [MemorySlot; MEMORY_SLOTS],
    /// Derived metrics.
    pub metrics: PerformanceMetrics,
    /// Animation flags.
    pub animation: AnimationFlags,
    /// Current phase counter within the run.
    pub phase: usize,
    /// Phase labels of the current run, if the mode names them.
    pub phase_labels: Vec<String>,
    /// Bounded run log.
    pub logs: BoundedLog<LogEntry>,
    /// When the current run started.
    #[serde(skip)]
    pub started_at: Option<Instant>,
}

impl Default for IoSimState {
    fn default() -> Self {
        Self {
            mode: IoMode::default(),
            running: false,
            speed: Speed::default(),
            cpu_status: CpuStatus::Idle,
            cpu_activity: IDLE_ACTIVITY.to_string(),
            program_counter: 0x1000,
            cpu_utilization: 0,
            controller: ControllerState::default(),
            device: DeviceState::default(),
            dma: DmaState::default(),
            memory: Default::default(),
            metrics: PerformanceMetrics::default(),
            animation: AnimationFlags::default(),
            phase: 0,
            phase_labels: Vec::new(),
            logs: BoundedLog::new(SIM_LOG_CAPACITY),
            started_at: None,
        }
    }
}

const IDLE_ACTIVITY: &str = "Waiting for instructions";

impl IoSimState {
    /// Controller, device, DMA, memory and animation flags back to defaults.
    pub fn restore_components(&mut self) {
        self.controller = ControllerState::default();
        self.device = DeviceState::default();
        self.dma = DmaState::default();
        self.memory = Default::default();
        self.animation = AnimationFlags::default();
    }

    /// Full reset of everything except mode, speed, log and the run flag.
    pub fn restore_defaults(&mut self) {
        self.restore_components();
        self.metrics = PerformanceMetrics::default();
        self.cpu_status = CpuStatus::Idle;
        self.cpu_activity = IDLE_ACTIVITY.to_string();
        self.cpu_utilization = 0;
        self.phase = 0;
        self.phase_labels.clear();
    }

    /// Seed metrics and CPU utilization from `config`.
    pub fn apply_metrics(&mut self, config: &ModeConfig) {
        self.metrics = PerformanceMetrics::from_mode(config);
        self.cpu_utilization = config.cpu_usage;
    }

    /// Set CPU status and activity label together.
    pub fn set_cpu(&mut self, status: CpuStatus, activity: &str) {
        self.cpu_status = status;
        self.cpu_activity = activity.to_string();
    }

    /// Memory slot `index`.
    ///
    /// # Errors
    ///
    /// Returns `LabError::MemorySlot` if `index` is outside the bank.
    pub fn memory_slot_mut(&mut self, index: usize) -> LabResult<&mut MemorySlot> {
        self.memory.get_mut(index).ok_or(LabError::MemorySlot {
            index,
            len: MEMORY_SLOTS,
        })
    }

    /// Store `payload` in slot `index` and mark it active.
    ///
    /// # Errors
    ///
    /// Returns `LabError::MemorySlot` if `index` is outside the bank.
    pub fn write_memory(&mut self, index: usize, payload: &str) -> LabResult<()> {
        let slot = self.memory_slot_mut(index)?;
        slot.data = payload.to_string();
        slot.active = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::engine::util::deep_clone;

    #[test]
    fn test_defaults() {
        let state = IoSimState::default();
        assert!(!state.running);
        assert_eq!(state.controller.status, "Ready");
        assert_eq!(state.controller.data, "None");
        assert_eq!(state.device.status, "Idle");
        assert_eq!(state.device.data, "No data");
        assert_eq!(state.dma.count, 1024);
        assert_eq!(state.dma.source_addr, 0x2000);
        assert_eq!(state.dma.target_addr, 0x3000);
        assert!(state.memory.iter().all(|m| m.data.is_empty() && !m.active));
        assert_eq!(state.logs.capacity(), SIM_LOG_CAPACITY);
    }

    #[test]
    fn test_write_memory_out_of_range() {
        let mut state = IoSimState::default();
        state.write_memory(3, "Data_004").unwrap();
        assert_eq!(state.memory[3].data, "Data_004");
        assert!(state.memory[3].active);

        let err = state.write_memory(MEMORY_SLOTS, "x").unwrap_err();
        assert!(matches!(err, LabError::MemorySlot { index: 8, len: 8 }));
    }

    #[test]
    fn test_restore_defaults_keeps_mode_and_speed() {
        let mut state = IoSimState {
            mode: IoMode::Dma,
            speed: Speed::new(2.0).unwrap(),
            ..IoSimState::default()
        };
        state.apply_metrics(IoMode::Dma.config());
        state.device.ready("Data_003");
        state.animation.set(Flow::Dma, true);
        state.restore_defaults();

        assert_eq!(state.mode, IoMode::Dma);
        assert!((state.speed.factor() - 2.0).abs() < f64::EPSILON);
        assert_eq!(state.metrics, PerformanceMetrics::default());
        assert_eq!(state.cpu_utilization, 0);
        assert_eq!(state.device, DeviceState::default());
        assert!(!state.animation.data_flow_active);
    }

    #[test]
    fn test_metrics_from_mode() {
        let m = PerformanceMetrics::from_mode(IoMode::Interrupt.config());
        assert_eq!(m.transfer_efficiency, 85);
        assert_eq!(m.response_time_ms, 200);
        assert_eq!(m.throughput, 850);
    }

    #[test]
    fn test_animation_flags_track_any_flow() {
        let mut flags = AnimationFlags::default();
        flags.set(Flow::Polling, true);
        flags.set(Flow::Dma, true);
        assert!(flags.data_flow_active);
        flags.set(Flow::Polling, false);
        assert!(flags.data_flow_active);
        flags.set(Flow::Dma, false);
        assert!(!flags.data_flow_active);
    }

    #[test]
    fn test_deep_clone_drops_run_start() {
        let state = IoSimState {
            started_at: Some(Instant::now()),
            ..IoSimState::default()
        };
        let copy = deep_clone(&state).unwrap();
        assert!(copy.started_at.is_none());
        assert_eq!(copy.dma, state.dma);
    }
}
