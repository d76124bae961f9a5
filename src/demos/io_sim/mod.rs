//! Continuous I/O transfer simulator: polling vs interrupt vs DMA.
//!
//! Each mode plays a fixed timeline of phases against an [`IoSimState`],
//! writing learner-facing log entries as it goes. Delays are divided by the
//! speed multiplier before every wait.

pub mod modes;
pub mod simulator;
pub mod state;

pub use modes::{IoMode, ModeConfig, ResponseBucket, MODE_TABLE};
pub use simulator::IoSimulator;
pub use state::{CpuStatus, Flow, IoSimState, LogEntry, Severity};
