//! Static table of I/O transfer modes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::LabError;

/// Data-transfer strategy being simulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoMode {
    /// CPU busy-waits on the device status register.
    #[default]
    Polling,
    /// Device raises an interrupt when ready.
    Interrupt,
    /// DMA controller moves the data without the CPU.
    Dma,
}

impl IoMode {
    /// All modes in display order.
    pub const ALL: [Self; 3] = [Self::Polling, Self::Interrupt, Self::Dma];

    /// Stable key (`polling`, `interrupt`, `dma`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Polling => "polling",
            Self::Interrupt => "interrupt",
            Self::Dma => "dma",
        }
    }

    /// Static configuration for this mode.
    #[must_use]
    pub fn config(self) -> &'static ModeConfig {
        match self {
            Self::Polling => &MODE_TABLE[0],
            Self::Interrupt => &MODE_TABLE[1],
            Self::Dma => &MODE_TABLE[2],
        }
    }
}

impl std::fmt::Display for IoMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for IoMode {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                LabError::config(format!(
                    "unknown I/O mode '{s}' (expected polling, interrupt or dma)"
                ))
            })
    }
}

/// Qualitative response-time estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseBucket {
    /// Fast.
    Low,
    /// Moderate.
    Medium,
    /// Slow.
    High,
}

impl ResponseBucket {
    /// Numeric estimate in milliseconds.
    #[must_use]
    pub const fn millis(self) -> u32 {
        match self {
            Self::Low => 100,
            Self::Medium => 200,
            Self::High => 500,
        }
    }
}

/// Display data and metric seeds for one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeConfig {
    /// Mode this row describes.
    pub mode: IoMode,
    /// Display name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Transfer efficiency, percent.
    pub efficiency: u32,
    /// CPU usage, percent.
    pub cpu_usage: u32,
    /// Response-time bucket.
    pub response: ResponseBucket,
}

impl ModeConfig {
    /// `efficiency × 10`.
    #[must_use]
    pub const fn throughput(&self) -> u32 {
        self.efficiency * 10
    }
}

/// The mode table, indexed in [`IoMode::ALL`] order.
pub static MODE_TABLE: [ModeConfig; 3] = [
    ModeConfig {
        mode: IoMode::Polling,
        name: "Polling mode",
        description: "The CPU keeps querying the device status; simple but inefficient",
        efficiency: 30,
        cpu_usage: 90,
        response: ResponseBucket::High,
    },
    ModeConfig {
        mode: IoMode::Interrupt,
        name: "Interrupt mode",
        description: "The device notifies the CPU when ready, freeing it for other work",
        efficiency: 85,
        cpu_usage: 20,
        response: ResponseBucket::Medium,
    },
    ModeConfig {
        mode: IoMode::Dma,
        name: "DMA mode",
        description: "A DMA controller accesses memory directly; the CPU barely takes part",
        efficiency: 95,
        cpu_usage: 10,
        response: ResponseBucket::Low,
    },
];
