//! Wall-clock pacing for timed phases.
//!
//! Handles:
//! - Speed multipliers (higher = faster, always > 0)
//! - Scaling a phase's base delay by the multiplier
//! - The awaitable wait primitive the I/O simulator yields on
//!
//! Waits go through [`Pacer`] so tests can run phases in paused Tokio time
//! or inject failures without touching the engine.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::error::{LabError, LabResult};

/// Speed multiplier applied to every phase delay.
///
/// Delays are divided by the multiplier, so `2.0` halves real elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Speed(f64);

impl Speed {
    /// Normal speed.
    pub const NORMAL: Self = Self(1.0);

    /// Create a multiplier.
    ///
    /// # Errors
    ///
    /// Returns `LabError::InvalidSpeed` if `factor` is not finite or not > 0.
    pub fn new(factor: f64) -> LabResult<Self> {
        if factor.is_finite() && factor > 0.0 {
            Ok(Self(factor))
        } else {
            Err(LabError::InvalidSpeed(factor))
        }
    }

    /// Raw multiplier.
    #[must_use]
    pub const fn factor(self) -> f64 {
        self.0
    }

    /// Scale a base delay given in milliseconds.
    #[must_use]
    pub fn scale_millis(self, base_ms: u64) -> Duration {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let nanos = (base_ms as f64 * 1_000_000.0 / self.0).round() as u64;
        Duration::from_nanos(nanos)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<f64> for Speed {
    type Error = LabError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Speed> for f64 {
    fn from(speed: Speed) -> Self {
        speed.0
    }
}

impl std::fmt::Display for Speed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.0)
    }
}

/// Awaitable timed wait used between simulation phases.
pub trait Pacer: Send + Sync {
    /// Suspend for `duration`.
    ///
    /// # Errors
    ///
    /// Implementations may fail the wait; the I/O simulator turns that into
    /// an error log entry and ends the run.
    fn wait(&self, duration: Duration) -> impl Future<Output = LabResult<()>> + Send;
}

/// Pacer backed by `tokio::time::sleep`.
///
/// Honours paused time in tests (`#[tokio::test(start_paused = true)]`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    async fn wait(&self, duration: Duration) -> LabResult<()> {
        tokio::time::sleep(duration).await;
        Ok(())
    }
}
