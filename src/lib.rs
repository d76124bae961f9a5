//! # irqlab
//!
//! Teaching simulator for two classic operating-systems topics:
//! - the hardware interrupt handling sequence, shown one step at a time
//! - polling vs interrupt-driven vs DMA transfer, played as a timeline
//!
//! Both engines are plain state plus transition functions. Rendering is left
//! to the caller, which reads the snapshots and drives the operations.
//!
//! ## Example
//!
//! ```rust
//! use irqlab::prelude::*;
//!
//! let mut engine = StepEngine::new();
//! engine.next_step();
//! engine.next_step();
//! engine.next_step();
//! assert_eq!(engine.current_step(), 4);
//! assert_eq!(engine.snapshot().stack.len(), 4);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,  // Many functions can't be const in stable Rust
    clippy::future_not_send,       // Pacer futures are Send; generic bounds confuse the lint
)]

pub mod cli;
pub mod config;
pub mod demos;
pub mod engine;
pub mod error;
pub mod logging;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{LabConfig, LabConfigBuilder};
    pub use crate::demos::interrupt::{InterruptDemo, Snapshot, StepEngine, StepId};
    pub use crate::demos::io_sim::{IoMode, IoSimState, IoSimulator, Severity};
    pub use crate::engine::clock::{Pacer, Speed, TokioPacer};
    pub use crate::engine::effects::{EffectController, EffectSpec};
    pub use crate::error::{LabError, LabResult};
}

/// Re-export for public API
pub use error::{LabError, LabResult};
