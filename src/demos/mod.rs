//! The two teaching demos.
//!
//! 1. [`interrupt`] - eight-step walkthrough of interrupt handling
//! 2. [`io_sim`] - polling, interrupt and DMA transfers played in time
//!
//! Both share the utility layer in [`crate::engine`]: bounded logs, the
//! effect registry and timing helpers.

pub mod interrupt;
pub mod io_sim;

pub use interrupt::{InterruptDemo, StepEngine};
pub use io_sim::{IoMode, IoSimulator};
