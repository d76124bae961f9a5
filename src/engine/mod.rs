//! Utility layer shared by both demos.
//!
//! Nothing here knows about interrupts or I/O:
//! - [`log`]: FIFO-evicting bounded logs
//! - [`clock`]: speed multiplier and awaitable waits
//! - [`rng`]: base-36 identifiers
//! - [`effects`]: registry of cancelable visual effects and delayed callbacks
//! - [`perf`]: named timing statistics
//! - [`scheduler`]: throttle and debounce
//! - [`util`]: delay, duration formatting, deep clone

pub mod clock;
pub mod effects;
pub mod log;
pub mod perf;
pub mod rng;
pub mod scheduler;
pub mod util;

pub use clock::{Pacer, Speed, TokioPacer};
pub use effects::{EffectController, EffectSpec, EffectStatus, SequenceStep};
pub use log::BoundedLog;
pub use perf::{PerfMonitor, TimingStats};
pub use rng::{generate_id, IdGen};
pub use scheduler::{Debounce, Throttle};
pub use util::{deep_clone, delay, format_duration};
