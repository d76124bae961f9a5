//! Stepwise interrupt-handling walkthrough.
//!
//! Eight fixed steps take one I/O interrupt from request to return:
//!
//! 1. initial state, 2. IRQ, 3. INTA response, 4. context save,
//! 5. vector lookup, 6. service routine, 7. context restore (IRET),
//! 8. return to the main program.
//!
//! [`StepEngine`] is the synchronous cursor state machine. Entering a step
//! rebuilds the [`Snapshot`] from scratch, so going back and forth always
//! shows the same hardware state for the same step. [`InterruptDemo`] wraps
//! it with auto-play and disposal.

pub mod catalog;
pub mod engine;
pub mod player;
pub mod snapshot;

pub use catalog::{Step, StepId, STEPS};
pub use engine::{ChangeKind, RegisterChange, StepEngine, REGISTER_LOG_CAPACITY};
pub use player::InterruptDemo;
pub use snapshot::Snapshot;
