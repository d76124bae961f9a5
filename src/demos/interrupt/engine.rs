//! Cursor state machine over the step catalog.
//!
//! Every cursor change runs the full transition before returning: the
//! snapshot is reset to its canonical state, then exactly one step-specific
//! setup function paints the step. Out-of-range moves are ignored.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::catalog::{self, Step, StepId, STEPS};
use super::snapshot::{
    hex16, mark_current, Component, Register, Snapshot, DEVICE_IRQ_LINE, DEVICE_VECTOR,
};
use crate::engine::log::BoundedLog;

/// Register-change entries kept for display.
pub const REGISTER_LOG_CAPACITY: usize = 10;

/// Default auto-play interval.
pub const DEFAULT_AUTOPLAY_INTERVAL: Duration = Duration::from_millis(3000);

/// Category of a register-change entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Device raised a request.
    Request,
    /// CPU acknowledged.
    Response,
    /// Context pushed.
    Save,
    /// Vector table consulted.
    Lookup,
    /// Service routine entered.
    Execute,
    /// Context popped.
    Restore,
    /// Main program resumed.
    Return,
}

/// One entry of the register-change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterChange {
    /// Step (1-based) that produced the entry.
    pub step: usize,
    /// What changed.
    pub description: String,
    /// Category.
    pub kind: ChangeKind,
    /// Local wall-clock time, `HH:MM:SS`.
    pub timestamp: String,
}

/// The stepwise interrupt demo without any timers.
///
/// Purely synchronous; the auto-play driver lives in
/// [`InterruptDemo`](super::InterruptDemo).
#[derive(Debug, Clone)]
pub struct StepEngine {
    cursor: usize,
    snapshot: Snapshot,
    changes: BoundedLog<RegisterChange>,
    auto_playing: bool,
    auto_play_interval: Duration,
}

impl Default for StepEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StepEngine {
    /// Engine positioned on step 1 with the initial transition applied.
    #[must_use]
    pub fn new() -> Self {
        let mut engine = Self {
            cursor: 1,
            snapshot: Snapshot::default(),
            changes: BoundedLog::new(REGISTER_LOG_CAPACITY),
            auto_playing: false,
            auto_play_interval: DEFAULT_AUTOPLAY_INTERVAL,
        };
        engine.enter_step();
        engine
    }

    // === Derived values ===

    /// Current 1-based cursor.
    #[must_use]
    pub const fn current_step(&self) -> usize {
        self.cursor
    }

    /// Number of steps in the catalog.
    #[must_use]
    pub const fn total_steps(&self) -> usize {
        catalog::total_steps()
    }

    /// Catalog entry under the cursor.
    #[must_use]
    pub fn current_step_info(&self) -> &'static Step {
        catalog::step(self.cursor).unwrap_or(&STEPS[0])
    }

    /// `cursor / total × 100`.
    #[must_use]
    pub fn progress_percentage(&self) -> f64 {
        self.cursor as f64 / self.total_steps() as f64 * 100.0
    }

    /// Whether `next_step` would move.
    #[must_use]
    pub const fn can_go_next(&self) -> bool {
        self.cursor < self.total_steps()
    }

    /// Whether `previous_step` would move.
    #[must_use]
    pub const fn can_go_previous(&self) -> bool {
        self.cursor > 1
    }

    /// Hardware state for the current step.
    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Register-change history, oldest first.
    #[must_use]
    pub const fn register_changes(&self) -> &BoundedLog<RegisterChange> {
        &self.changes
    }

    /// Whether the auto-play driver is running.
    #[must_use]
    pub const fn is_auto_playing(&self) -> bool {
        self.auto_playing
    }

    /// Auto-play interval.
    #[must_use]
    pub const fn auto_play_interval(&self) -> Duration {
        self.auto_play_interval
    }

    pub(crate) fn set_auto_playing(&mut self, playing: bool) {
        self.auto_playing = playing;
    }

    pub(crate) fn set_auto_play_interval(&mut self, interval: Duration) {
        self.auto_play_interval = interval;
    }

    // === Navigation ===

    /// Advance one step. Returns `false` at the last step.
    pub fn next_step(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        self.move_to(self.cursor + 1);
        true
    }

    /// Go back one step. Returns `false` at the first step.
    pub fn previous_step(&mut self) -> bool {
        if !self.can_go_previous() {
            return false;
        }
        self.move_to(self.cursor - 1);
        true
    }

    /// Jump to 1-based `step`.
    ///
    /// Returns `false` (and changes nothing) when `step` is out of range or
    /// already current.
    pub fn go_to_step(&mut self, step: usize) -> bool {
        if !(1..=self.total_steps()).contains(&step) || step == self.cursor {
            return false;
        }
        self.move_to(step);
        true
    }

    /// Back to step 1 with a fresh transition and an empty history.
    pub fn reset_demo(&mut self) {
        self.auto_playing = false;
        self.move_to(1);
        self.changes.clear();
    }

    fn move_to(&mut self, step: usize) {
        self.cursor = step;
        self.enter_step();
    }

    // === Transition ===

    fn enter_step(&mut self) {
        self.snapshot.reset();

        let id = self.current_step_info().id;
        match id {
            StepId::Initial => self.setup_initial(),
            StepId::Request => self.setup_request(),
            StepId::Response => self.setup_response(),
            StepId::SaveContext => self.setup_save_context(),
            StepId::FindIsr => self.setup_find_isr(),
            StepId::ExecuteIsr => self.setup_execute_isr(),
            StepId::RestoreContext => self.setup_restore_context(),
            StepId::Return => self.setup_return(),
        }
        debug!(step = self.cursor, %id, "entered step");
    }

    fn log_change(&mut self, description: &str, kind: ChangeKind) {
        self.changes.push(RegisterChange {
            step: self.cursor,
            description: description.to_string(),
            kind,
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
        });
    }

    fn setup_initial(&mut self) {
        let snap = &mut self.snapshot;
        snap.cpu.mode = "Executing main program".to_string();
        snap.device.status = "Ready".to_string();
        snap.active.set(Component::Device, true);
    }

    fn setup_request(&mut self) {
        let snap = &mut self.snapshot;
        snap.device.requesting = true;
        snap.device.interrupt_signal = true;
        snap.device.status = "Raising interrupt request".to_string();
        snap.signals.request = true;
        snap.active.set(Component::Pic, true);
        snap.pic.irr = 1 << DEVICE_IRQ_LINE;

        self.log_change("I/O device raises IRQ", ChangeKind::Request);
    }

    fn setup_response(&mut self) {
        let snap = &mut self.snapshot;
        snap.signals.response = true;
        snap.cpu.mode = "Acknowledging interrupt".to_string();
        snap.pic.irr = 0;
        snap.pic.isr = 1 << DEVICE_IRQ_LINE;

        self.log_change("CPU acknowledges the interrupt with INTA", ChangeKind::Response);
    }

    fn setup_save_context(&mut self) {
        let snap = &mut self.snapshot;
        snap.active.set(Component::Stack, true);
        for register in Register::ALL {
            snap.highlights.set(register, true);
        }

        let cpu = snap.cpu.clone();
        snap.stack.push(format!("PSW: {}", hex16(cpu.status_word)));
        snap.stack.push(format!("PC: {}", hex16(cpu.program_counter)));
        snap.stack.push(format!("AX: {}", hex16(cpu.ax)));
        snap.stack.push(format!("BX: {}", hex16(cpu.bx)));
        snap.cpu.mode = "Saving context".to_string();
        snap.pic.isr = 1 << DEVICE_IRQ_LINE;

        self.log_change("Registers pushed onto the stack", ChangeKind::Save);
    }

    fn setup_find_isr(&mut self) {
        let snap = &mut self.snapshot;
        snap.active.set(Component::Ivt, true);
        if let Some(index) = snap.vector_index(DEVICE_VECTOR) {
            snap.vectors[index].highlight = true;
        }
        snap.cpu.mode = "Looking up interrupt vector".to_string();
        snap.pic.isr = 1 << DEVICE_IRQ_LINE;

        self.log_change("Vector table lookup yields the ISR address", ChangeKind::Lookup);
    }

    fn setup_execute_isr(&mut self) {
        let snap = &mut self.snapshot;
        snap.active.set(Component::Isr, true);
        mark_current(&mut snap.isr_program, 0);
        if let Some(entry) = snap.isr_program.first() {
            snap.cpu.program_counter = entry.address;
        }
        snap.cpu.mode = "Executing interrupt service routine".to_string();
        snap.pic.isr = 1 << DEVICE_IRQ_LINE;

        self.log_change("PC jumps to the ISR entry address", ChangeKind::Execute);
    }

    fn setup_restore_context(&mut self) {
        let snap = &mut self.snapshot;
        snap.active.set(Component::Stack, true);

        let last = snap.isr_program.len().saturating_sub(1);
        for instr in snap.isr_program.iter_mut().take(last) {
            instr.executed = true;
        }
        mark_current(&mut snap.isr_program, last);
        if let Some(iret) = snap.iret_address() {
            snap.cpu.program_counter = iret;
        }

        for entry in snap.stack.entries_mut() {
            entry.highlight = true;
            entry.is_new = false;
        }
        snap.cpu.mode = "Restoring context".to_string();
        snap.pic.isr = 1 << DEVICE_IRQ_LINE;

        self.log_change("Registers restored from the stack", ChangeKind::Restore);
    }

    fn setup_return(&mut self) {
        let snap = &mut self.snapshot;
        if let Some(next) = snap.main_program.get(1) {
            snap.cpu.program_counter = next.address;
        }
        if let Some(first) = snap.main_program.first_mut() {
            first.executed = true;
        }
        mark_current(&mut snap.main_program, 1);
        snap.cpu.mode = "Resuming main program".to_string();
        snap.stack.clear();

        self.log_change("PC restored, main program resumes", ChangeKind::Return);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::demos::interrupt::snapshot::{current_count, current_index, STACK_TOP};
    use proptest::prelude::*;

    #[test]
    fn test_starts_on_initial_step() {
        let engine = StepEngine::new();
        assert_eq!(engine.current_step(), 1);
        assert_eq!(engine.current_step_info().id, StepId::Initial);
        assert!(engine.snapshot().active.device);
        assert!(engine.register_changes().is_empty());
        assert!(!engine.can_go_previous());
        assert!(engine.can_go_next());
    }

    #[test]
    fn test_progress_percentage() {
        let mut engine = StepEngine::new();
        assert!((engine.progress_percentage() - 12.5).abs() < 1e-9);
        engine.go_to_step(8);
        assert!((engine.progress_percentage() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_boundaries_are_no_ops() {
        let mut engine = StepEngine::new();
        assert!(!engine.previous_step());
        assert_eq!(engine.current_step(), 1);

        engine.go_to_step(8);
        assert!(!engine.next_step());
        assert_eq!(engine.current_step(), 8);
        assert!(!engine.can_go_next());
    }

    #[test]
    fn test_go_to_same_step_does_not_rerun_transition() {
        let mut engine = StepEngine::new();
        engine.go_to_step(2);
        assert_eq!(engine.register_changes().len(), 1);
        assert!(!engine.go_to_step(2));
        assert_eq!(engine.register_changes().len(), 1);
    }

    #[test]
    fn test_request_step() {
        let mut engine = StepEngine::new();
        engine.go_to_step(2);
        let snap = engine.snapshot();
        assert!(snap.device.requesting);
        assert!(snap.device.interrupt_signal);
        assert!(snap.signals.request);
        assert!(snap.active.pic);
        assert_eq!(snap.pic.irr_bits(), "00000010");
        assert_eq!(engine.register_changes().last().map(|c| c.kind), Some(ChangeKind::Request));
    }

    #[test]
    fn test_response_step_moves_request_in_service() {
        let mut engine = StepEngine::new();
        engine.go_to_step(3);
        let snap = engine.snapshot();
        assert!(snap.signals.response);
        assert_eq!(snap.pic.irr, 0);
        assert_eq!(snap.pic.isr_bits(), "00000010");
    }

    #[test]
    fn test_save_context_step() {
        let mut engine = StepEngine::new();
        engine.go_to_step(4);
        let snap = engine.snapshot();
        assert_eq!(snap.stack.len(), 4);
        assert!(snap.stack.entries().iter().all(|e| e.is_new && e.highlight));
        assert_eq!(snap.stack.entries()[0].value, "PSW: 0x0200");
        assert_eq!(snap.stack.entries()[1].value, "PC: 0x1000");
        assert_eq!(snap.stack.pointer(), 0xFFFB);
        assert_eq!(snap.highlights.count(), 4);
        assert!(snap.active.stack);
    }

    #[test]
    fn test_find_isr_highlights_device_vector() {
        let mut engine = StepEngine::new();
        engine.go_to_step(5);
        let snap = engine.snapshot();
        let lit: Vec<usize> = snap
            .vectors
            .iter()
            .enumerate()
            .filter(|(_, v)| v.highlight)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(lit, vec![4]);
        assert!(snap.active.ivt);
    }

    #[test]
    fn test_execute_isr_step() {
        let mut engine = StepEngine::new();
        engine.go_to_step(6);
        let snap = engine.snapshot();
        assert_eq!(current_index(&snap.isr_program), Some(0));
        assert_eq!(snap.cpu.program_counter, 0x2000);
        assert!(snap.active.isr);
    }

    #[test]
    fn test_restore_context_step() {
        let mut engine = StepEngine::new();
        engine.go_to_step(7);
        let snap = engine.snapshot();
        assert_eq!(current_index(&snap.isr_program), Some(6));
        assert_eq!(snap.stack.pointer(), STACK_TOP);
        assert!(snap.stack.entries().iter().all(|e| !e.is_new));
        assert_eq!(snap.cpu.program_counter, 0x2009);
    }

    #[test]
    fn test_return_step() {
        let mut engine = StepEngine::new();
        engine.go_to_step(8);
        let snap = engine.snapshot();
        assert!(snap.stack.is_empty());
        assert_eq!(snap.cpu.program_counter, 0x1003);
        assert!(snap.main_program[0].executed);
        assert!(!snap.main_program[0].current);
        assert!(snap.main_program[1].current);
        assert_eq!(current_count(&snap.main_program), 1);
    }

    #[test]
    fn test_going_back_repaints_step() {
        let mut engine = StepEngine::new();
        engine.go_to_step(8);
        engine.go_to_step(1);
        let mut fresh = StepEngine::new();
        fresh.go_to_step(1);
        assert_eq!(engine.snapshot(), fresh.snapshot());
        assert_eq!(engine.snapshot().cpu.program_counter, 0x1000);
    }

    #[test]
    fn test_reset_demo() {
        let mut engine = StepEngine::new();
        for _ in 0..5 {
            engine.next_step();
        }
        engine.set_auto_playing(true);
        engine.reset_demo();
        assert_eq!(engine.current_step(), 1);
        assert!(engine.register_changes().is_empty());
        assert!(!engine.is_auto_playing());
        assert_eq!(engine.snapshot(), StepEngine::new().snapshot());
    }

    #[test]
    fn test_log_keeps_last_ten_in_order() {
        let mut engine = StepEngine::new();
        let mut expected = Vec::new();
        // 15 transitions, none onto step 1 (which writes no entry)
        for i in 0..15 {
            let target = 2 + (i % 7);
            if engine.current_step() == target {
                engine.go_to_step(if target == 8 { 7 } else { target + 1 });
            } else {
                engine.go_to_step(target);
            }
            expected.push(engine.current_step());
        }
        let steps: Vec<usize> = engine.register_changes().iter().map(|c| c.step).collect();
        assert_eq!(engine.register_changes().len(), REGISTER_LOG_CAPACITY);
        assert_eq!(steps, expected[expected.len() - 10..].to_vec());
    }

    proptest! {
        /// Out-of-range jumps never move the cursor.
        #[test]
        fn prop_out_of_range_is_ignored(start in 1usize..=8, target in 9usize..10_000) {
            let mut engine = StepEngine::new();
            engine.go_to_step(start);
            let before = engine.snapshot().clone();
            prop_assert!(!engine.go_to_step(target));
            prop_assert!(!engine.go_to_step(0));
            prop_assert_eq!(engine.current_step(), start);
            prop_assert_eq!(engine.snapshot(), &before);
        }

        /// Any step leaves at most one current instruction per listing.
        #[test]
        fn prop_at_most_one_current(path in proptest::collection::vec(1usize..=8, 1..40)) {
            let mut engine = StepEngine::new();
            for step in path {
                engine.go_to_step(step);
                let snap = engine.snapshot();
                prop_assert!(current_count(&snap.main_program) <= 1);
                prop_assert!(current_count(&snap.isr_program) <= 1);
                prop_assert!(engine.register_changes().len() <= REGISTER_LOG_CAPACITY);
            }
        }

        /// The snapshot only depends on the step, not on how it was reached.
        #[test]
        fn prop_snapshot_is_function_of_step(
            path in proptest::collection::vec(1usize..=8, 0..20),
            target in 1usize..=8,
        ) {
            let mut wandering = StepEngine::new();
            for step in path {
                wandering.go_to_step(step);
            }
            wandering.go_to_step(target);

            let mut direct = StepEngine::new();
            direct.go_to_step(target);
            prop_assert_eq!(wandering.snapshot(), direct.snapshot());
        }
    }
}
