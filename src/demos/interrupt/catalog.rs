//! The fixed catalog of interrupt-handling steps.

use serde::{Deserialize, Serialize};

/// Identifier of a catalog step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    /// CPU runs the main program, device about to raise a request.
    Initial,
    /// Device raises IRQ; controller latches it.
    Request,
    /// CPU acknowledges (INTA) and receives the vector number.
    Response,
    /// PSW, PC and general registers are pushed.
    SaveContext,
    /// Vector number indexes the interrupt vector table.
    FindIsr,
    /// PC jumps to the service routine.
    ExecuteIsr,
    /// IRET pops the saved registers.
    RestoreContext,
    /// Main program resumes at the next instruction.
    Return,
}

impl StepId {
    /// Stable string identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Request => "request",
            Self::Response => "response",
            Self::SaveContext => "save_context",
            Self::FindIsr => "find_isr",
            Self::ExecuteIsr => "execute_isr",
            Self::RestoreContext => "restore_context",
            Self::Return => "return",
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the step catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Unique identifier.
    pub id: StepId,
    /// Short title.
    pub title: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Ordered explanation lines.
    pub details: &'static [&'static str],
}

/// Number of catalog steps.
pub const STEP_COUNT: usize = 8;

/// The eight steps, in teaching order.
pub static STEPS: [Step; STEP_COUNT] = [
    Step {
        id: StepId::Initial,
        title: "Initial State",
        description: "The CPU is executing the main program; an I/O device is about to request an interrupt",
        details: &[
            "The CPU is executing the instruction at address 0x1000",
            "The program counter PC points at the current instruction",
            "The status word PSW holds the current CPU state",
            "The I/O device has data ready and is about to raise an interrupt request",
        ],
    },
    Step {
        id: StepId::Request,
        title: "Interrupt Request (IRQ)",
        description: "The I/O device signals an interrupt request to the CPU",
        details: &[
            "The device drives its IRQ line into the interrupt controller",
            "The controller latches the request in its IRR register",
            "If the line is not masked, the controller raises INTR to the CPU",
            "The CPU checks for pending interrupts after the current instruction",
        ],
    },
    Step {
        id: StepId::Response,
        title: "Interrupt Response",
        description: "The CPU accepts the request and prepares to handle it",
        details: &[
            "The CPU finishes executing the current instruction",
            "The CPU checks the interrupt-enable flag and accepts the interrupt",
            "The CPU sends an acknowledge (INTA) to the interrupt controller",
            "The controller answers with the interrupt type number",
        ],
    },
    Step {
        id: StepId::SaveContext,
        title: "Context Save",
        description: "The CPU saves the interrupted program's context on the stack",
        details: &[
            "The flags register PSW is pushed first",
            "Then the program counter PC is pushed",
            "Other live registers (AX, BX, ...) are pushed",
            "The stack pointer SP moves to the new top of stack",
        ],
    },
    Step {
        id: StepId::FindIsr,
        title: "Locate Service Routine",
        description: "The CPU uses the type number to look up the interrupt vector table",
        details: &[
            "The interrupt type number indexes the vector table",
            "The entry holds the service routine's entry address",
            "The vector table lives at a fixed location in memory",
            "Each interrupt type maps to exactly one service routine",
        ],
    },
    Step {
        id: StepId::ExecuteIsr,
        title: "Execute Service Routine",
        description: "The CPU jumps to the interrupt service routine and runs it",
        details: &[
            "PC is loaded with the service routine's entry address",
            "The service routine's instructions start executing",
            "The routine services the device's data transfer",
            "Device-specific handling is performed",
        ],
    },
    Step {
        id: StepId::RestoreContext,
        title: "Context Restore",
        description: "The service routine is done; the interrupted program's context is restored",
        details: &[
            "The service routine executes IRET",
            "Saved register values are popped off the stack",
            "General registers (BX, AX, ...) are restored first",
            "Then PC and the status word PSW are restored",
        ],
    },
    Step {
        id: StepId::Return,
        title: "Interrupt Return",
        description: "The CPU resumes the interrupted main program",
        details: &[
            "PC holds the address of the instruction after the interrupted one",
            "The CPU state is exactly what it was before the interrupt",
            "The main program continues executing",
            "Interrupt handling is complete",
        ],
    },
];

/// Number of catalog steps.
#[must_use]
pub const fn total_steps() -> usize {
    STEP_COUNT
}

/// Step at 1-based `index`, if in range.
#[must_use]
pub fn step(index: usize) -> Option<&'static Step> {
    index.checked_sub(1).and_then(|i| STEPS.get(i))
}
