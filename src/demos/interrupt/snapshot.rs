//! Simulated hardware state shown for one interrupt-handling step.
//!
//! A [`Snapshot`] is rebuilt from [`Snapshot::default`] on every step
//! transition, so it depends only on which step is being shown.

use serde::{Deserialize, Serialize};

/// Stack pointer value of the empty stack.
pub const STACK_TOP: u16 = 0xFFFF;

/// IRQ line used by the demo device (bit 1 of the controller registers).
pub const DEVICE_IRQ_LINE: u8 = 1;

/// Interrupt type number the device's vector is stored under.
pub const DEVICE_VECTOR: u8 = 0x21;

const MAIN_PROGRAM: [(u16, &str); 4] = [
    (0x1000, "MOV AX, 1234h"),
    (0x1003, "ADD BX, AX"),
    (0x1005, "MOV [SI], BX"),
    (0x1008, "INC SI"),
];

const ISR_PROGRAM: [(u16, &str); 7] = [
    (0x2000, "PUSH AX"),
    (0x2001, "PUSH BX"),
    (0x2002, "IN AL, 60h"),
    (0x2004, "MOV [BUFFER], AL"),
    (0x2007, "POP BX"),
    (0x2008, "POP AX"),
    (0x2009, "IRET"),
];

const VECTOR_TABLE: [(u8, u16); 5] = [
    (0x00, 0x0000),
    (0x01, 0x0004),
    (0x02, 0x0008),
    (0x03, 0x000C),
    (DEVICE_VECTOR, 0x2000),
];

/// Format a 16-bit value the way the demo labels addresses (`0x1000`).
#[must_use]
pub fn hex16(value: u16) -> String {
    format!("0x{value:04X}")
}

/// Format an 8-bit controller register as a bit string (`00000010`).
#[must_use]
pub fn bits8(value: u8) -> String {
    format!("{value:08b}")
}

/// CPU registers and the mode label shown next to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    /// What the CPU is doing right now.
    pub mode: String,
    /// Program counter.
    pub program_counter: u16,
    /// Program status word.
    pub status_word: u16,
    /// General register AX.
    pub ax: u16,
    /// General register BX.
    pub bx: u16,
}

impl Default for CpuState {
    fn default() -> Self {
        Self {
            mode: "Executing main program".to_string(),
            program_counter: 0x1000,
            status_word: 0x0200,
            ax: 0x1234,
            bx: 0x5678,
        }
    }
}

/// Registers that can be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Register {
    /// Program counter.
    Pc,
    /// Program status word.
    Psw,
    /// General register AX.
    Ax,
    /// General register BX.
    Bx,
}

impl Register {
    /// All registers in display order.
    pub const ALL: [Self; 4] = [Self::Pc, Self::Psw, Self::Ax, Self::Bx];
}

/// Highlight flag per register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterHighlights {
    /// PC highlighted.
    pub pc: bool,
    /// PSW highlighted.
    pub psw: bool,
    /// AX highlighted.
    pub ax: bool,
    /// BX highlighted.
    pub bx: bool,
}

impl RegisterHighlights {
    /// Flag for `register`.
    #[must_use]
    pub const fn get(&self, register: Register) -> bool {
        match register {
            Register::Pc => self.pc,
            Register::Psw => self.psw,
            Register::Ax => self.ax,
            Register::Bx => self.bx,
        }
    }

    /// Set the flag for `register`.
    pub fn set(&mut self, register: Register, on: bool) {
        match register {
            Register::Pc => self.pc = on,
            Register::Psw => self.psw = on,
            Register::Ax => self.ax = on,
            Register::Bx => self.bx = on,
        }
    }

    /// Number of highlighted registers.
    #[must_use]
    pub fn count(&self) -> usize {
        Register::ALL.iter().filter(|r| self.get(**r)).count()
    }
}

/// Hardware blocks drawn in the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// The processor.
    Cpu,
    /// Interrupt vector table.
    Ivt,
    /// The stack.
    Stack,
    /// Interrupt service routine listing.
    Isr,
    /// The I/O device.
    Device,
    /// Programmable interrupt controller.
    Pic,
}

impl Component {
    /// All components in display order.
    pub const ALL: [Self; 6] = [
        Self::Cpu,
        Self::Ivt,
        Self::Stack,
        Self::Isr,
        Self::Device,
        Self::Pic,
    ];
}

/// "Active" flag per component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentFlags {
    /// CPU active.
    pub cpu: bool,
    /// Vector table active.
    pub ivt: bool,
    /// Stack active.
    pub stack: bool,
    /// ISR listing active.
    pub isr: bool,
    /// Device active.
    pub device: bool,
    /// Interrupt controller active.
    pub pic: bool,
}

impl Default for ComponentFlags {
    fn default() -> Self {
        Self {
            cpu: true,
            ivt: false,
            stack: false,
            isr: false,
            device: false,
            pic: false,
        }
    }
}

impl ComponentFlags {
    /// Flag for `component`.
    #[must_use]
    pub const fn get(&self, component: Component) -> bool {
        match component {
            Component::Cpu => self.cpu,
            Component::Ivt => self.ivt,
            Component::Stack => self.stack,
            Component::Isr => self.isr,
            Component::Device => self.device,
            Component::Pic => self.pic,
        }
    }

    /// Set the flag for `component`.
    pub fn set(&mut self, component: Component, on: bool) {
        match component {
            Component::Cpu => self.cpu = on,
            Component::Ivt => self.ivt = on,
            Component::Stack => self.stack = on,
            Component::Isr => self.isr = on,
            Component::Device => self.device = on,
            Component::Pic => self.pic = on,
        }
    }
}

/// The requesting I/O device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Status label.
    pub status: String,
    /// Payload waiting to be read.
    pub data: String,
    /// Device is asserting its request.
    pub requesting: bool,
    /// Interrupt line is raised.
    pub interrupt_signal: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            data: "Data_001".to_string(),
            requesting: false,
            interrupt_signal: false,
        }
    }
}

/// Interrupt controller registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicState {
    /// Interrupt request register.
    pub irr: u8,
    /// In-service register.
    pub isr: u8,
    /// Interrupt mask register (1 = masked).
    pub imr: u8,
}

impl Default for PicState {
    fn default() -> Self {
        Self {
            irr: 0,
            isr: 0,
            imr: 0b1111_1110,
        }
    }
}

impl PicState {
    /// IRR as a bit string.
    #[must_use]
    pub fn irr_bits(&self) -> String {
        bits8(self.irr)
    }

    /// ISR as a bit string.
    #[must_use]
    pub fn isr_bits(&self) -> String {
        bits8(self.isr)
    }

    /// IMR as a bit string.
    #[must_use]
    pub fn imr_bits(&self) -> String {
        bits8(self.imr)
    }
}

/// Which signal arrows are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFlow {
    /// Device → controller → CPU request.
    pub request: bool,
    /// CPU → controller acknowledge.
    pub response: bool,
}

/// One pushed stack word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEntry {
    /// Label such as `PSW: 0x0200`.
    pub value: String,
    /// Drawn highlighted.
    pub highlight: bool,
    /// Pushed during the current step.
    pub is_new: bool,
}

/// The stack. The pointer is derived from the entry count, one word per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    entries: Vec<StackEntry>,
}

impl Stack {
    /// Push a freshly saved, highlighted word.
    pub fn push(&mut self, value: impl Into<String>) {
        self.entries.push(StackEntry {
            value: value.into(),
            highlight: true,
            is_new: true,
        });
    }

    /// Pop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries from bottom to top.
    #[must_use]
    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }

    /// Mutable entries (bottom to top).
    pub fn entries_mut(&mut self) -> &mut [StackEntry] {
        &mut self.entries
    }

    /// Number of words on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stack pointer: [`STACK_TOP`] minus one per entry.
    #[must_use]
    pub fn pointer(&self) -> u16 {
        let depth = u16::try_from(self.entries.len()).unwrap_or(u16::MAX);
        STACK_TOP.saturating_sub(depth)
    }
}

/// One row of the interrupt vector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptVector {
    /// Interrupt type number.
    pub number: u8,
    /// Service routine entry address.
    pub address: u16,
    /// Drawn highlighted.
    pub highlight: bool,
}

/// One line of a program listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Address of the instruction.
    pub address: u16,
    /// Assembly text.
    pub text: String,
    /// Instruction about to execute.
    pub current: bool,
    /// Instruction already executed.
    pub executed: bool,
}

fn listing(lines: &[(u16, &str)]) -> Vec<Instruction> {
    lines
        .iter()
        .map(|&(address, text)| Instruction {
            address,
            text: text.to_string(),
            current: false,
            executed: false,
        })
        .collect()
}

/// Number of instructions flagged current.
#[must_use]
pub fn current_count(program: &[Instruction]) -> usize {
    program.iter().filter(|i| i.current).count()
}

/// Index of the current instruction, if any.
#[must_use]
pub fn current_index(program: &[Instruction]) -> Option<usize> {
    program.iter().position(|i| i.current)
}

/// Make `index` the single current instruction of `program`.
pub fn mark_current(program: &mut [Instruction], index: usize) {
    for (i, instr) in program.iter_mut().enumerate() {
        instr.current = i == index;
    }
}

/// Full demo state for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// CPU registers and mode.
    pub cpu: CpuState,
    /// Register highlight flags.
    pub highlights: RegisterHighlights,
    /// Component activity flags.
    pub active: ComponentFlags,
    /// I/O device.
    pub device: DeviceState,
    /// Interrupt controller.
    pub pic: PicState,
    /// Signal arrows.
    pub signals: SignalFlow,
    /// The stack.
    pub stack: Stack,
    /// Interrupt vector table (fixed five rows).
    pub vectors: [InterruptVector; 5],
    /// Main program listing.
    pub main_program: Vec<Instruction>,
    /// Interrupt service routine listing.
    pub isr_program: Vec<Instruction>,
}

impl Default for Snapshot {
    fn default() -> Self {
        let mut main_program = listing(&MAIN_PROGRAM);
        mark_current(&mut main_program, 0);
        Self {
            cpu: CpuState::default(),
            highlights: RegisterHighlights::default(),
            active: ComponentFlags::default(),
            device: DeviceState::default(),
            pic: PicState::default(),
            signals: SignalFlow::default(),
            stack: Stack::default(),
            vectors: VECTOR_TABLE.map(|(number, address)| InterruptVector {
                number,
                address,
                highlight: false,
            }),
            main_program,
            isr_program: listing(&ISR_PROGRAM),
        }
    }
}

impl Snapshot {
    /// Return to the canonical initial state: every flag, highlight,
    /// instruction mark and stack word cleared, and the first main-program
    /// instruction current.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Index of the vector table row for `number`.
    #[must_use]
    pub fn vector_index(&self, number: u8) -> Option<usize> {
        self.vectors.iter().position(|v| v.number == number)
    }

    /// Address of the IRET that ends the service routine.
    #[must_use]
    pub fn iret_address(&self) -> Option<u16> {
        self.isr_program
            .iter()
            .rev()
            .find(|i| i.text == "IRET")
            .map(|i| i.address)
    }
}
