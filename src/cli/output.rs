//! CLI output formatting.
//!
//! Renderers return strings so they can be tested; the `print_*` wrappers
//! write them to stdout.

use std::fmt::Write as _;

use crate::demos::interrupt::snapshot::{hex16, Instruction};
use crate::demos::interrupt::StepEngine;
use crate::demos::io_sim::{IoSimState, Severity, MODE_TABLE};

/// Print version information.
pub fn print_version() {
    let hash = env!("IRQLAB_GIT_HASH");
    if hash.is_empty() {
        println!("irqlab {}", env!("IRQLAB_VERSION"));
    } else {
        println!("irqlab {} ({hash})", env!("IRQLAB_VERSION"));
    }
}

/// Print help message.
pub fn print_help() {
    println!(
        r"irqlab - Interrupt handling and I/O transfer teaching simulator

USAGE:
    irqlab <COMMAND> [OPTIONS]

COMMANDS:
    interrupt                   Walk through the eight interrupt-handling steps
        --config <file.yaml>    Load settings from a YAML file
        --autoplay              Advance on the auto-play timer

    io <polling|interrupt|dma>  Run one I/O transfer simulation
        --speed <X>             Delay multiplier (> 0, default 1)
        --config <file.yaml>    Load settings from a YAML file

    modes                       Show the I/O mode table

    help                        Show this help message
    version                     Show version information

EXAMPLES:
    irqlab interrupt
    irqlab interrupt --autoplay --config lab.yaml
    irqlab io dma --speed 4

Set RUST_LOG=irqlab=debug for engine diagnostics.
"
    );
}

fn render_listing(out: &mut String, title: &str, program: &[Instruction]) {
    let _ = writeln!(out, "  {title}:");
    for instr in program {
        let marker = if instr.current {
            "->"
        } else if instr.executed {
            " ✓"
        } else {
            "  "
        };
        let _ = writeln!(out, "    {marker} {} {}", hex16(instr.address), instr.text);
    }
}

/// Render the current step of the interrupt walkthrough.
#[must_use]
pub fn render_step(engine: &StepEngine) -> String {
    let step = engine.current_step_info();
    let snap = engine.snapshot();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "━━ Step {}/{} ({:.0}%): {} ━━",
        engine.current_step(),
        engine.total_steps(),
        engine.progress_percentage(),
        step.title
    );
    let _ = writeln!(out, "{}", step.description);
    for line in step.details {
        let _ = writeln!(out, "  • {line}");
    }
    let _ = writeln!(out);

    let cpu = &snap.cpu;
    let _ = writeln!(
        out,
        "  CPU [{}]  PC={} PSW={} AX={} BX={}",
        cpu.mode,
        hex16(cpu.program_counter),
        hex16(cpu.status_word),
        hex16(cpu.ax),
        hex16(cpu.bx)
    );
    let _ = writeln!(
        out,
        "  PIC  IRR={} ISR={} IMR={}",
        snap.pic.irr_bits(),
        snap.pic.isr_bits(),
        snap.pic.imr_bits()
    );
    let _ = writeln!(
        out,
        "  Device [{}] data={}{}",
        snap.device.status,
        snap.device.data,
        if snap.device.requesting { " (IRQ)" } else { "" }
    );

    let _ = writeln!(out, "  Stack SP={}", hex16(snap.stack.pointer()));
    for entry in snap.stack.entries().iter().rev() {
        let tag = if entry.is_new { " (new)" } else { "" };
        let _ = writeln!(out, "    | {}{tag}", entry.value);
    }

    if let Some(vector) = snap.vectors.iter().find(|v| v.highlight) {
        let _ = writeln!(
            out,
            "  IVT  vector 0x{:02X} -> {}",
            vector.number,
            hex16(vector.address)
        );
    }
    render_listing(&mut out, "Main program", &snap.main_program);
    render_listing(&mut out, "ISR", &snap.isr_program);
    out
}

/// Print the current step of the interrupt walkthrough.
pub fn print_step(engine: &StepEngine) {
    println!("{}", render_step(engine));
}

/// Render the register-change history.
#[must_use]
pub fn render_register_log(engine: &StepEngine) -> String {
    let mut out = String::from("Register changes:\n");
    for change in engine.register_changes() {
        let _ = writeln!(
            out,
            "  [{}] step {} {:?}: {}",
            change.timestamp, change.step, change.kind, change.description
        );
    }
    out
}

/// Print the register-change history.
pub fn print_register_log(engine: &StepEngine) {
    println!("{}", render_register_log(engine));
}

/// Render the mode table.
#[must_use]
pub fn render_mode_table() -> String {
    let mut out = format!(
        "{:<10} {:<16} {:>10} {:>6} {:>10}\n",
        "KEY", "NAME", "EFFICIENCY", "CPU", "RESPONSE"
    );
    for row in &MODE_TABLE {
        let _ = writeln!(
            out,
            "{:<10} {:<16} {:>9}% {:>5}% {:>8}ms",
            row.mode,
            row.name,
            row.efficiency,
            row.cpu_usage,
            row.response.millis()
        );
        let _ = writeln!(out, "           {}", row.description);
    }
    out
}

/// Print the mode table.
pub fn print_mode_table() {
    print!("{}", render_mode_table());
}

/// Render the outcome of an I/O simulation run.
#[must_use]
pub fn render_io_report(state: &IoSimState) -> String {
    let mut out = String::new();
    let config = state.mode.config();
    let _ = writeln!(out, "━━ {} (speed {}) ━━", config.name, state.speed);

    for entry in &state.logs {
        let symbol = match entry.severity {
            Severity::Info => "·",
            Severity::Success => "✓",
            Severity::Warning => "!",
            Severity::Error => "✗",
        };
        let _ = writeln!(out, "  {} [{}] {}", symbol, entry.timestamp, entry.message);
    }

    let _ = writeln!(out, "\nMemory:");
    for (i, slot) in state.memory.iter().enumerate() {
        if slot.active {
            let _ = writeln!(out, "  [{i}] {}", slot.data);
        }
    }
    let _ = writeln!(
        out,
        "DMA: {} -> {}, remaining count {}",
        hex16(state.dma.source_addr),
        hex16(state.dma.target_addr),
        state.dma.count
    );

    let m = &state.metrics;
    let _ = writeln!(
        out,
        "Metrics: efficiency {}%, response {}ms, throughput {}, CPU {}%",
        m.transfer_efficiency, m.response_time_ms, m.throughput, state.cpu_utilization
    );
    out
}

/// Print the outcome of an I/O simulation run.
pub fn print_io_report(state: &IoSimState) {
    print!("{}", render_io_report(state));
}
