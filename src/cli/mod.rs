//! CLI module for irqlab.
//!
//! All CLI logic lives here rather than in main.rs so it can be tested.
//! The entry point `run_cli` is called from main.rs with parsed arguments.

mod args;
mod commands;
mod output;

pub use args::{Args, Command};
pub use commands::{load_config, run_cli, run_interrupt, run_io};
pub use output::{
    print_help, print_io_report, print_mode_table, print_register_log, print_step, print_version,
    render_io_report, render_mode_table, render_register_log, render_step,
};

#[cfg(test)]
mod tests;
