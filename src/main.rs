//! irqlab CLI - interrupt handling and I/O transfer teaching simulator.

use std::process::ExitCode;

use irqlab::cli::{run_cli, Args};

fn main() -> ExitCode {
    run_cli(Args::parse())
}
