//! CLI command handlers.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use crate::config::LabConfig;
use crate::demos::interrupt::{InterruptDemo, StepEngine};
use crate::demos::io_sim::{IoMode, IoSimulator, Severity};
use crate::engine::effects::EffectController;
use crate::error::{LabError, LabResult};
use crate::logging::init_tracing;

use super::output::{
    print_help, print_io_report, print_mode_table, print_register_log, print_step, print_version,
};
use super::{Args, Command};

/// Main CLI entry point.
///
/// Dispatches to the appropriate command handler based on parsed arguments.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    let result = match args.command {
        Command::Interrupt {
            config_path,
            autoplay,
        } => run_interrupt(config_path.as_deref(), autoplay),
        Command::Io {
            mode,
            speed,
            config_path,
        } => run_io(mode, speed, config_path.as_deref()),
        Command::Modes => {
            print_mode_table();
            Ok(ExitCode::SUCCESS)
        }
        Command::Help => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        Command::Version => {
            print_version();
            Ok(ExitCode::SUCCESS)
        }
    };

    result.unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        ExitCode::from(1)
    })
}

/// Load `path` if given, otherwise the defaults, and install tracing.
///
/// # Errors
///
/// Returns error if the file cannot be read or fails validation.
pub fn load_config(path: Option<&Path>) -> LabResult<LabConfig> {
    let config = match path {
        Some(path) => LabConfig::load(path)?,
        None => LabConfig::default(),
    };
    init_tracing(&config.logging.filter)?;
    Ok(config)
}

fn runtime() -> LabResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| LabError::Runtime(format!("cannot start Tokio runtime: {e}")))
}

/// Walk the interrupt-handling steps.
///
/// Without `autoplay` the steps are printed back to back; with it, the demo's
/// auto-play timer drives the cursor at the configured interval.
///
/// # Errors
///
/// Returns error if the configuration is invalid or the runtime cannot start.
pub fn run_interrupt(config_path: Option<&Path>, autoplay: bool) -> LabResult<ExitCode> {
    let config = load_config(config_path)?;

    if !autoplay {
        let mut engine = StepEngine::new();
        print_step(&engine);
        while engine.next_step() {
            print_step(&engine);
        }
        print_register_log(&engine);
        return Ok(ExitCode::SUCCESS);
    }

    let rt = runtime()?;
    rt.block_on(async {
        let mut demo = InterruptDemo::from_config(&config.interrupt, EffectController::new());
        demo.read(print_step);
        demo.start_auto_play()?;

        let poll = Duration::from_millis(50);
        let mut shown = demo.current_step();
        while demo.is_auto_playing() || demo.current_step() != shown {
            tokio::time::sleep(poll).await;
            let current = demo.current_step();
            if current != shown {
                demo.read(print_step);
                shown = current;
            }
        }
        demo.read(print_register_log);
        demo.dispose();
        Ok::<_, LabError>(ExitCode::SUCCESS)
    })
}

/// Run one I/O simulation and print its log and metrics.
///
/// Exits with status 1 if the run ended in an error entry.
///
/// # Errors
///
/// Returns error if the configuration or speed is invalid, or the runtime
/// cannot start.
pub fn run_io(mode: IoMode, speed: Option<f64>, config_path: Option<&Path>) -> LabResult<ExitCode> {
    let mut config = load_config(config_path)?;
    config.io.mode = mode;

    let rt = runtime()?;
    rt.block_on(async {
        let sim = IoSimulator::from_config(&config.io, EffectController::new())?;
        if let Some(speed) = speed {
            sim.set_simulation_speed(speed)?;
        }
        sim.start_simulation().await;

        let state = sim.snapshot();
        print_io_report(&state);

        let failed = state
            .logs
            .last()
            .is_some_and(|entry| entry.severity == Severity::Error);
        Ok::<_, LabError>(if failed {
            ExitCode::from(1)
        } else {
            ExitCode::SUCCESS
        })
    })
}
