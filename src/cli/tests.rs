//! CLI module tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::args::{Args, Command};
use super::commands::{load_config, run_cli};
use super::output::{render_io_report, render_mode_table, render_register_log, render_step};
use crate::demos::interrupt::StepEngine;
use crate::demos::io_sim::{IoMode, IoSimState, Severity};
use crate::error::LabError;
use std::path::PathBuf;
use std::process::ExitCode;

// ============================================================================
// Args parsing tests
// ============================================================================

#[test]
fn test_parse_no_args_shows_help() {
    let args = Args::parse_from(["irqlab"]);
    assert_eq!(args.command, Command::Help);
}

#[test]
fn test_parse_help_variants() {
    for flag in ["-h", "--help", "help"] {
        assert_eq!(Args::parse_from(["irqlab", flag]).command, Command::Help);
    }
}

#[test]
fn test_parse_version_variants() {
    for flag in ["-V", "--version", "version"] {
        assert_eq!(Args::parse_from(["irqlab", flag]).command, Command::Version);
    }
}

#[test]
fn test_parse_unknown_command() {
    let args = Args::parse_from(["irqlab", "unknown-cmd"]);
    assert_eq!(args.command, Command::Help);
}

#[test]
fn test_parse_modes() {
    assert_eq!(Args::parse_from(["irqlab", "modes"]).command, Command::Modes);
}

#[test]
fn test_parse_interrupt_defaults() {
    let args = Args::parse_from(["irqlab", "interrupt"]);
    assert_eq!(
        args.command,
        Command::Interrupt {
            config_path: None,
            autoplay: false,
        }
    );
}

#[test]
fn test_parse_interrupt_with_options() {
    let args = Args::parse_from(["irqlab", "interrupt", "--autoplay", "--config", "lab.yaml"]);
    assert_eq!(
        args.command,
        Command::Interrupt {
            config_path: Some(PathBuf::from("lab.yaml")),
            autoplay: true,
        }
    );
}

#[test]
fn test_parse_interrupt_config_missing_value() {
    let args = Args::parse_from(["irqlab", "interrupt", "--config"]);
    assert_eq!(
        args.command,
        Command::Interrupt {
            config_path: None,
            autoplay: false,
        }
    );
}

#[test]
fn test_parse_io_command() {
    let args = Args::parse_from(["irqlab", "io", "dma"]);
    assert_eq!(
        args.command,
        Command::Io {
            mode: IoMode::Dma,
            speed: None,
            config_path: None,
        }
    );
}

#[test]
fn test_parse_io_with_speed_and_config() {
    let args = Args::parse_from([
        "irqlab", "io", "polling", "--speed", "2.5", "--config", "x.yaml",
    ]);
    match args.command {
        Command::Io {
            mode,
            speed,
            config_path,
        } => {
            assert_eq!(mode, IoMode::Polling);
            assert_eq!(speed, Some(2.5));
            assert_eq!(config_path, Some(PathBuf::from("x.yaml")));
        }
        other => panic!("expected io command, got {other:?}"),
    }
}

#[test]
fn test_parse_io_invalid_speed_is_ignored() {
    let args = Args::parse_from(["irqlab", "io", "interrupt", "--speed", "fast"]);
    match args.command {
        Command::Io { speed, .. } => assert_eq!(speed, None),
        other => panic!("expected io command, got {other:?}"),
    }
}

#[test]
fn test_parse_io_missing_mode() {
    assert_eq!(Args::parse_from(["irqlab", "io"]).command, Command::Help);
}

#[test]
fn test_parse_io_unknown_mode() {
    assert_eq!(
        Args::parse_from(["irqlab", "io", "fifo"]).command,
        Command::Help
    );
}

// ============================================================================
// Output tests
// ============================================================================

#[test]
fn test_render_initial_step() {
    let engine = StepEngine::new();
    let text = render_step(&engine);
    assert!(text.contains("Step 1/8"));
    assert!(text.contains("Initial State"));
    assert!(text.contains("PC=0x1000"));
    assert!(text.contains("IMR=11111110"));
    assert!(text.contains("-> 0x1000 MOV AX, 1234h"));
}

#[test]
fn test_render_save_context_shows_stack() {
    let mut engine = StepEngine::new();
    engine.go_to_step(4);
    let text = render_step(&engine);
    assert!(text.contains("SP=0xFFFB"));
    assert!(text.contains("| PSW: 0x0200 (new)"));
}

#[test]
fn test_render_find_isr_shows_vector() {
    let mut engine = StepEngine::new();
    engine.go_to_step(5);
    assert!(render_step(&engine).contains("vector 0x21 -> 0x2000"));
}

#[test]
fn test_render_register_log() {
    let mut engine = StepEngine::new();
    engine.next_step();
    let text = render_register_log(&engine);
    assert!(text.contains("step 2 Request"));
}

#[test]
fn test_render_mode_table() {
    let text = render_mode_table();
    for key in ["polling", "interrupt", "dma"] {
        assert!(text.contains(key));
    }
    assert!(text.contains("DMA mode"));
    assert!(text.contains("500ms"));
}

#[test]
fn test_render_io_report() {
    let mut state = IoSimState::default();
    state.write_memory(0, "Data_001").unwrap();
    state.apply_metrics(IoMode::Polling.config());
    state.logs.push(crate::demos::io_sim::LogEntry {
        id: "abc123xyz".to_string(),
        timestamp: "12:00:00".to_string(),
        message: "Transfer complete".to_string(),
        severity: Severity::Success,
    });
    let text = render_io_report(&state);
    assert!(text.contains("Polling mode (speed 1x)"));
    assert!(text.contains("✓ [12:00:00] Transfer complete"));
    assert!(text.contains("[0] Data_001"));
    assert!(text.contains("remaining count 1024"));
    assert!(text.contains("efficiency 30%"));
}

// ============================================================================
// Command tests
// ============================================================================

#[test]
fn test_run_cli_simple_commands() {
    for command in [Command::Help, Command::Version, Command::Modes] {
        assert_eq!(run_cli(Args { command }), ExitCode::SUCCESS);
    }
}

#[test]
fn test_run_cli_interrupt_walkthrough() {
    let args = Args::parse_from(["irqlab", "interrupt"]);
    assert_eq!(run_cli(args), ExitCode::SUCCESS);
}

#[test]
fn test_run_cli_missing_config_fails() {
    let args = Args::parse_from(["irqlab", "interrupt", "--config", "/nonexistent/lab.yaml"]);
    assert_eq!(run_cli(args), ExitCode::from(1));
}

#[test]
fn test_run_cli_invalid_speed_fails() {
    let args = Args::parse_from(["irqlab", "io", "dma", "--speed", "-3"]);
    assert_eq!(run_cli(args), ExitCode::from(1));
}

#[test]
fn test_load_config_from_file() {
    let path = std::env::temp_dir().join(format!("irqlab-cli-{}.yaml", std::process::id()));
    std::fs::write(&path, "io:\n  mode: dma\n  speed: 2.0\n").unwrap();
    let config = load_config(Some(&path));
    let _ = std::fs::remove_file(&path);

    let config = config.unwrap();
    assert_eq!(config.io.mode, IoMode::Dma);
    assert!((config.io.speed - 2.0).abs() < f64::EPSILON);
}

#[test]
fn test_load_config_rejects_bad_file() {
    let path = std::env::temp_dir().join(format!("irqlab-cli-bad-{}.yaml", std::process::id()));
    std::fs::write(&path, "io:\n  speed: 0.0\n").unwrap();
    let result = load_config(Some(&path));
    let _ = std::fs::remove_file(&path);
    assert!(matches!(result, Err(LabError::Validation(_))));
}
