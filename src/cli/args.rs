//! CLI argument parsing.
//!
//! Hand-rolled so the parser can be driven from any iterator of strings in
//! tests.

use std::path::PathBuf;

use crate::demos::io_sim::IoMode;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Walk through the interrupt-handling steps
    Interrupt {
        /// Optional YAML configuration file.
        config_path: Option<PathBuf>,
        /// Advance on the auto-play timer instead of immediately.
        autoplay: bool,
    },
    /// Run one I/O transfer simulation
    Io {
        /// Transfer mode.
        mode: IoMode,
        /// Optional speed override.
        speed: Option<f64>,
        /// Optional YAML configuration file.
        config_path: Option<PathBuf>,
    },
    /// Print the mode table
    Modes,
    /// Show help
    Help,
    /// Show version
    Version,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    fn parse_from_vec(args: &[String]) -> Self {
        let Some(first) = args.get(1) else {
            return Self {
                command: Command::Help,
            };
        };

        let command = match first.as_str() {
            "interrupt" => Self::parse_interrupt_command(args),
            "io" => Self::parse_io_command(args),
            "modes" => Command::Modes,
            "-h" | "--help" | "help" => Command::Help,
            "-V" | "--version" | "version" => Command::Version,
            unknown => {
                eprintln!("Unknown command: {unknown}");
                Command::Help
            }
        };

        Self { command }
    }

    /// Parse the 'interrupt' command arguments.
    fn parse_interrupt_command(args: &[String]) -> Command {
        let mut config_path = None;
        let mut autoplay = false;

        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    config_path = args.get(i + 1).map(PathBuf::from);
                    i += 2;
                }
                "--autoplay" => {
                    autoplay = true;
                    i += 1;
                }
                _ => i += 1,
            }
        }

        Command::Interrupt {
            config_path,
            autoplay,
        }
    }

    /// Parse the 'io' command arguments.
    fn parse_io_command(args: &[String]) -> Command {
        let Some(mode_arg) = args.get(2) else {
            eprintln!("Error: 'io' command requires a mode (polling, interrupt, dma)");
            return Command::Help;
        };
        let mode = match mode_arg.parse::<IoMode>() {
            Ok(mode) => mode,
            Err(e) => {
                eprintln!("Error: {e}");
                return Command::Help;
            }
        };

        let mut speed = None;
        let mut config_path = None;

        let mut i = 3;
        while i < args.len() {
            match args[i].as_str() {
                "--speed" => {
                    if let Some(value) = args.get(i + 1) {
                        match value.parse() {
                            Ok(s) => speed = Some(s),
                            Err(_) => eprintln!("Warning: ignoring invalid speed '{value}'"),
                        }
                    }
                    i += 2;
                }
                "--config" => {
                    config_path = args.get(i + 1).map(PathBuf::from);
                    i += 2;
                }
                _ => i += 1,
            }
        }

        Command::Io {
            mode,
            speed,
            config_path,
        }
    }
}
