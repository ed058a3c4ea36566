// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueEnum};

use crate::engine::default_max_watch_dirs;

/// Default timeout: effectively "never".
pub const DEFAULT_TIMEOUT_MS: i64 = 1 << 50;

/// Command-line arguments for `gazer`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gazer",
    version,
    about = "Run a command whenever a watched file is saved.",
    long_about = None,
    after_help = AFTER_HELP
)]
pub struct CliArgs {
    /// File patterns to watch (`*.py`, `src/**/*.rs`, `.`).
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Command to run for every matching file, e.g. `-c 'python "{{file}}"'`.
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    pub command: Option<String>,

    /// Kill the running process and start again on each change.
    #[arg(short = 'r', long)]
    pub restart: bool,

    /// Timeout in milliseconds for one whole run.
    #[arg(
        short = 't',
        long,
        value_name = "MS",
        default_value_t = DEFAULT_TIMEOUT_MS,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub timeout: i64,

    /// Configuration file in TOML; YAML `.gaze.yml` files are not read.
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Maximum number of directories to watch.
    #[arg(
        short = 'w',
        long,
        value_name = "N",
        default_value_t = default_max_watch_dirs(),
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_watch_dirs: usize,

    /// Only print warnings and errors.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Also print watched directories and process ids.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print everything, including per-event diagnostics.
    #[arg(long)]
    pub debug: bool,

    /// Explicit logging level; overrides -q/-v/--debug.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// 0: plain output, 1: colored output.
    #[arg(
        long,
        value_name = "0|1",
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(0..=1)
    )]
    pub color: u8,

    /// Print the built-in configuration and exit.
    #[arg(short = 'y', long = "default-config")]
    pub default_config: bool,
}

const AFTER_HELP: &str = "\
Examples:
    gazer .
    gazer main.go
    gazer a.rb b.rb
    gazer -c make \"**/*.c\"
    gazer -c \"eslint {{file}}\" \"src/**/*.js\"
    gazer -r server.py
    gazer -t 1000 complicated.py

Placeholders in commands: {{file}} {{ext}} {{base}} {{base0}} {{dir}} {{abs}}";

impl CliArgs {
    /// Patterns with duplicates removed, first occurrence kept.
    pub fn targets(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.patterns
            .iter()
            .filter(|p| seen.insert(p.as_str()))
            .cloned()
            .collect()
    }

    pub fn color_enabled(&self) -> bool {
        self.color != 0
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["gazer", "*.py"]).unwrap();
        assert_eq!(args.timeout, DEFAULT_TIMEOUT_MS);
        assert_eq!(args.max_watch_dirs, default_max_watch_dirs());
        assert!(!args.restart);
        assert!(args.color_enabled());
        assert_eq!(args.targets(), vec!["*.py"]);
    }

    #[test]
    fn flags_and_duplicate_patterns() {
        let args = CliArgs::try_parse_from([
            "gazer", "-r", "-t", "500", "-c", "make", "-w", "7", "--color", "0", "a.c", "b.c",
            "a.c",
        ])
        .unwrap();
        assert!(args.restart);
        assert_eq!(args.timeout, 500);
        assert_eq!(args.command.as_deref(), Some("make"));
        assert_eq!(args.max_watch_dirs, 7);
        assert!(!args.color_enabled());
        assert_eq!(args.targets(), vec!["a.c", "b.c"]);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(CliArgs::try_parse_from(["gazer", "-t", "0", "a"]).is_err());
        assert!(CliArgs::try_parse_from(["gazer", "-w", "0", "a"]).is_err());
        assert!(CliArgs::try_parse_from(["gazer", "--color", "2", "a"]).is_err());
    }

    #[test]
    fn file_help_names_the_config_format() {
        let help = CliArgs::command().render_help().to_string();
        assert!(help.contains("TOML"), "{help}");
        assert!(help.contains(".gaze.yml"), "{help}");
    }
}
