// src/logging.rs

//! Logging setup for `gazer` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `--debug`, `-v`, `-q`
//! 3. `GAZER_LOG` environment variable (e.g. "info", "debug")
//! 4. default to `info`
//!
//! Logs are sent to STDERR so that command stdout stays untouched.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::{CliArgs, LogLevel};

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(args: &CliArgs) -> Result<()> {
    let env_level = std::env::var("GAZER_LOG")
        .ok()
        .and_then(|s| parse_level_str(&s));
    let level = effective_level(args, env_level);

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(args.color_enabled())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))?;

    Ok(())
}

pub fn effective_level(args: &CliArgs, env_level: Option<Level>) -> Level {
    if let Some(lvl) = args.log_level {
        return level_from_log_level(lvl);
    }
    if args.debug {
        Level::TRACE
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::WARN
    } else {
        env_level.unwrap_or(Level::INFO)
    }
}

fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["gazer"];
        argv.extend_from_slice(extra);
        argv.push("a.py");
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flag_priority() {
        assert_eq!(effective_level(&args(&[]), None), Level::INFO);
        assert_eq!(effective_level(&args(&[]), Some(Level::ERROR)), Level::ERROR);
        assert_eq!(effective_level(&args(&["-q"]), Some(Level::ERROR)), Level::WARN);
        assert_eq!(effective_level(&args(&["-q", "-v"]), None), Level::DEBUG);
        assert_eq!(effective_level(&args(&["-v", "--debug"]), None), Level::TRACE);
        assert_eq!(
            effective_level(&args(&["--debug", "--log-level", "error"]), None),
            Level::ERROR
        );
    }

    #[test]
    fn env_values() {
        assert_eq!(parse_level_str(" Warning "), Some(Level::WARN));
        assert_eq!(parse_level_str("loud"), None);
    }
}
