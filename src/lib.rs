// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod watch;

use anyhow::Result;
use clap::CommandFactory;
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::{DEFAULT_CONFIG, resolve_config};
use crate::engine::Gazer;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the watch set over the command-line patterns
/// - command configuration (`-c`, `-f`, or the first config file found)
/// - the event loop, which runs until Ctrl-C
pub async fn run(args: CliArgs) -> Result<()> {
    if args.default_config {
        print!("{DEFAULT_CONFIG}");
        return Ok(());
    }

    let targets = args.targets();
    if targets.is_empty() {
        CliArgs::command().print_help()?;
        println!();
        return Ok(());
    }

    let gazer = Gazer::new(&targets, args.max_watch_dirs)?;
    let result = run_gazer(&gazer, &args).await;
    gazer.close();
    result
}

async fn run_gazer(gazer: &Gazer, args: &CliArgs) -> Result<()> {
    let config = resolve_config(args.command.as_deref(), args.file.as_deref())?;
    debug!(commands = config.commands.len(), "configuration loaded");

    gazer.run(config, args.timeout, args.restart).await?;
    Ok(())
}
