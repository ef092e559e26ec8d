// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mcjob - Monte Carlo dose-calculation job control

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod color;
mod commands;
mod context;
mod env;
mod output;
mod table;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{cancel, list, result, status, submit};
use mc_core::SystemClock;
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "mcjob",
    version,
    about = "Submit and control Monte Carlo dose-calculation jobs"
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    /// System config file (default: $MCJOB_CONFIG, then the user config dir)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a plan for dose calculation
    Submit(submit::SubmitArgs),
    /// Show a job's status
    Status(status::StatusArgs),
    /// Cancel a job
    Cancel(cancel::CancelArgs),
    /// Fetch a finished job's result bundle
    Result(result::ResultArgs),
    /// List known jobs
    List,
}

fn cli_command() -> clap::Command {
    use clap::CommandFactory;
    Cli::command()
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(e) = run().await {
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(1);
    }
}

/// Warnings and above on stderr unless `RUST_LOG` says otherwise
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains every source's text, the
/// "Caused by" section is dropped; otherwise the full chain is rendered.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let Some(command) = cli.command else {
        cli_command().print_help()?;
        println!();
        return Ok(());
    };

    let ctx = context::load(cli.config)?;
    match command {
        Commands::Submit(args) => submit::handle(args, &ctx, SystemClock, format).await?,
        Commands::Status(args) => status::handle(args, &ctx, format)?,
        Commands::Cancel(args) => cancel::handle(args, &ctx, format).await?,
        Commands::Result(args) => result::handle(args, &ctx, format)?,
        Commands::List => list::handle(&ctx, format)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
