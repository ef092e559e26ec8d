// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mcjob result <id> [--out <dir>]` - deliver a finished job's bundle

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use mc_adapters::{ProcessAdapter, SchedulerAdapter};
use serde_json::json;

use crate::context::Context;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct ResultArgs {
    pub id: String,

    /// Extract the bundle's files into this directory
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn handle<S, P>(args: ResultArgs, ctx: &Context<S, P>, format: OutputFormat) -> Result<()>
where
    S: SchedulerAdapter,
    P: ProcessAdapter,
{
    let id = ctx.job_id(&args.id);
    let bundle = ctx.registry.result(&id)?;
    let written = match &args.out {
        Some(dir) => bundle.extract(dir)?,
        None => Vec::new(),
    };

    match format {
        OutputFormat::Text => {
            println!("Result bundle for {} ({} files)", id, bundle.entries.len());
            for entry in &bundle.entries {
                println!("  {}  {} bytes  sha256:{}", entry.name, entry.size, entry.sha256);
            }
            if let Some(dir) = &args.out {
                println!("Extracted {} files to {}", written.len(), dir.display());
            }
        }
        OutputFormat::Json => {
            let entries: Vec<_> = bundle
                .entries
                .iter()
                .map(|e| json!({ "name": e.name, "size": e.size, "sha256": e.sha256 }))
                .collect();
            print_json(&json!({
                "job_id": id,
                "created_at": bundle.created_at,
                "entries": entries,
                "extracted": written,
            }))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
