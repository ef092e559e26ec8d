// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mcjob status <id>`

use anyhow::Result;
use clap::Args;
use mc_adapters::{ProcessAdapter, SchedulerAdapter};
use mc_core::status_file::read_status;
use serde_json::json;

use crate::color;
use crate::context::Context;
use crate::output::{format_epoch_ms, print_json, status_label, OutputFormat};

#[derive(Args)]
pub struct StatusArgs {
    /// Job id (as printed by `mcjob submit`)
    pub id: String,
}

pub fn handle<S, P>(args: StatusArgs, ctx: &Context<S, P>, format: OutputFormat) -> Result<()>
where
    S: SchedulerAdapter,
    P: ProcessAdapter,
{
    let id = ctx.job_id(&args.id);
    let status = ctx.registry.status(&id)?;
    let record = ctx.registry.lookup(&id)?;
    // The finish reason is informational; the status above is authoritative
    let reason = read_status(&record.status_path)
        .ok()
        .and_then(|artifact| artifact.reason);

    match format {
        OutputFormat::Text => {
            println!("{}  {}", id, color::status(&status_label(status, reason)));
            println!("  submitted: {}", format_epoch_ms(record.submitted_at_ms));
            println!("  workspace: {}", record.workspace.display());
        }
        OutputFormat::Json => print_json(&json!({
            "job_id": id,
            "status": status,
            "reason": reason,
            "submitted_at_ms": record.submitted_at_ms,
            "workspace": record.workspace,
        }))?,
    }
    Ok(())
}
