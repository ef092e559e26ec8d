// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mcjob cancel <id> [--mode soft|hard]`

use anyhow::Result;
use clap::Args;
use mc_adapters::{ProcessAdapter, SchedulerAdapter};
use mc_engine::CancelMode;
use serde_json::json;

use crate::context::Context;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct CancelArgs {
    pub id: String,

    /// soft: stop at the monitor's next poll; hard: kill monitor and workflow now
    #[arg(long, default_value = "soft")]
    pub mode: String,
}

pub async fn handle<S, P>(args: CancelArgs, ctx: &Context<S, P>, format: OutputFormat) -> Result<()>
where
    S: SchedulerAdapter,
    P: ProcessAdapter,
{
    let mode: CancelMode = args.mode.parse()?;
    let id = ctx.job_id(&args.id);
    let applied = ctx.registry.cancel(&id, mode).await?;

    match format {
        OutputFormat::Text => match applied {
            CancelMode::Soft => println!("Soft cancel requested for {}", id),
            CancelMode::Hard => println!("Job {} cancelled", id),
        },
        OutputFormat::Json => print_json(&json!({
            "job_id": id,
            "mode": applied.to_string(),
        }))?,
    }
    Ok(())
}
