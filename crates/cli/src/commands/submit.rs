// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mcjob submit <plan>` - build, compile, emit and launch one job

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use mc_adapters::{ProcessAdapter, SchedulerAdapter};
use mc_core::{Clock, PlanDetails};
use mc_engine::{
    CompileSummary, DirectoryCatalog, JobError, JobGraphCompiler, Launcher, Submission,
    SubmitDescriptorWriter, WorkspaceBuilder,
};
use serde_json::json;

use crate::context::Context;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct SubmitArgs {
    /// Plan details file (.toml or .json)
    pub plan: PathBuf,
}

/// A submitted job and the compile decisions behind it
pub struct SubmitReport {
    pub submission: Submission,
    pub summary: CompileSummary,
}

/// Run the whole submission pipeline for a validated plan and register the job.
pub async fn submit_plan<S, P, C>(
    ctx: &Context<S, P>,
    plan: &PlanDetails,
    clock: C,
) -> Result<SubmitReport, JobError>
where
    S: SchedulerAdapter,
    P: ProcessAdapter,
    C: Clock,
{
    plan.validate()?;
    let config = &ctx.config;

    let layout = WorkspaceBuilder::new(config.clone()).create(plan)?;
    let compiled = JobGraphCompiler::new(
        config.clone(),
        DirectoryCatalog::new(&config.paths.beamlines_dir),
    )
    .compile(plan, &layout)?;
    SubmitDescriptorWriter::new(config.clone()).emit(&layout, &compiled.specs, plan)?;

    let submission = Launcher::new(ctx.scheduler.clone(), ctx.processes.clone(), clock, config.clone())
        .with_config_path(&ctx.config_path)
        .submit(&layout, plan)
        .await?;
    ctx.registry
        .register(submission.record.id.clone(), submission.record.clone())?;

    Ok(SubmitReport {
        submission,
        summary: compiled.summary,
    })
}

pub async fn handle<S, P, C>(
    args: SubmitArgs,
    ctx: &Context<S, P>,
    clock: C,
    format: OutputFormat,
) -> Result<()>
where
    S: SchedulerAdapter,
    P: ProcessAdapter,
    C: Clock,
{
    let plan = PlanDetails::load(&args.plan)?;
    let report = submit_plan(ctx, &plan, clock).await?;
    let record = &report.submission.record;

    match format {
        OutputFormat::Text => {
            print!("{}", report.summary);
            for note in &report.submission.notes {
                eprintln!("warning: {}", note);
            }
            println!(
                "Submitted job {} (cluster {})",
                record.id, report.submission.handle
            );
            println!("  workspace: {}", record.workspace.display());
        }
        OutputFormat::Json => {
            let skipped: Vec<_> = report
                .summary
                .skipped
                .iter()
                .map(|s| json!({ "beam": s.beam_id, "reason": s.reason.to_string() }))
                .collect();
            print_json(&json!({
                "job_id": record.id,
                "handle": report.submission.handle,
                "workspace": record.workspace,
                "status": record.status,
                "skipped": skipped,
                "warnings": report.summary.warnings,
                "notes": report.submission.notes,
            }))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "submit_tests.rs"]
mod tests;
