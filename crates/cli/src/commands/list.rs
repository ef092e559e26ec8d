// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mcjob list`

use anyhow::Result;
use mc_adapters::{ProcessAdapter, SchedulerAdapter};
use mc_core::JobRecord;
use serde_json::json;

use crate::context::Context;
use crate::output::{format_epoch_ms, print_json, OutputFormat};
use crate::table::{Column, Table};

pub fn handle<S, P>(ctx: &Context<S, P>, format: OutputFormat) -> Result<()>
where
    S: SchedulerAdapter,
    P: ProcessAdapter,
{
    let records = refreshed(ctx);
    match format {
        OutputFormat::Text => {
            let table = job_table(Table::new(columns()), &records);
            if table.is_empty() {
                println!("No jobs");
            } else {
                table.render(&mut std::io::stdout());
            }
        }
        OutputFormat::Json => {
            let jobs: Vec<_> = records
                .iter()
                .map(|r| {
                    json!({
                        "job_id": r.id,
                        "user": r.user,
                        "status": r.status,
                        "handle": r.scheduler_handle,
                        "submitted_at_ms": r.submitted_at_ms,
                    })
                })
                .collect();
            print_json(&jobs)?;
        }
    }
    Ok(())
}

/// Records with their status re-read from each workspace
fn refreshed<S, P>(ctx: &Context<S, P>) -> Vec<JobRecord>
where
    S: SchedulerAdapter,
    P: ProcessAdapter,
{
    ctx.registry
        .list()
        .into_iter()
        .map(|mut record| {
            match ctx.registry.status(&record.id) {
                Ok(status) => record.status = status,
                Err(e) => tracing::warn!(job_id = %record.id, error = %e, "status unavailable"),
            }
            record
        })
        .collect()
}

fn columns() -> Vec<Column> {
    vec![
        Column::left("JOB"),
        Column::status("STATUS"),
        Column::right("CLUSTER"),
        Column::muted("SUBMITTED"),
    ]
}

fn job_table(mut table: Table, records: &[JobRecord]) -> Table {
    for record in records {
        table.row(vec![
            record.id.to_string(),
            record.status.to_string(),
            record.scheduler_handle.clone().unwrap_or_else(|| "-".to_string()),
            format_epoch_ms(record.submitted_at_ms),
        ]);
    }
    table
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
