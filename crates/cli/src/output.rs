// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use mc_core::{FinishReason, Status};
use serde::Serialize;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format an epoch-milliseconds timestamp as UTC wall time ("-" when unset)
pub fn format_epoch_ms(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    i64::try_from(epoch_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// "FINISHED (particle_count)" or just "RUNNING"
pub fn status_label(status: Status, reason: Option<FinishReason>) -> String {
    match reason {
        Some(reason) => format!("{} ({})", status, reason),
        None => status.to_string(),
    }
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
