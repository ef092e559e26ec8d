// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler descriptors.
//!
//! [`SubmitDescriptor`] renders HTCondor submit syntax (one queue statement per
//! beam); [`WorkflowDescriptor`] renders the DAGMan file that wraps the compute
//! stage between the optional pre hook and the post hook. The join before the
//! post hook is DAGMan's job: a `SCRIPT POST` only runs once every process of
//! the node's cluster has left the queue.

use crate::error::JobError;
use crate::fsutil::write_file;
use indexmap::IndexMap;
use mc_core::{sanitize_name, BeamId, GeometryMode, JobSpec, PlanDetails, SystemConfig, WorkspaceLayout};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the compute node in the workflow
pub const COMPUTE_NODE: &str = "compute";

/// One queued entry of the submit descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEntry {
    /// Comment line identifying the beam
    pub name: String,
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub memory_mb: u64,
    pub queue_count: u32,
    pub priority: i32,
    pub stdout_pattern: String,
    pub stderr_pattern: String,
    pub log_pattern: String,
}

impl TaskEntry {
    /// Task running `spec`'s configuration artifact in `workspace`.
    pub fn for_spec(spec: &JobSpec, executable: PathBuf, workspace: &Path, priority: i32) -> Self {
        let stem = spec.artifact_stem();
        Self {
            name: format!("beam {} ({})", spec.beam_number, spec.beam_name),
            executable,
            arguments: vec![
                spec.config_artifact.display().to_string(),
                "$(CLUSTER)".to_string(),
                "$(PROCESS)".to_string(),
                workspace.display().to_string(),
            ],
            memory_mb: spec.memory_mb,
            queue_count: spec.job_count,
            priority,
            stdout_pattern: format!("logs/{}.stdout.$(CLUSTER).$(PROCESS).txt", stem),
            stderr_pattern: format!("logs/{}.stderr.$(CLUSTER).$(PROCESS).txt", stem),
            log_pattern: format!("logs/{}.log.$(CLUSTER).$(PROCESS).txt", stem),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitDescriptor {
    pub workdir: PathBuf,
    pub next_job_start_delay_secs: u64,
    pub tasks: Vec<TaskEntry>,
}

impl SubmitDescriptor {
    pub fn render(&self) -> Result<String, JobError> {
        if self.tasks.is_empty() {
            return Err(JobError::Validation(
                "submit descriptor has no tasks".to_string(),
            ));
        }
        let mut out = String::new();
        field(&mut out, "universe", "vanilla")?;
        field(&mut out, "initialdir", &self.workdir.display().to_string())?;
        field(&mut out, "request_cpus", "1")?;
        field(&mut out, "+RunAsOwner", "true")?;
        field(
            &mut out,
            "next_job_start_delay",
            &self.next_job_start_delay_secs.to_string(),
        )?;
        field(&mut out, "notification", "error")?;

        for task in &self.tasks {
            out.push('\n');
            line(&mut out, &format!("# {}", task.name))?;
            field(&mut out, "executable", &task.executable.display().to_string())?;
            field(&mut out, "arguments", &quote_arguments(&task.arguments)?)?;
            field(&mut out, "priority", &task.priority.to_string())?;
            field(&mut out, "request_memory", &task.memory_mb.to_string())?;
            field(&mut out, "output", &task.stdout_pattern)?;
            field(&mut out, "error", &task.stderr_pattern)?;
            field(&mut out, "log", &task.log_pattern)?;
            line(&mut out, &format!("queue {}", task.queue_count))?;
        }
        Ok(out)
    }
}

/// Script run before or after a workflow node
#[derive(Debug, Clone, PartialEq)]
pub struct Hook {
    pub script: PathBuf,
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowDescriptor {
    pub node: String,
    pub submit_file: PathBuf,
    pub pre: Option<Hook>,
    pub post: Hook,
}

impl WorkflowDescriptor {
    pub fn render(&self) -> Result<String, JobError> {
        let mut out = String::new();
        line(
            &mut out,
            &format!("JOB {} {}", self.node, hook_word(&self.submit_file.display().to_string())?),
        )?;
        if let Some(pre) = &self.pre {
            line(&mut out, &self.script_line("PRE", pre)?)?;
        }
        line(&mut out, &self.script_line("POST", &self.post)?)?;
        Ok(out)
    }

    fn script_line(&self, kind: &str, hook: &Hook) -> Result<String, JobError> {
        let mut text = format!(
            "SCRIPT {} {} {}",
            kind,
            self.node,
            hook_word(&hook.script.display().to_string())?
        );
        for arg in &hook.arguments {
            text.push(' ');
            text.push_str(hook_word(arg)?);
        }
        Ok(text)
    }
}

fn reject_control(value: &str) -> Result<(), JobError> {
    if value.contains(['\n', '\r', '\0']) {
        return Err(JobError::Validation(format!(
            "descriptor value contains a line break or NUL: {:?}",
            value
        )));
    }
    Ok(())
}

fn line(out: &mut String, text: &str) -> Result<(), JobError> {
    reject_control(text)?;
    out.push_str(text);
    out.push('\n');
    Ok(())
}

fn field(out: &mut String, key: &str, value: &str) -> Result<(), JobError> {
    reject_control(value)?;
    let _ = writeln!(out, "{} = {}", key, value);
    Ok(())
}

/// Workflow hook words cannot be quoted
fn hook_word(value: &str) -> Result<&str, JobError> {
    reject_control(value)?;
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(JobError::Validation(format!(
            "workflow hook argument must be a non-empty word without whitespace: {:?}",
            value
        )));
    }
    Ok(value)
}

/// Render arguments in the scheduler's double-quoted argument syntax.
pub fn quote_arguments(args: &[String]) -> Result<String, JobError> {
    let mut words = Vec::with_capacity(args.len());
    for arg in args {
        reject_control(arg)?;
        let escaped = arg.replace('"', "\"\"").replace('\'', "''");
        if escaped.is_empty() || escaped.chars().any(char::is_whitespace) {
            words.push(format!("'{}'", escaped));
        } else {
            words.push(escaped);
        }
    }
    Ok(format!("\"{}\"", words.join(" ")))
}

/// Plan-level dose file stem produced by the post stage
pub fn plan_dose_name(plan: &PlanDetails) -> String {
    let beamset = sanitize_name(&plan.beamset_name);
    match &plan.geometry {
        GeometryMode::Volumetric { .. } => format!("idc-CT-{}-PLAN", beamset),
        GeometryMode::Phantom(p) => {
            format!("idc-PHANTOM-{}-{}-PLAN", sanitize_name(&p.label), beamset)
        }
    }
}

/// Extension of the plan-level dose written by the post stage
pub const PLAN_DOSE_EXTENSION: &str = "dcm";

#[derive(Deserialize)]
struct ManifestDoseName {
    plan_dose_name: String,
}

/// File name of the plan dose the post stage writes for this workspace,
/// as recorded in `postprocess.json`.
pub fn expected_plan_dose(layout: &WorkspaceLayout) -> Result<String, JobError> {
    let path = layout.postprocess_manifest_path();
    let bytes = std::fs::read(&path).map_err(|e| JobError::io(&path, e))?;
    let manifest: ManifestDoseName = serde_json::from_slice(&bytes).map_err(|e| {
        JobError::Validation(format!("{} is malformed: {}", path.display(), e))
    })?;
    Ok(format!("{}.{}", manifest.plan_dose_name, PLAN_DOSE_EXTENSION))
}

/// Files written by [`SubmitDescriptorWriter::emit`]
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorPaths {
    pub submit: PathBuf,
    pub workflow: PathBuf,
    pub manifest: PathBuf,
}

#[derive(Serialize)]
struct PostprocessManifest<'a> {
    plan_uid: &'a str,
    user: &'a str,
    beamset: &'a str,
    geometry: String,
    plan_dose_name: String,
    jobs: Vec<&'a JobSpec>,
}

pub struct SubmitDescriptorWriter {
    config: Arc<SystemConfig>,
}

impl SubmitDescriptorWriter {
    pub fn new(config: Arc<SystemConfig>) -> Self {
        Self { config }
    }

    pub fn emit(
        &self,
        layout: &WorkspaceLayout,
        specs: &IndexMap<BeamId, JobSpec>,
        plan: &PlanDetails,
    ) -> Result<DescriptorPaths, JobError> {
        if specs.is_empty() {
            return Err(JobError::Validation(format!(
                "plan {} has no beam to simulate",
                plan.uid
            )));
        }

        let executable = self.config.task_executable();
        let submit = SubmitDescriptor {
            workdir: layout.root.clone(),
            next_job_start_delay_secs: self.config.compute.next_job_start_delay_secs,
            tasks: specs
                .values()
                .map(|spec| TaskEntry::for_spec(spec, executable.clone(), &layout.root, plan.priority))
                .collect(),
        };

        let manifest_path = layout.postprocess_manifest_path();
        let pre = plan.geometry.needs_image_preparation().then(|| Hook {
            script: self.config.preprocess_script(),
            arguments: vec![layout
                .data_dir()
                .join("CT")
                .join("preprocess.json")
                .display()
                .to_string()],
        });
        let workflow = WorkflowDescriptor {
            node: COMPUTE_NODE.to_string(),
            submit_file: layout.submit_descriptor_path(),
            pre,
            post: Hook {
                script: self.config.postprocess_script(),
                arguments: vec![manifest_path.display().to_string(), "$RETURN".to_string()],
            },
        };

        let manifest = PostprocessManifest {
            plan_uid: plan.uid.as_str(),
            user: &plan.user,
            beamset: &plan.beamset_name,
            geometry: plan.geometry.to_string(),
            plan_dose_name: plan_dose_name(plan),
            jobs: specs.values().collect(),
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| JobError::Validation(e.to_string()))?;

        // Render everything before writing anything
        let submit_text = submit.render()?;
        let workflow_text = workflow.render()?;

        let paths = DescriptorPaths {
            submit: layout.submit_descriptor_path(),
            workflow: layout.workflow_descriptor_path(),
            manifest: manifest_path,
        };
        write_file(&paths.submit, submit_text.as_bytes())?;
        write_file(&paths.workflow, workflow_text.as_bytes())?;
        write_file(&paths.manifest, &manifest_json)?;

        tracing::info!(
            job_id = %layout.job_id,
            tasks = submit.tasks.len(),
            pre_stage = workflow.pre.is_some(),
            "descriptors written"
        );
        Ok(paths)
    }
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
