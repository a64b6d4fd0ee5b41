use crate::agent::{TaskRequest, TaskRunner};
use crate::config::state_root;
use crate::git::{reconcile, tracked_file_hashes, ReconcileOptions};
use crate::shared::logging::append_workflow_log_line;
use crate::workflow::marker::{parse_step_signal, StepMarkerPolicy, StepSignal};
use crate::workflow::WorkflowError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Succeeded,
    Failed,
    MaxCyclesReached,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub label: String,
    pub output: String,
    pub signal: StepSignal,
    pub cost: f64,
    pub provider: String,
    pub success: bool,
}

/// One orchestrator execution. Steps are append-only; `finish` freezes
/// the terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub issue: u64,
    pub repo: String,
    pub cwd: PathBuf,
    pub steps: Vec<StepRecord>,
    pub total_cost: f64,
    pub status: Option<RunStatus>,
}

impl WorkflowRun {
    pub fn new(issue: u64, repo: &str, cwd: &Path) -> Self {
        Self {
            issue,
            repo: repo.to_string(),
            cwd: cwd.to_path_buf(),
            steps: Vec::new(),
            total_cost: 0.0,
            status: None,
        }
    }

    pub fn record_step(&mut self, record: StepRecord) {
        self.total_cost += record.cost;
        self.steps.push(record);
    }

    pub fn finish(&mut self, status: RunStatus) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    pub fn last_provider(&self) -> String {
        self.steps
            .iter()
            .rev()
            .find(|s| !s.provider.is_empty())
            .map(|s| s.provider.clone())
            .unwrap_or_else(|| "none".to_string())
    }
}

/// What a command caller sees when an orchestrator returns.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOutcome {
    pub success: bool,
    pub status: RunStatus,
    pub message: String,
    pub total_cost: f64,
    pub provider: String,
    pub artifacts: Vec<String>,
    pub push_warnings: Vec<String>,
}

/// Gathers `FILES_CREATED: <path>` lines from every step output.
pub fn collect_artifacts(steps: &[StepRecord]) -> Vec<String> {
    let mut artifacts = Vec::new();
    for step in steps {
        for line in step.output.lines() {
            if let Some(path) = line.trim().strip_prefix("FILES_CREATED:") {
                let path = path.trim();
                if !path.is_empty() {
                    artifacts.push(path.to_string());
                }
            }
        }
    }
    artifacts
}

pub(crate) struct ExecutedStep {
    pub record: StepRecord,
    pub push_warning: Option<String>,
}

/// Shared step machinery for both orchestrators: agent invocation with
/// per-step retry, marker parse, and the post-step reconcile.
pub(crate) struct StepEngine<'a> {
    pub runner: &'a dyn TaskRunner,
    pub cwd: &'a Path,
    pub timeout: Duration,
    pub max_retries: u32,
    pub reconcile_options: ReconcileOptions,
    pub workflow: &'static str,
}

impl StepEngine<'_> {
    pub fn execute_step(
        &self,
        label: &str,
        instruction: &str,
        policy: StepMarkerPolicy,
    ) -> Result<ExecutedStep, WorkflowError> {
        self.log(&format!("step={label} event=start"));
        let pre_snapshot = tracked_file_hashes(self.cwd)?;

        let mut cost = 0.0;
        let mut provider = String::new();
        let mut last_failure = String::new();
        let mut completed = None;
        for _attempt in 0..=self.max_retries {
            let request = TaskRequest {
                instruction: instruction.to_string(),
                cwd: self.cwd.to_path_buf(),
                timeout: self.timeout,
                label: format!("{}_{label}", self.workflow),
            };
            match self.runner.run_task(&request) {
                Ok(outcome) => {
                    cost += outcome.cost;
                    provider = outcome.provider.clone();
                    if outcome.success {
                        completed = Some(outcome);
                        break;
                    }
                    last_failure = format!("agent reported failure: {}", outcome.output);
                }
                Err(err) => last_failure = err.to_string(),
            }
        }

        let record = match completed {
            Some(outcome) => StepRecord {
                label: label.to_string(),
                signal: parse_step_signal(&outcome.output, policy),
                output: outcome.output,
                cost,
                provider,
                success: true,
            },
            None => StepRecord {
                label: label.to_string(),
                output: last_failure,
                signal: StepSignal::Continue,
                cost,
                provider,
                success: false,
            },
        };

        let report = reconcile(
            self.cwd,
            &pre_snapshot,
            &format!("pdd {}: {label}", self.workflow),
            &self.reconcile_options,
        )?;
        self.log(&format!(
            "step={label} event=end success={} committed={} pushed={} cost={:.4}",
            record.success, report.committed, report.pushed, record.cost
        ));
        Ok(ExecutedStep {
            record,
            push_warning: report.warning,
        })
    }

    /// Terminal pass: nothing new to commit relative to a fresh snapshot,
    /// but any commits the agent created during earlier steps still get
    /// pushed. Runs on every exit path.
    pub fn final_reconcile(&self) -> Result<Option<String>, WorkflowError> {
        let snapshot = tracked_file_hashes(self.cwd)?;
        let report = reconcile(
            self.cwd,
            &snapshot,
            &format!("pdd {}: final", self.workflow),
            &self.reconcile_options,
        )?;
        self.log(&format!(
            "event=final_reconcile committed={} pushed={}",
            report.committed, report.pushed
        ));
        Ok(report.warning)
    }

    fn log(&self, detail: &str) {
        let line = format!(
            "ts={} workflow={} {detail}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
            self.workflow
        );
        let root = match crate::config::ensure_state_root(self.cwd) {
            Ok(root) => root,
            Err(_) => state_root(self.cwd),
        };
        let _ = append_workflow_log_line(&root, &line);
    }
}
