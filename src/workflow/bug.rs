use crate::agent::{TaskRunner, DEFAULT_TASK_TIMEOUT};
use crate::git::ReconcileOptions;
use crate::workflow::marker::{StepMarkerPolicy, StepSignal};
use crate::workflow::run::{collect_artifacts, RunStatus, StepEngine, WorkflowOutcome, WorkflowRun};
use crate::workflow::template::render_template;
use crate::workflow::templates::{bug_step_template, step_display, BUG_STEPS, BUG_VERIFICATION_GATE};
use crate::workflow::WorkflowError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BugWorkflowRequest {
    pub issue: u64,
    pub repo: String,
    pub cwd: PathBuf,
    pub budget: f64,
    pub max_retries: u32,
    pub timeout: Duration,
    pub reconcile_options: ReconcileOptions,
}

impl BugWorkflowRequest {
    pub fn new(issue: u64, repo: &str, cwd: PathBuf, budget: f64) -> Self {
        Self {
            issue,
            repo: repo.to_string(),
            cwd,
            budget,
            max_retries: 0,
            timeout: DEFAULT_TASK_TIMEOUT,
            reconcile_options: ReconcileOptions::default(),
        }
    }
}

/// Eleven-step bug investigation. The test-quality gate at step8 is the
/// only hard stop; everything else runs to completion or fails on agent
/// error or budget.
pub fn run_bug_workflow(
    request: &BugWorkflowRequest,
    runner: &dyn TaskRunner,
) -> Result<WorkflowOutcome, WorkflowError> {
    let mut run = WorkflowRun::new(request.issue, &request.repo, &request.cwd);
    let mut message = String::new();
    let mut push_warnings = Vec::new();

    let engine = StepEngine {
        runner,
        cwd: &request.cwd,
        timeout: request.timeout,
        max_retries: request.max_retries,
        reconcile_options: request.reconcile_options.clone(),
        workflow: "bug",
    };

    let mut context: BTreeMap<String, String> = BTreeMap::new();
    context.insert("issue".to_string(), request.issue.to_string());
    context.insert("repo".to_string(), request.repo.clone());

    for label in BUG_STEPS {
        if run.total_cost >= request.budget {
            message = format!(
                "Budget exceeded before {}: spent ${:.4} of ${:.4}",
                step_display(label),
                run.total_cost,
                request.budget
            );
            run.finish(RunStatus::Failed);
            break;
        }

        let template = bug_step_template(label).ok_or_else(|| WorkflowError::UnknownTemplate {
            label: label.to_string(),
        })?;
        let instruction =
            render_template(template, &context).map_err(|reason| WorkflowError::TemplateRender {
                step: label.to_string(),
                reason,
            })?;

        let policy = StepMarkerPolicy {
            verification_gate: label == BUG_VERIFICATION_GATE,
            early_exit: false,
        };
        let executed = engine.execute_step(label, &instruction, policy)?;
        if let Some(warning) = executed.push_warning {
            push_warnings.push(warning);
        }
        let record = executed.record;
        let signal = record.signal.clone();
        let output = record.output.clone();
        let step_ok = record.success;
        run.record_step(record);

        if !step_ok {
            message = format!("{} failed: {output}", step_display(label));
            run.finish(RunStatus::Failed);
            break;
        }
        if let StepSignal::HardStop(reason) = signal {
            message = format!(
                "Stopped at {}: test verification failed: {reason}",
                step_display(label)
            );
            run.finish(RunStatus::Failed);
            break;
        }
        context.insert(label.to_string(), output);
    }

    if run.status.is_none() {
        message = format!("Investigation complete for issue #{}", request.issue);
        run.finish(RunStatus::Succeeded);
    }

    if let Some(warning) = engine.final_reconcile()? {
        push_warnings.push(warning);
    }

    let status = run.status.unwrap_or(RunStatus::Failed);
    Ok(WorkflowOutcome {
        success: status == RunStatus::Succeeded,
        status,
        message,
        total_cost: run.total_cost,
        provider: run.last_provider(),
        artifacts: collect_artifacts(&run.steps),
        push_warnings,
    })
}
