use crate::agent::{TaskRunner, DEFAULT_TASK_TIMEOUT};
use crate::git::ReconcileOptions;
use crate::workflow::marker::{EarlyOutcome, StepMarkerPolicy, StepSignal};
use crate::workflow::run::{collect_artifacts, RunStatus, StepEngine, WorkflowOutcome, WorkflowRun};
use crate::workflow::state::{clear_state, load_state, save_state, PersistedState};
use crate::workflow::template::render_template;
use crate::workflow::templates::{e2e_step_template, step_display, E2E_EXIT_STEPS, E2E_STEPS};
use crate::workflow::WorkflowError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

const WORKFLOW_NAME: &str = "e2e_fix";

#[derive(Debug, Clone)]
pub struct E2eFixRequest {
    pub issue: u64,
    pub repo: String,
    pub cwd: PathBuf,
    pub budget: f64,
    pub max_cycles: u32,
    pub max_retries: u32,
    pub timeout: Duration,
    pub resume: bool,
    pub reconcile_options: ReconcileOptions,
}

impl E2eFixRequest {
    pub fn new(issue: u64, repo: &str, cwd: PathBuf, budget: f64) -> Self {
        Self {
            issue,
            repo: repo.to_string(),
            cwd,
            budget,
            max_cycles: 3,
            max_retries: 0,
            timeout: DEFAULT_TASK_TIMEOUT,
            resume: false,
            reconcile_options: ReconcileOptions::default(),
        }
    }
}

/// Nine-step end-to-end fix loop. Re-test steps may end the run early
/// with ALL_TESTS_PASS or MAX_CYCLES_REACHED. Completed steps are
/// checkpointed so `--resume` picks up after the last paid call; the
/// checkpoint survives a failed run and is cleared on any other exit.
pub fn run_e2e_fix_workflow(
    request: &E2eFixRequest,
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
        workflow: WORKFLOW_NAME,
    };

    let mut context: BTreeMap<String, String> = BTreeMap::new();
    context.insert("issue".to_string(), request.issue.to_string());
    context.insert("repo".to_string(), request.repo.clone());
    context.insert("max_cycles".to_string(), request.max_cycles.to_string());

    if request.resume {
        if let Some(saved) = load_state(&request.cwd, WORKFLOW_NAME, request.issue)? {
            for record in saved.completed {
                context.insert(record.label.clone(), record.output.clone());
                run.record_step(record);
            }
        }
    }
    let resumed_past: Vec<String> = run.steps.iter().map(|s| s.label.clone()).collect();

    for label in E2E_STEPS {
        if resumed_past.iter().any(|done| done == label) {
            continue;
        }
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

        let template = e2e_step_template(label).ok_or_else(|| WorkflowError::UnknownTemplate {
            label: label.to_string(),
        })?;
        let instruction =
            render_template(template, &context).map_err(|reason| WorkflowError::TemplateRender {
                step: label.to_string(),
                reason,
            })?;

        let policy = StepMarkerPolicy {
            verification_gate: false,
            early_exit: E2E_EXIT_STEPS.contains(&label),
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
        match signal {
            StepSignal::EarlyExit(EarlyOutcome::AllTestsPass) => {
                message = format!(
                    "All end-to-end tests pass for issue #{} (exited at {})",
                    request.issue,
                    step_display(label)
                );
                run.finish(RunStatus::Succeeded);
                break;
            }
            StepSignal::EarlyExit(EarlyOutcome::MaxCyclesReached) => {
                message = format!(
                    "Stopped at {}: maximum fix cycles ({}) reached",
                    step_display(label),
                    request.max_cycles
                );
                run.finish(RunStatus::MaxCyclesReached);
                break;
            }
            StepSignal::HardStop(_) | StepSignal::Continue => {
                context.insert(label.to_string(), output);
                save_state(
                    &request.cwd,
                    WORKFLOW_NAME,
                    &PersistedState {
                        issue: request.issue,
                        completed: run.steps.clone(),
                        total_cost: run.total_cost,
                    },
                )?;
            }
        }
    }

    if run.status.is_none() {
        message = format!("End-to-end fix complete for issue #{}", request.issue);
        run.finish(RunStatus::Succeeded);
    }

    if let Some(warning) = engine.final_reconcile()? {
        push_warnings.push(warning);
    }

    let status = run.status.unwrap_or(RunStatus::Failed);
    if status != RunStatus::Failed {
        clear_state(&request.cwd, WORKFLOW_NAME, request.issue)?;
    }

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
