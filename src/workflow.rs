pub mod bug;
pub mod e2e_fix;
pub mod marker;
pub mod run;
pub mod state;
pub mod template;
pub mod templates;

pub use bug::{run_bug_workflow, BugWorkflowRequest};
pub use e2e_fix::{run_e2e_fix_workflow, E2eFixRequest};
pub use marker::{parse_step_signal, EarlyOutcome, StepMarkerPolicy, StepSignal};
pub use run::{RunStatus, StepRecord, WorkflowOutcome, WorkflowRun};

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("no template registered for step {label}")]
    UnknownTemplate { label: String },
    #[error("template for step {step} failed to render: {reason}")]
    TemplateRender { step: String, reason: String },
    #[error(transparent)]
    Git(#[from] crate::git::GitError),
    #[error("workflow state serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_error(path: &std::path::Path, source: std::io::Error) -> WorkflowError {
    WorkflowError::Io {
        path: path.display().to_string(),
        source,
    }
}
