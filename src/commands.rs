use crate::llm::{llm_invoke, CompletionBackend, LlmError, LlmRequest};

pub mod fix;
pub mod generate;
pub mod test_gen;

pub use fix::{fix_files, CloudLocalFixEngine, FileFixRecord, FixEngine, FixFileSpec, FixReport};
pub use generate::{run_generate, GenerateRequest};
pub use test_gen::{run_test_gen, TestGenRequest};

/// What every top-level command hands back: content plus the spend and
/// the model that produced it, success or not.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub success: bool,
    pub content: String,
    pub cost: f64,
    pub model: String,
}

/// Runs the local invocation engine and folds its errors into a failed
/// outcome that still carries the cost already spent.
pub(crate) fn local_outcome(
    request: &LlmRequest,
    backend: &dyn CompletionBackend,
) -> CommandOutcome {
    match llm_invoke(request, backend) {
        Ok(response) => CommandOutcome {
            success: true,
            content: response.text,
            cost: response.cost,
            model: response.model,
        },
        Err(LlmError::NoCandidates { strength }) => CommandOutcome {
            success: false,
            content: format!("no model candidates for strength {strength}"),
            cost: 0.0,
            model: "none".to_string(),
        },
        Err(LlmError::Fatal {
            model,
            reason,
            cost_so_far,
        }) => CommandOutcome {
            success: false,
            content: reason,
            cost: cost_so_far,
            model,
        },
        Err(LlmError::AllCandidatesExhausted {
            count,
            failures,
            cost_so_far,
        }) => CommandOutcome {
            success: false,
            content: format!(
                "all {count} model candidates exhausted:\n{}",
                failures.join("\n")
            ),
            cost: cost_so_far,
            model: "none".to_string(),
        },
    }
}
