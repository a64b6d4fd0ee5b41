pub mod adapter;
pub mod catalog;
pub mod invoke;
pub mod messages;

pub use adapter::{adapt_request, ProviderPayload};
pub use catalog::{candidate_for_model, model_catalog, resolve_candidates, ModelCandidate};
pub use invoke::{
    llm_invoke, Completion, CompletionBackend, FailureKind, HttpCompletionBackend, LlmError,
    LlmRequest, LlmResponse, ProviderFailure,
};
pub use messages::{ChatMessage, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Groq,
    OpenAi,
    Anthropic,
}

impl LlmProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
