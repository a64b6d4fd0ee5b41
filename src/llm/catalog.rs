use crate::llm::LlmProvider;

/// Reference data for one provider/model pairing. Loaded once, never
/// mutated during a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCandidate {
    pub provider: LlmProvider,
    pub model: &'static str,
    pub input_cost_per_million: f64,
    pub output_cost_per_million: f64,
    pub structured_output: bool,
    pub reasoning: bool,
}

/// Catalog order is strongest/costliest first.
const CATALOG: &[ModelCandidate] = &[
    ModelCandidate {
        provider: LlmProvider::Anthropic,
        model: "claude-opus-4-1",
        input_cost_per_million: 15.0,
        output_cost_per_million: 75.0,
        structured_output: true,
        reasoning: true,
    },
    ModelCandidate {
        provider: LlmProvider::Anthropic,
        model: "claude-sonnet-4-5",
        input_cost_per_million: 3.0,
        output_cost_per_million: 15.0,
        structured_output: true,
        reasoning: true,
    },
    ModelCandidate {
        provider: LlmProvider::OpenAi,
        model: "gpt-4.1",
        input_cost_per_million: 2.0,
        output_cost_per_million: 8.0,
        structured_output: true,
        reasoning: false,
    },
    ModelCandidate {
        provider: LlmProvider::OpenAi,
        model: "gpt-4o-mini",
        input_cost_per_million: 0.15,
        output_cost_per_million: 0.6,
        structured_output: true,
        reasoning: false,
    },
    ModelCandidate {
        provider: LlmProvider::Groq,
        model: "llama-3.1-70b-versatile",
        input_cost_per_million: 0.59,
        output_cost_per_million: 0.79,
        structured_output: false,
        reasoning: false,
    },
];

pub fn model_catalog() -> &'static [ModelCandidate] {
    CATALOG
}

pub fn candidate_for_model(model: &str) -> Option<&'static ModelCandidate> {
    CATALOG.iter().find(|candidate| candidate.model == model)
}

/// Orders candidates for one invocation. Strength >= 0.75 starts at the
/// strongest model, >= 0.4 at the mid tier, anything lower cheapest-first;
/// every candidate is always reachable as a fallback.
pub fn resolve_candidates(strength: f64) -> Vec<ModelCandidate> {
    let strength = strength.clamp(0.0, 1.0);
    if strength >= 0.75 {
        CATALOG.to_vec()
    } else if strength >= 0.4 {
        let mut ordered: Vec<ModelCandidate> = CATALOG[1..].to_vec();
        ordered.push(CATALOG[0].clone());
        ordered
    } else {
        let mut ordered: Vec<ModelCandidate> = CATALOG.to_vec();
        ordered.reverse();
        ordered
    }
}
