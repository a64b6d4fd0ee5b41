use crate::llm::adapter::{adapt_request, ProviderPayload};
use crate::llm::catalog::{candidate_for_model, resolve_candidates};
use crate::llm::messages::ChatMessage;
use crate::llm::LlmProvider;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Network,
    Timeout,
    Auth,
    InvalidRequest,
}

impl FailureKind {
    /// Retryable failures advance to the next candidate; fatal ones abort
    /// the whole loop, since a bad token does not get better on a weaker
    /// model.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Network | Self::Timeout)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Auth => "auth",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

/// One failed attempt against one provider. `billed` is nonzero only when
/// the provider reported partial billing for the failed call.
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub reason: String,
    pub billed: f64,
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.reason)
    }
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub cost: f64,
}

/// Seam between the retry loop and the transport. The production
/// implementation is `HttpCompletionBackend`; tests substitute their own.
pub trait CompletionBackend {
    fn complete(&self, payload: &ProviderPayload) -> Result<Completion, ProviderFailure>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("no model candidates resolved for strength {strength}")]
    NoCandidates { strength: f64 },
    #[error("fatal provider failure from {model}: {reason}")]
    Fatal {
        model: String,
        reason: String,
        cost_so_far: f64,
    },
    #[error("all {count} model candidates exhausted")]
    AllCandidatesExhausted {
        count: usize,
        failures: Vec<String>,
        cost_so_far: f64,
    },
}

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<ChatMessage>,
    pub strength: f64,
    pub temperature: f64,
    pub schema: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub cost: f64,
    pub model: String,
}

/// Tries candidate models in strength order until one succeeds.
///
/// The canonical message list in `request` is adapted per candidate on a
/// clone; it is byte-for-byte identical before every attempt, no matter
/// which providers came earlier in the loop. Cost accumulates only for
/// completed attempts plus any partial billing a failed attempt reported.
pub fn llm_invoke(
    request: &LlmRequest,
    backend: &dyn CompletionBackend,
) -> Result<LlmResponse, LlmError> {
    let candidates = resolve_candidates(request.strength);
    if candidates.is_empty() {
        return Err(LlmError::NoCandidates {
            strength: request.strength,
        });
    }

    let mut failures = Vec::new();
    let mut cost_so_far = 0.0;

    for candidate in &candidates {
        let payload = adapt_request(
            &request.messages,
            candidate,
            request.temperature,
            request.schema.as_ref(),
        );
        match backend.complete(&payload) {
            Ok(completion) => {
                return Ok(LlmResponse {
                    text: completion.text,
                    cost: cost_so_far + completion.cost,
                    model: candidate.model.to_string(),
                });
            }
            Err(failure) => {
                cost_so_far += failure.billed;
                if !failure.kind.is_retryable() {
                    return Err(LlmError::Fatal {
                        model: candidate.model.to_string(),
                        reason: failure.to_string(),
                        cost_so_far,
                    });
                }
                failures.push(format!("{}: {failure}", candidate.model));
            }
        }
    }

    Err(LlmError::AllCandidatesExhausted {
        count: candidates.len(),
        failures,
        cost_so_far,
    })
}

fn provider_endpoint(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Groq => "https://api.groq.com/openai/v1/chat/completions",
        LlmProvider::OpenAi => "https://api.openai.com/v1/chat/completions",
        LlmProvider::Anthropic => "https://api.anthropic.com/v1/chat/completions",
    }
}

fn provider_key_env(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Groq => "GROQ_API_KEY",
        LlmProvider::OpenAi => "OPENAI_API_KEY",
        LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
    }
}

/// Blocking HTTP transport for the chat-completions shape the three
/// providers share. Every request carries the configured timeout.
#[derive(Debug, Clone)]
pub struct HttpCompletionBackend {
    pub timeout: Duration,
}

impl Default for HttpCompletionBackend {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
        }
    }
}

impl HttpCompletionBackend {
    fn request_body(payload: &ProviderPayload) -> Value {
        let mut body = serde_json::json!({
            "model": payload.model,
            "temperature": payload.temperature,
            "messages": payload.messages,
        });
        if let Some(format) = &payload.response_format {
            body["response_format"] = format.clone();
        }
        body
    }

    fn classify_status(status: u16, body: String) -> ProviderFailure {
        let kind = match status {
            429 => FailureKind::RateLimited,
            401 | 403 => FailureKind::Auth,
            400 | 404 | 422 => FailureKind::InvalidRequest,
            _ => FailureKind::Network,
        };
        ProviderFailure {
            kind,
            reason: format!("http {status}: {body}"),
            billed: 0.0,
        }
    }

    fn priced_cost(model: &str, usage: &Value) -> f64 {
        let Some(candidate) = candidate_for_model(model) else {
            return 0.0;
        };
        let prompt_tokens = usage["prompt_tokens"].as_f64().unwrap_or(0.0);
        let completion_tokens = usage["completion_tokens"].as_f64().unwrap_or(0.0);
        (prompt_tokens * candidate.input_cost_per_million
            + completion_tokens * candidate.output_cost_per_million)
            / 1_000_000.0
    }
}

impl CompletionBackend for HttpCompletionBackend {
    fn complete(&self, payload: &ProviderPayload) -> Result<Completion, ProviderFailure> {
        let key =
            std::env::var(provider_key_env(payload.provider)).map_err(|_| ProviderFailure {
                kind: FailureKind::Auth,
                reason: format!("{} is not set", provider_key_env(payload.provider)),
                billed: 0.0,
            })?;

        let response = ureq::post(provider_endpoint(payload.provider))
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {key}"))
            .send_json(Self::request_body(payload))
            .map_err(|err| match err {
                ureq::Error::Status(status, response) => Self::classify_status(
                    status,
                    response.into_string().unwrap_or_default(),
                ),
                ureq::Error::Transport(transport) => ProviderFailure {
                    kind: FailureKind::Network,
                    reason: transport.to_string(),
                    billed: 0.0,
                },
            })?;

        let value: Value = response.into_json().map_err(|err| ProviderFailure {
            kind: FailureKind::Network,
            reason: format!("malformed completion body: {err}"),
            billed: 0.0,
        })?;

        let text = value["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderFailure {
                kind: FailureKind::Network,
                reason: "completion body missing message content".to_string(),
                billed: 0.0,
            })?;

        Ok(Completion {
            cost: Self::priced_cost(&payload.model, &value["usage"]),
            text,
        })
    }
}
