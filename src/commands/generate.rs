use crate::cloud::{generate_code_remote, CloudConfig, GenerateCodePayload};
use crate::commands::{local_outcome, CommandOutcome};
use crate::config::Settings;
use crate::llm::{ChatMessage, CompletionBackend, LlmRequest};

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub example: Option<String>,
    pub language: String,
}

fn local_messages(request: &GenerateRequest) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(format!(
        "You are an expert {} developer. Generate complete, working source code \
         from the prompt. Respond with code only.",
        request.language
    ))];
    if let Some(example) = &request.example {
        messages.push(ChatMessage::user(format!(
            "Reference example:\n{example}"
        )));
    }
    messages.push(ChatMessage::user(request.prompt.clone()));
    messages
}

/// Generate source code from a prompt. Tries the cloud API when a config
/// is supplied, then falls back to the local invocation engine on any
/// cloud failure.
pub fn run_generate(
    request: &GenerateRequest,
    settings: &Settings,
    cloud: Option<&CloudConfig>,
    backend: &dyn CompletionBackend,
) -> CommandOutcome {
    if let Some(config) = cloud {
        let payload = GenerateCodePayload {
            prompt_content: request.prompt.clone(),
            example_content: request.example.clone(),
            language: request.language.clone(),
            strength: settings.strength,
            temperature: settings.temperature,
            time: settings.time,
        };
        if let Ok(artifact) = generate_code_remote(config, &payload) {
            return CommandOutcome {
                success: true,
                content: artifact.content,
                cost: artifact.cost,
                model: artifact.model,
            };
        }
    }

    let llm_request = LlmRequest {
        messages: local_messages(request),
        strength: settings.strength,
        temperature: settings.temperature,
        schema: None,
    };
    local_outcome(&llm_request, backend)
}
