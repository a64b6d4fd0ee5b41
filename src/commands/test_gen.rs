use crate::cloud::{generate_test_remote, CloudConfig, GenerateTestPayload};
use crate::commands::{local_outcome, CommandOutcome};
use crate::config::Settings;
use crate::llm::{ChatMessage, CompletionBackend, LlmRequest};

#[derive(Debug, Clone)]
pub struct TestGenRequest {
    pub prompt: String,
    pub code: Option<String>,
    pub example: Option<String>,
    pub language: String,
}

fn local_messages(request: &TestGenRequest) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(format!(
        "You are an expert {} developer. Write a thorough unit test suite for the \
         code described by the prompt. Respond with test code only.",
        request.language
    ))];
    if let Some(code) = &request.code {
        messages.push(ChatMessage::user(format!("Code under test:\n{code}")));
    }
    if let Some(example) = &request.example {
        messages.push(ChatMessage::user(format!("Reference example:\n{example}")));
    }
    messages.push(ChatMessage::user(request.prompt.clone()));
    messages
}

/// Generate unit tests for a prompt/code pair, cloud first, local on any
/// cloud failure.
pub fn run_test_gen(
    request: &TestGenRequest,
    settings: &Settings,
    cloud: Option<&CloudConfig>,
    backend: &dyn CompletionBackend,
) -> CommandOutcome {
    if let Some(config) = cloud {
        let payload = GenerateTestPayload {
            prompt_content: request.prompt.clone(),
            code_content: request.code.clone(),
            example_content: request.example.clone(),
            language: request.language.clone(),
            strength: settings.strength,
            temperature: settings.temperature,
            time: settings.time,
        };
        if let Ok(artifact) = generate_test_remote(config, &payload) {
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
