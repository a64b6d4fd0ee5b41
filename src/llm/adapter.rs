use crate::llm::catalog::ModelCandidate;
use crate::llm::messages::{ChatMessage, Role};
use crate::llm::LlmProvider;
use serde_json::{json, Value};

/// Provider-ready request body. Always owns its message list: building a
/// payload must never alias or mutate the caller's messages, because the
/// same canonical list is reused for every candidate in the retry loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPayload {
    pub provider: LlmProvider,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub response_format: Option<Value>,
}

fn schema_instruction(schema: &Value) -> String {
    format!(
        "You must respond with valid JSON matching this schema:\n```json\n{schema}\n```\nRespond ONLY with the JSON object, no other text."
    )
}

/// Builds the provider-specific payload for one candidate.
///
/// Groq has no first-class structured-output field, so the schema is
/// injected in-band into the system message of the cloned list only. The
/// other providers carry the schema as a `response_format` field and keep
/// the messages verbatim.
pub fn adapt_request(
    messages: &[ChatMessage],
    candidate: &ModelCandidate,
    temperature: f64,
    schema: Option<&Value>,
) -> ProviderPayload {
    let mut adapted: Vec<ChatMessage> = messages.to_vec();
    let mut response_format = None;

    if let Some(schema) = schema {
        match candidate.provider {
            LlmProvider::Groq => {
                let instruction = schema_instruction(schema);
                match adapted.first_mut() {
                    Some(first) if first.role == Role::System => {
                        first.content = format!("{instruction}\n\n{}", first.content);
                    }
                    _ => adapted.insert(0, ChatMessage::system(instruction)),
                }
            }
            LlmProvider::OpenAi | LlmProvider::Anthropic => {
                response_format = Some(json!({
                    "type": "json_schema",
                    "json_schema": schema.clone(),
                }));
            }
        }
    }

    ProviderPayload {
        provider: candidate.provider,
        model: candidate.model.to_string(),
        messages: adapted,
        temperature,
        response_format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::catalog::model_catalog;

    fn candidate(provider: LlmProvider) -> &'static ModelCandidate {
        model_catalog()
            .iter()
            .find(|c| c.provider == provider)
            .expect("provider in catalog")
    }

    fn sample_messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("You are a helpful coding assistant."),
            ChatMessage::user("Write a function that adds two numbers."),
        ]
    }

    #[test]
    fn groq_injects_schema_into_a_copy_only() {
        let messages = sample_messages();
        let schema = json!({"type": "object", "properties": {"code": {"type": "string"}}});

        let payload = adapt_request(&messages, candidate(LlmProvider::Groq), 0.1, Some(&schema));

        assert!(payload.messages[0]
            .content
            .contains("Respond ONLY with the JSON object"));
        assert!(payload.messages[0]
            .content
            .ends_with("You are a helpful coding assistant."));
        assert!(payload.response_format.is_none());
        // Original list is untouched.
        assert_eq!(messages, sample_messages());
    }

    #[test]
    fn groq_without_system_message_prepends_one() {
        let messages = vec![ChatMessage::user("hello")];
        let schema = json!({"type": "object"});

        let payload = adapt_request(&messages, candidate(LlmProvider::Groq), 0.0, Some(&schema));

        assert_eq!(payload.messages.len(), 2);
        assert_eq!(payload.messages[0].role, Role::System);
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn structured_output_providers_keep_messages_verbatim() {
        let messages = sample_messages();
        let schema = json!({"type": "object"});

        for provider in [LlmProvider::OpenAi, LlmProvider::Anthropic] {
            let payload = adapt_request(&messages, candidate(provider), 0.2, Some(&schema));
            assert_eq!(payload.messages, messages);
            let format = payload.response_format.expect("response_format set");
            assert_eq!(format["type"], "json_schema");
        }
    }

    #[test]
    fn no_schema_means_no_transformation_for_any_provider() {
        let messages = sample_messages();
        for provider in [LlmProvider::Groq, LlmProvider::OpenAi, LlmProvider::Anthropic] {
            let payload = adapt_request(&messages, candidate(provider), 0.2, None);
            assert_eq!(payload.messages, messages);
            assert!(payload.response_format.is_none());
        }
    }
}
