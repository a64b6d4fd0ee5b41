use crate::agent::{AgentError, AgentProvider};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAgentOutput {
    pub success: bool,
    pub content: String,
    pub cost: f64,
}

/// Parses one agent CLI's stdout.
///
/// The subprocess contract is a single JSON object with `success`,
/// `output` (or `content`), and `cost`. Anything else (empty stdout,
/// non-JSON text, a missing `success` flag, empty content) is a parse
/// failure, never success-with-empty-output.
pub fn parse_agent_stdout(
    provider: AgentProvider,
    stdout: &str,
) -> Result<ParsedAgentOutput, AgentError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(AgentError::MalformedOutput {
            provider,
            reason: "stdout was empty".to_string(),
        });
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|err| AgentError::MalformedOutput {
            provider,
            reason: format!("stdout is not a JSON object: {err}"),
        })?;

    let object = value.as_object().ok_or_else(|| AgentError::MalformedOutput {
        provider,
        reason: "stdout JSON is not an object".to_string(),
    })?;

    let content = object
        .get("output")
        .or_else(|| object.get("content"))
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    if content.is_empty() {
        return Err(AgentError::MalformedOutput {
            provider,
            reason: "response content was empty".to_string(),
        });
    }

    let success = object
        .get("success")
        .and_then(Value::as_bool)
        .ok_or_else(|| AgentError::MalformedOutput {
            provider,
            reason: "`success` flag is missing or not a boolean".to_string(),
        })?;

    Ok(ParsedAgentOutput {
        success,
        content: content.to_string(),
        cost: object.get("cost").and_then(Value::as_f64).unwrap_or(0.0),
    })
}
