use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.promptdriven.dev/v1";

#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("no cloud credentials available")]
    MissingToken,
    #[error("cloud request to {route} failed with status {status}: {body}")]
    Http {
        route: String,
        status: u16,
        body: String,
    },
    #[error("cloud transport failure for {route}: {reason}")]
    Transport { route: String, reason: String },
    #[error("malformed cloud response from {route}: {reason}")]
    MalformedResponse { route: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct CloudConfig {
    pub api_base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl CloudConfig {
    pub fn from_env(timeout: Duration) -> Self {
        Self {
            api_base_url: std::env::var("PDD_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            token: std::env::var("PDD_JWT_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout,
        }
    }

    fn endpoint(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}

/// `PDD_FORCE_LOCAL=1` skips the cloud attempt entirely.
pub fn force_local() -> bool {
    std::env::var("PDD_FORCE_LOCAL").map(|v| v == "1").unwrap_or(false)
}

/// What a successful cloud (or local fallback) operation produces.
#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    pub content: String,
    pub cost: f64,
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTestPayload {
    pub prompt_content: String,
    pub code_content: Option<String>,
    pub example_content: Option<String>,
    pub language: String,
    pub strength: f64,
    pub temperature: f64,
    pub time: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCodePayload {
    pub prompt_content: String,
    pub example_content: Option<String>,
    pub language: String,
    pub strength: f64,
    pub temperature: f64,
    pub time: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixCodePayload {
    pub prompt_content: String,
    pub code_content: String,
    pub unit_test_content: String,
    pub error_content: String,
    pub language: String,
    pub strength: f64,
    pub temperature: f64,
    pub time: f64,
}

fn post_json<B: Serialize>(
    config: &CloudConfig,
    route: &str,
    body: &B,
) -> Result<Value, CloudError> {
    let token = config.token.as_ref().ok_or(CloudError::MissingToken)?;
    let url = config.endpoint(route);

    let response = ureq::post(&url)
        .timeout(config.timeout)
        .set("Authorization", &format!("Bearer {token}"))
        .send_json(serde_json::to_value(body).map_err(|e| CloudError::Transport {
            route: route.to_string(),
            reason: e.to_string(),
        })?)
        .map_err(|err| match err {
            ureq::Error::Status(status, response) => CloudError::Http {
                route: route.to_string(),
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => CloudError::Transport {
                route: route.to_string(),
                reason: transport.to_string(),
            },
        })?;

    response.into_json::<Value>().map_err(|e| CloudError::MalformedResponse {
        route: route.to_string(),
        reason: e.to_string(),
    })
}

fn artifact_from_response(
    route: &str,
    value: &Value,
    content_key: &str,
) -> Result<GeneratedArtifact, CloudError> {
    let content = value[content_key]
        .as_str()
        .ok_or_else(|| CloudError::MalformedResponse {
            route: route.to_string(),
            reason: format!("missing `{content_key}`"),
        })?
        .to_string();
    Ok(GeneratedArtifact {
        content,
        cost: value["totalCost"].as_f64().unwrap_or(0.0),
        model: value["modelName"]
            .as_str()
            .unwrap_or("cloud-model")
            .to_string(),
    })
}

pub fn generate_test_remote(
    config: &CloudConfig,
    payload: &GenerateTestPayload,
) -> Result<GeneratedArtifact, CloudError> {
    let value = post_json(config, "generateTest", payload)?;
    artifact_from_response("generateTest", &value, "generatedTest")
}

pub fn generate_code_remote(
    config: &CloudConfig,
    payload: &GenerateCodePayload,
) -> Result<GeneratedArtifact, CloudError> {
    let value = post_json(config, "generateCode", payload)?;
    artifact_from_response("generateCode", &value, "generatedCode")
}

pub fn fix_code_remote(
    config: &CloudConfig,
    payload: &FixCodePayload,
) -> Result<GeneratedArtifact, CloudError> {
    let value = post_json(config, "fixCode", payload)?;
    artifact_from_response("fixCode", &value, "fixedCode")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> CloudConfig {
        CloudConfig {
            // Closed local port: fails fast without touching the network.
            api_base_url: "http://127.0.0.1:9".to_string(),
            token: Some("test-token".to_string()),
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn missing_token_is_reported_before_any_request() {
        let config = CloudConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            token: None,
            timeout: Duration::from_millis(200),
        };
        let payload = GenerateTestPayload {
            prompt_content: "p".to_string(),
            code_content: Some("c".to_string()),
            example_content: None,
            language: "rust".to_string(),
            strength: 0.5,
            temperature: 0.0,
            time: 0.5,
        };
        match generate_test_remote(&config, &payload) {
            Err(CloudError::MissingToken) => {}
            other => panic!("expected MissingToken, got {other:?}"),
        }
    }

    #[test]
    fn transport_failure_surfaces_as_cloud_error() {
        let payload = GenerateTestPayload {
            prompt_content: "p".to_string(),
            code_content: Some("c".to_string()),
            example_content: None,
            language: "rust".to_string(),
            strength: 0.5,
            temperature: 0.0,
            time: 0.5,
        };
        match generate_test_remote(&unreachable_config(), &payload) {
            Err(CloudError::Transport { route, .. }) => assert_eq!(route, "generateTest"),
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn endpoint_join_tolerates_trailing_and_leading_slashes() {
        let config = CloudConfig {
            api_base_url: "http://example.invalid/v1/".to_string(),
            token: None,
            timeout: Duration::from_secs(1),
        };
        assert_eq!(
            config.endpoint("/generateTest"),
            "http://example.invalid/v1/generateTest"
        );
    }
}
