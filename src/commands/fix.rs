use crate::cloud::{fix_code_remote, CloudConfig, FixCodePayload};
use crate::commands::{local_outcome, CommandOutcome};
use crate::config::Settings;
use crate::llm::{ChatMessage, CompletionBackend, LlmRequest};

/// One failing unit-test file queued for repair.
#[derive(Debug, Clone)]
pub struct FixFileSpec {
    pub name: String,
    pub code: String,
    pub unit_test: String,
    pub error: String,
}

/// Seam between the multi-file loop and whatever produces a single fix.
pub trait FixEngine {
    fn fix_once(&self, spec: &FixFileSpec, language: &str) -> CommandOutcome;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileFixRecord {
    pub name: String,
    pub attempted: bool,
    pub success: bool,
    pub attempts: u32,
    pub cost: f64,
    pub model: String,
    pub fixed_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixReport {
    pub success: bool,
    pub files: Vec<FileFixRecord>,
    pub total_cost: f64,
    pub total_attempts: u32,
    pub budget_exhausted: bool,
}

/// Repairs files strictly in order against one shared budget. Each file
/// gets up to `max_attempts` engine calls; a file is only attempted while
/// spend is below the budget, and everything after exhaustion is recorded
/// as unattempted with the report marked failed. All test files patch one
/// shared code file, so each repair starts from the latest successful fix
/// rather than the original code.
pub fn fix_files(
    engine: &dyn FixEngine,
    files: &[FixFileSpec],
    language: &str,
    budget: f64,
    max_attempts: u32,
) -> FixReport {
    let max_attempts = max_attempts.max(1);
    let mut records = Vec::with_capacity(files.len());
    let mut total_cost = 0.0;
    let mut total_attempts = 0;
    let mut budget_exhausted = false;
    let mut current_code: Option<String> = None;

    for spec in files {
        if budget_exhausted || total_cost >= budget {
            budget_exhausted = true;
            records.push(FileFixRecord {
                name: spec.name.clone(),
                attempted: false,
                success: false,
                attempts: 0,
                cost: 0.0,
                model: "none".to_string(),
                fixed_code: None,
            });
            continue;
        }

        let mut working = spec.clone();
        if let Some(code) = &current_code {
            working.code = code.clone();
        }

        let mut attempts = 1;
        let mut outcome = engine.fix_once(&working, language);
        let mut file_cost = outcome.cost;
        total_cost += outcome.cost;
        while !outcome.success && attempts < max_attempts && total_cost < budget {
            attempts += 1;
            outcome = engine.fix_once(&working, language);
            total_cost += outcome.cost;
            file_cost += outcome.cost;
        }
        total_attempts += attempts;

        if outcome.success {
            current_code = Some(outcome.content.clone());
        }
        records.push(FileFixRecord {
            name: spec.name.clone(),
            attempted: true,
            success: outcome.success,
            attempts,
            cost: file_cost,
            model: outcome.model,
            fixed_code: outcome.success.then_some(outcome.content),
        });
    }

    FixReport {
        success: !records.is_empty() && records.iter().all(|r| r.attempted && r.success),
        files: records,
        total_cost,
        total_attempts,
        budget_exhausted,
    }
}

/// Production engine: cloud fixCode route first, local invocation engine
/// on any cloud failure.
pub struct CloudLocalFixEngine<'a> {
    pub settings: &'a Settings,
    pub cloud: Option<&'a CloudConfig>,
    pub backend: &'a dyn CompletionBackend,
    pub prompt: String,
}

impl FixEngine for CloudLocalFixEngine<'_> {
    fn fix_once(&self, spec: &FixFileSpec, language: &str) -> CommandOutcome {
        if let Some(config) = self.cloud {
            let payload = FixCodePayload {
                prompt_content: self.prompt.clone(),
                code_content: spec.code.clone(),
                unit_test_content: spec.unit_test.clone(),
                error_content: spec.error.clone(),
                language: language.to_string(),
                strength: self.settings.strength,
                temperature: self.settings.temperature,
                time: self.settings.time,
            };
            if let Ok(artifact) = fix_code_remote(config, &payload) {
                return CommandOutcome {
                    success: true,
                    content: artifact.content,
                    cost: artifact.cost,
                    model: artifact.model,
                };
            }
        }

        let request = LlmRequest {
            messages: vec![
                ChatMessage::system(format!(
                    "You are an expert {language} developer. Repair the code so the \
                     failing unit test passes. Respond with the full corrected file."
                )),
                ChatMessage::user(format!(
                    "Code:\n{}\n\nFailing test:\n{}\n\nTest output:\n{}",
                    spec.code, spec.unit_test, spec.error
                )),
            ],
            strength: self.settings.strength,
            temperature: self.settings.temperature,
            schema: None,
        };
        local_outcome(&request, self.backend)
    }
}
