use crate::agent::{resolve_agent_binaries, CliTaskRunner};
use crate::app::cli::{help_text, parse_cli_verb, CliVerb};
use crate::cloud::{force_local, CloudConfig};
use crate::commands::{
    fix_files, run_generate, run_test_gen, CloudLocalFixEngine, CommandOutcome, FixFileSpec,
    GenerateRequest, TestGenRequest,
};
use crate::config::{load_settings, state_root, Settings};
use crate::git::ReconcileOptions;
use crate::llm::HttpCompletionBackend;
use crate::workflow::{
    run_bug_workflow, run_e2e_fix_workflow, BugWorkflowRequest, E2eFixRequest, WorkflowOutcome,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Generate => cmd_generate(&args[1..]),
        CliVerb::Test => cmd_test(&args[1..]),
        CliVerb::Fix => cmd_fix(&args[1..]),
        CliVerb::Bug => cmd_bug(&args[1..]),
        CliVerb::E2eFix => cmd_e2e_fix(&args[1..]),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}

struct ParsedArgs {
    positional: Vec<String>,
    options: BTreeMap<String, String>,
    switches: BTreeSet<String>,
}

fn split_args(
    args: &[String],
    value_flags: &[&str],
    switch_flags: &[&str],
) -> Result<ParsedArgs, String> {
    let mut parsed = ParsedArgs {
        positional: Vec::new(),
        options: BTreeMap::new(),
        switches: BTreeSet::new(),
    };
    let mut index = 0;
    while index < args.len() {
        let arg = &args[index];
        if let Some(name) = arg.strip_prefix("--") {
            if switch_flags.contains(&name) {
                parsed.switches.insert(name.to_string());
            } else if value_flags.contains(&name) {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| format!("--{name} requires a value"))?;
                parsed.options.insert(name.to_string(), value.clone());
                index += 1;
            } else {
                return Err(format!("unknown flag --{name}"));
            }
        } else {
            parsed.positional.push(arg.clone());
        }
        index += 1;
    }
    Ok(parsed)
}

fn read_input_file(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))
}

fn command_context() -> Result<(PathBuf, Settings), String> {
    let cwd = std::env::current_dir().map_err(|e| e.to_string())?;
    let settings = load_settings(&state_root(&cwd)).map_err(|e| e.to_string())?;
    Ok((cwd, settings))
}

fn cloud_config(settings: &Settings) -> Option<CloudConfig> {
    if force_local() {
        return None;
    }
    Some(CloudConfig::from_env(Duration::from_secs(
        settings.cloud_timeout_seconds,
    )))
}

fn reconcile_options(settings: &Settings) -> ReconcileOptions {
    ReconcileOptions {
        push_retries: settings.push_retries,
        push_backoff: Duration::from_millis(settings.push_backoff_ms),
    }
}

fn finish_command(
    verb: &str,
    outcome: CommandOutcome,
    output_path: Option<&String>,
) -> Result<String, String> {
    if !outcome.success {
        return Err(format!(
            "{verb} failed: {} (cost ${:.4}, model {})",
            outcome.content, outcome.cost, outcome.model
        ));
    }
    let body = match output_path {
        Some(path) => {
            std::fs::write(path, &outcome.content)
                .map_err(|e| format!("failed to write {path}: {e}"))?;
            format!("Wrote {path}")
        }
        None => outcome.content,
    };
    Ok(format!(
        "{body}\n\nCost: ${:.4}  Model: {}",
        outcome.cost, outcome.model
    ))
}

fn cmd_generate(args: &[String]) -> Result<String, String> {
    let parsed = split_args(args, &["example", "language", "output"], &[])?;
    let prompt_path = parsed
        .positional
        .first()
        .ok_or("usage: generate <prompt-file> [--example <file>] [--language <lang>] [--output <file>]")?;
    let (_cwd, settings) = command_context()?;

    let request = GenerateRequest {
        prompt: read_input_file(prompt_path)?,
        example: parsed
            .options
            .get("example")
            .map(|p| read_input_file(p))
            .transpose()?,
        language: parsed
            .options
            .get("language")
            .cloned()
            .unwrap_or_else(|| "rust".to_string()),
    };
    let outcome = run_generate(
        &request,
        &settings,
        cloud_config(&settings).as_ref(),
        &HttpCompletionBackend::default(),
    );
    finish_command("generate", outcome, parsed.options.get("output"))
}

fn cmd_test(args: &[String]) -> Result<String, String> {
    let parsed = split_args(args, &["code", "example", "language", "output"], &[])?;
    let prompt_path = parsed
        .positional
        .first()
        .ok_or("usage: test <prompt-file> [--code <file>] [--example <file>] [--language <lang>] [--output <file>]")?;
    let (_cwd, settings) = command_context()?;

    let request = TestGenRequest {
        prompt: read_input_file(prompt_path)?,
        code: parsed
            .options
            .get("code")
            .map(|p| read_input_file(p))
            .transpose()?,
        example: parsed
            .options
            .get("example")
            .map(|p| read_input_file(p))
            .transpose()?,
        language: parsed
            .options
            .get("language")
            .cloned()
            .unwrap_or_else(|| "rust".to_string()),
    };
    let outcome = run_test_gen(
        &request,
        &settings,
        cloud_config(&settings).as_ref(),
        &HttpCompletionBackend::default(),
    );
    finish_command("test", outcome, parsed.options.get("output"))
}

fn cmd_fix(args: &[String]) -> Result<String, String> {
    let parsed = split_args(args, &["error", "language"], &[])?;
    if parsed.positional.len() < 3 {
        return Err(
            "usage: fix <prompt-file> <code-file> <test-file>... [--error <file>] [--language <lang>]"
                .to_string(),
        );
    }
    let prompt = read_input_file(&parsed.positional[0])?;
    let code_path = parsed.positional[1].clone();
    let code = read_input_file(&code_path)?;
    let error_content = parsed
        .options
        .get("error")
        .map(|p| read_input_file(p))
        .transpose()?
        .unwrap_or_default();
    let language = parsed
        .options
        .get("language")
        .cloned()
        .unwrap_or_else(|| "rust".to_string());
    let (_cwd, settings) = command_context()?;

    let files: Vec<FixFileSpec> = parsed.positional[2..]
        .iter()
        .map(|test_path| {
            Ok(FixFileSpec {
                name: test_path.clone(),
                code: code.clone(),
                unit_test: read_input_file(test_path)?,
                error: error_content.clone(),
            })
        })
        .collect::<Result<_, String>>()?;

    let cloud = cloud_config(&settings);
    let backend = HttpCompletionBackend::default();
    let engine = CloudLocalFixEngine {
        settings: &settings,
        cloud: cloud.as_ref(),
        backend: &backend,
        prompt,
    };
    let report = fix_files(
        &engine,
        &files,
        &language,
        settings.budget,
        settings.max_retries + 1,
    );

    if let Some(fixed) = report
        .files
        .iter()
        .rev()
        .find_map(|f| f.fixed_code.as_ref())
    {
        std::fs::write(&code_path, fixed)
            .map_err(|e| format!("failed to write {code_path}: {e}"))?;
    }

    let mut lines = Vec::new();
    for file in &report.files {
        let status = if !file.attempted {
            "skipped (budget exhausted)"
        } else if file.success {
            "fixed"
        } else {
            "failed"
        };
        lines.push(format!(
            "  {}: {status} ({} attempts, cost ${:.4}, model {})",
            file.name, file.attempts, file.cost, file.model
        ));
    }
    lines.push(format!(
        "Total cost: ${:.4} over {} attempts",
        report.total_cost, report.total_attempts
    ));
    let body = lines.join("\n");

    if report.success {
        Ok(format!("Fix complete; updated {code_path}\n{body}"))
    } else {
        Err(format!("fix did not repair every file\n{body}"))
    }
}

fn workflow_report(outcome: &WorkflowOutcome) -> String {
    let mut lines = vec![
        outcome.message.clone(),
        format!(
            "Cost: ${:.4}  Provider: {}",
            outcome.total_cost, outcome.provider
        ),
    ];
    for artifact in &outcome.artifacts {
        lines.push(format!("Created: {artifact}"));
    }
    for warning in &outcome.push_warnings {
        lines.push(format!("Warning: {warning}"));
    }
    lines.join("\n")
}

fn parse_issue_and_repo(parsed: &ParsedArgs, usage: &str) -> Result<(u64, String), String> {
    let issue = parsed
        .positional
        .first()
        .ok_or_else(|| usage.to_string())?
        .parse::<u64>()
        .map_err(|_| format!("issue number must be an integer\n{usage}"))?;
    let repo = parsed
        .positional
        .get(1)
        .ok_or_else(|| usage.to_string())?
        .clone();
    Ok((issue, repo))
}

fn cmd_bug(args: &[String]) -> Result<String, String> {
    let usage = "usage: bug <issue> <owner/repo> [--budget <usd>] [--max-retries <n>]";
    let parsed = split_args(args, &["budget", "max-retries"], &[])?;
    let (issue, repo) = parse_issue_and_repo(&parsed, usage)?;
    let (cwd, settings) = command_context()?;

    let mut request = BugWorkflowRequest::new(issue, &repo, cwd, settings.budget);
    if let Some(budget) = parsed.options.get("budget") {
        request.budget = budget
            .parse()
            .map_err(|_| "budget must be a number".to_string())?;
    }
    request.max_retries = match parsed.options.get("max-retries") {
        Some(raw) => raw
            .parse()
            .map_err(|_| "max-retries must be an integer".to_string())?,
        None => settings.max_retries,
    };
    request.timeout = Duration::from_secs(settings.agent_timeout_seconds);
    request.reconcile_options = reconcile_options(&settings);

    let runner = CliTaskRunner::new(resolve_agent_binaries());
    let outcome = run_bug_workflow(&request, &runner).map_err(|e| e.to_string())?;
    let report = workflow_report(&outcome);
    if outcome.success {
        Ok(report)
    } else {
        Err(report)
    }
}

fn cmd_e2e_fix(args: &[String]) -> Result<String, String> {
    let usage = "usage: e2e-fix <issue> <owner/repo> [--budget <usd>] [--max-cycles <n>] [--resume]";
    let parsed = split_args(args, &["budget", "max-cycles", "max-retries"], &["resume"])?;
    let (issue, repo) = parse_issue_and_repo(&parsed, usage)?;
    let (cwd, settings) = command_context()?;

    let mut request = E2eFixRequest::new(issue, &repo, cwd, settings.budget);
    if let Some(budget) = parsed.options.get("budget") {
        request.budget = budget
            .parse()
            .map_err(|_| "budget must be a number".to_string())?;
    }
    if let Some(cycles) = parsed.options.get("max-cycles") {
        request.max_cycles = cycles
            .parse()
            .map_err(|_| "max-cycles must be an integer".to_string())?;
    }
    request.max_retries = match parsed.options.get("max-retries") {
        Some(raw) => raw
            .parse()
            .map_err(|_| "max-retries must be an integer".to_string())?,
        None => settings.max_retries,
    };
    request.resume = parsed.switches.contains("resume");
    request.timeout = Duration::from_secs(settings.agent_timeout_seconds);
    request.reconcile_options = reconcile_options(&settings);

    let runner = CliTaskRunner::new(resolve_agent_binaries());
    let outcome = run_e2e_fix_workflow(&request, &runner).map_err(|e| e.to_string())?;
    let report = workflow_report(&outcome);
    if outcome.success {
        Ok(report)
    } else {
        Err(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_args_print_help() {
        let output = run_cli(Vec::new()).unwrap();
        assert!(output.contains("Commands:"));
    }

    #[test]
    fn unknown_verb_is_an_error() {
        let err = run_cli(vec!["deploy".to_string()]).unwrap_err();
        assert!(err.contains("deploy"));
    }

    #[test]
    fn split_args_separates_flags_and_positionals() {
        let args: Vec<String> = ["p.md", "--budget", "2.5", "--resume", "extra"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let parsed = split_args(&args, &["budget"], &["resume"]).unwrap();
        assert_eq!(parsed.positional, vec!["p.md", "extra"]);
        assert_eq!(parsed.options.get("budget"), Some(&"2.5".to_string()));
        assert!(parsed.switches.contains("resume"));
    }

    #[test]
    fn split_args_rejects_unknown_and_dangling_flags() {
        let args = vec!["--mystery".to_string()];
        assert!(split_args(&args, &["budget"], &[]).is_err());
        let args = vec!["--budget".to_string()];
        assert!(split_args(&args, &["budget"], &[]).is_err());
    }

    #[test]
    fn bug_requires_a_numeric_issue() {
        let err = cmd_bug(&["not-a-number".to_string(), "acme/app".to_string()]).unwrap_err();
        assert!(err.contains("issue number"));
    }
}
