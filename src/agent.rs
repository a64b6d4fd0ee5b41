use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod binaries;
pub mod invocation;
pub mod output_parse;
pub mod prompt_files;
pub mod runner;

pub use binaries::{find_cli_binary, resolve_agent_binaries, select_provider, AgentBinaries};
pub use invocation::{build_agent_invocation, AgentInvocation};
pub use output_parse::{parse_agent_stdout, ParsedAgentOutput};
pub use prompt_files::{instruction_pointer, write_instruction_file};
pub use runner::{CliTaskRunner, TaskOutcome, TaskRequest, TaskRunner};

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("no coding-agent CLI found; install one of: claude, gemini, codex")]
    NoAgentCli,
    #[error("agent process failed for {provider} with exit code {exit_code}: {stderr}")]
    NonZeroExit {
        provider: AgentProvider,
        exit_code: i32,
        stderr: String,
    },
    #[error("agent process timed out for {provider} after {timeout_ms}ms")]
    Timeout {
        provider: AgentProvider,
        timeout_ms: u64,
    },
    #[error("agent output parse failure for {provider}: {reason}")]
    MalformedOutput {
        provider: AgentProvider,
        reason: String,
    },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Providers in probe preference order: anthropic, then google, then openai.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentProvider {
    Anthropic,
    Google,
    OpenAi,
}

impl AgentProvider {
    pub const PREFERENCE_ORDER: [AgentProvider; 3] = [
        AgentProvider::Anthropic,
        AgentProvider::Google,
        AgentProvider::OpenAi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::OpenAi => "openai",
        }
    }

    pub fn cli_name(self) -> &'static str {
        match self {
            Self::Anthropic => "claude",
            Self::Google => "gemini",
            Self::OpenAi => "codex",
        }
    }
}

impl std::fmt::Display for AgentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedAgent {
    pub provider: AgentProvider,
    pub binary: PathBuf,
}

/// Wall-clock ceiling applied to every agent subprocess.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(900);

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> AgentError {
    AgentError::Io {
        path: path.display().to_string(),
        source,
    }
}
