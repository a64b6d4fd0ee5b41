use crate::agent::{AgentError, AgentProvider, ResolvedAgent};
use std::path::{Path, PathBuf};

/// Binary names (or absolute paths) for each provider's CLI, overridable
/// for tests and nonstandard installs via `PDD_AGENT_BIN_*`.
#[derive(Debug, Clone)]
pub struct AgentBinaries {
    pub anthropic: String,
    pub google: String,
    pub openai: String,
}

impl Default for AgentBinaries {
    fn default() -> Self {
        Self {
            anthropic: "claude".to_string(),
            google: "gemini".to_string(),
            openai: "codex".to_string(),
        }
    }
}

impl AgentBinaries {
    pub fn for_provider(&self, provider: AgentProvider) -> &str {
        match provider {
            AgentProvider::Anthropic => &self.anthropic,
            AgentProvider::Google => &self.google,
            AgentProvider::OpenAi => &self.openai,
        }
    }
}

pub fn resolve_agent_binaries() -> AgentBinaries {
    AgentBinaries {
        anthropic: std::env::var("PDD_AGENT_BIN_ANTHROPIC")
            .unwrap_or_else(|_| "claude".to_string()),
        google: std::env::var("PDD_AGENT_BIN_GOOGLE").unwrap_or_else(|_| "gemini".to_string()),
        openai: std::env::var("PDD_AGENT_BIN_OPENAI").unwrap_or_else(|_| "codex".to_string()),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// PATH probe. A name containing a separator is treated as a direct path.
pub fn find_cli_binary(name: &str) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.components().count() > 1 {
        return is_executable(direct).then(|| direct.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// Picks the first installed agent CLI in preference order.
pub fn select_provider(binaries: &AgentBinaries) -> Result<ResolvedAgent, AgentError> {
    for provider in AgentProvider::PREFERENCE_ORDER {
        if let Some(binary) = find_cli_binary(binaries.for_provider(provider)) {
            return Ok(ResolvedAgent { provider, binary });
        }
    }
    Err(AgentError::NoAgentCli)
}
