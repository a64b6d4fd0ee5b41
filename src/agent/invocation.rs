use crate::agent::AgentProvider;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInvocation {
    pub binary: PathBuf,
    pub args: Vec<String>,
    /// Text piped to the child's stdin (anthropic reads the pointer there).
    pub stdin_payload: Option<String>,
}

/// Builds the exact argument vector for one provider.
///
/// These grammars are version-pinned by position, not just presence. The
/// gemini CLI in particular drops into interactive mode and hangs forever
/// unless `-p` immediately precedes the pointer text.
pub fn build_agent_invocation(
    provider: AgentProvider,
    binary: &Path,
    pointer: &str,
) -> AgentInvocation {
    let (args, stdin_payload) = match provider {
        AgentProvider::Anthropic => (
            vec![
                "-p".to_string(),
                "-".to_string(),
                "--output-format".to_string(),
                "json".to_string(),
                "--dangerously-skip-permissions".to_string(),
            ],
            Some(pointer.to_string()),
        ),
        AgentProvider::Google => (
            vec![
                "-p".to_string(),
                pointer.to_string(),
                "--yolo".to_string(),
                "--output-format".to_string(),
                "json".to_string(),
            ],
            None,
        ),
        AgentProvider::OpenAi => (
            vec![
                "exec".to_string(),
                "--full-auto".to_string(),
                "--json".to_string(),
                pointer.to_string(),
            ],
            None,
        ),
    };
    AgentInvocation {
        binary: binary.to_path_buf(),
        args,
        stdin_payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTER: &str = "Read the file step1_instructions.md for your full instructions and execute them.";

    #[test]
    fn google_places_pointer_immediately_after_p_flag() {
        let spec = build_agent_invocation(AgentProvider::Google, Path::new("gemini"), POINTER);
        let p_index = spec
            .args
            .iter()
            .position(|arg| arg == "-p")
            .expect("-p present");
        assert_eq!(spec.args[p_index + 1], POINTER);
        assert!(spec.args.contains(&"--yolo".to_string()));
        let format_index = spec
            .args
            .iter()
            .position(|arg| arg == "--output-format")
            .expect("--output-format present");
        assert_eq!(spec.args[format_index + 1], "json");
        assert!(spec.stdin_payload.is_none());
    }

    #[test]
    fn anthropic_reads_pointer_from_stdin() {
        let spec = build_agent_invocation(AgentProvider::Anthropic, Path::new("claude"), POINTER);
        let p_index = spec
            .args
            .iter()
            .position(|arg| arg == "-p")
            .expect("-p present");
        assert_eq!(spec.args[p_index + 1], "-");
        assert_eq!(spec.stdin_payload.as_deref(), Some(POINTER));
        assert!(spec
            .args
            .contains(&"--dangerously-skip-permissions".to_string()));
    }

    #[test]
    fn openai_uses_exec_full_auto() {
        let spec = build_agent_invocation(AgentProvider::OpenAi, Path::new("codex"), POINTER);
        assert_eq!(spec.args[0], "exec");
        assert!(spec.args.contains(&"--full-auto".to_string()));
        assert!(spec.args.contains(&"--json".to_string()));
        assert_eq!(spec.args.last().map(String::as_str), Some(POINTER));
    }
}
