use crate::agent::{io_error, AgentError};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the full instruction text under `.pdd/agent_prompts/` and returns
/// its path. The command line only ever carries a short pointer to this
/// file, never the instruction body itself.
pub fn write_instruction_file(
    cwd: &Path,
    label: &str,
    instruction: &str,
) -> Result<PathBuf, AgentError> {
    let state_root = crate::config::ensure_state_root(cwd).map_err(|err| io_error(cwd, err))?;
    let prompt_dir = state_root.join("agent_prompts");
    fs::create_dir_all(&prompt_dir).map_err(|err| io_error(&prompt_dir, err))?;
    let path = prompt_dir.join(format!("{label}_instructions.md"));
    fs::write(&path, instruction).map_err(|err| io_error(&path, err))?;
    Ok(path)
}

pub fn instruction_pointer(instruction_file: &Path) -> String {
    let name = instruction_file
        .file_name()
        .and_then(|v| v.to_str())
        .unwrap_or("instructions.md");
    format!(
        "Read the file .pdd/agent_prompts/{name} for your full instructions and execute them. Respond with a JSON object containing `success`, `output`, and `cost`."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn instruction_body_stays_off_the_command_line() {
        let dir = tempdir().expect("tempdir");
        let long_instruction = "x".repeat(64 * 1024);
        let path =
            write_instruction_file(dir.path(), "step3", &long_instruction).expect("write");

        assert_eq!(
            fs::read_to_string(&path).expect("read back"),
            long_instruction
        );
        let pointer = instruction_pointer(&path);
        assert!(pointer.contains("step3_instructions.md"));
        assert!(pointer.len() < 256);
    }

    #[test]
    fn rewriting_a_label_overwrites_the_previous_instruction() {
        let dir = tempdir().expect("tempdir");
        write_instruction_file(dir.path(), "step1", "first").expect("write");
        let path = write_instruction_file(dir.path(), "step1", "second").expect("rewrite");
        assert_eq!(fs::read_to_string(&path).expect("read"), "second");
    }
}
