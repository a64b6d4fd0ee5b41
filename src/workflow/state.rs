use crate::config::state_root;
use crate::workflow::run::StepRecord;
use crate::workflow::{io_error, WorkflowError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Completed-step checkpoint written after every step so an interrupted
/// run can resume without repeating paid agent calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    pub issue: u64,
    pub completed: Vec<StepRecord>,
    pub total_cost: f64,
}

pub fn state_path(cwd: &Path, workflow: &str, issue: u64) -> PathBuf {
    state_root(cwd)
        .join("workflow_state")
        .join(format!("{workflow}_{issue}.json"))
}

pub fn save_state(cwd: &Path, workflow: &str, state: &PersistedState) -> Result<(), WorkflowError> {
    crate::config::ensure_state_root(cwd).map_err(|e| io_error(cwd, e))?;
    let path = state_path(cwd, workflow, state.issue);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    let body = serde_json::to_string_pretty(state)?;
    std::fs::write(&path, body).map_err(|e| io_error(&path, e))
}

pub fn load_state(
    cwd: &Path,
    workflow: &str,
    issue: u64,
) -> Result<Option<PersistedState>, WorkflowError> {
    let path = state_path(cwd, workflow, issue);
    let body = match std::fs::read_to_string(&path) {
        Ok(body) => body,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_error(&path, err)),
    };
    Ok(Some(serde_json::from_str(&body)?))
}

pub fn clear_state(cwd: &Path, workflow: &str, issue: u64) -> Result<(), WorkflowError> {
    let path = state_path(cwd, workflow, issue);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_error(&path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::marker::StepSignal;

    fn sample_state() -> PersistedState {
        PersistedState {
            issue: 21,
            completed: vec![StepRecord {
                label: "step1".to_string(),
                output: "ran suite".to_string(),
                signal: StepSignal::Continue,
                cost: 0.25,
                provider: "google".to_string(),
                success: true,
            }],
            total_cost: 0.25,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let state = sample_state();
        save_state(dir.path(), "e2e_fix", &state).unwrap();
        let loaded = load_state(dir.path(), "e2e_fix", 21).unwrap();
        assert_eq!(loaded, Some(state));
    }

    #[test]
    fn missing_state_loads_as_none_and_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_state(dir.path(), "e2e_fix", 99).unwrap(), None);
        clear_state(dir.path(), "e2e_fix", 99).unwrap();

        save_state(dir.path(), "e2e_fix", &sample_state()).unwrap();
        clear_state(dir.path(), "e2e_fix", 21).unwrap();
        clear_state(dir.path(), "e2e_fix", 21).unwrap();
        assert_eq!(load_state(dir.path(), "e2e_fix", 21).unwrap(), None);
    }
}
