use std::path::Path;
use std::process::Command;

pub mod reconcile;
pub mod snapshot;

pub use reconcile::{reconcile, unpushed_commit_count, ReconcileOptions, ReconcileReport};
pub use snapshot::{tracked_file_hashes, FileHashSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git {context} failed: {stderr}")]
    Command { context: String, stderr: String },
    #[error("io error running git: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs a git subcommand in `cwd` and returns trimmed stdout.
pub fn run_git(cwd: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git").current_dir(cwd).args(args).output()?;
    if !output.status.success() {
        return Err(GitError::Command {
            context: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
