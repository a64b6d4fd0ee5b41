use crate::git::snapshot::{tracked_file_hashes, FileHashSnapshot};
use crate::git::{run_git, GitError};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub push_retries: u32,
    pub push_backoff: Duration,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            push_retries: 3,
            push_backoff: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub committed: bool,
    pub pushed: bool,
    pub warning: Option<String>,
}

/// Commits ahead of the upstream branch. A branch with no upstream
/// counts as fully pushed rather than failing the run; any other git
/// failure propagates.
pub fn unpushed_commit_count(cwd: &Path) -> Result<u64, GitError> {
    if run_git(cwd, &["rev-parse", "--abbrev-ref", "@{upstream}"]).is_err() {
        return Ok(0);
    }
    let count = run_git(cwd, &["rev-list", "--count", "@{upstream}..HEAD"])?;
    count.parse().map_err(|_| GitError::Command {
        context: "rev-list --count @{upstream}..HEAD".to_string(),
        stderr: format!("unexpected output: {count:?}"),
    })
}

/// Commits when the working tree differs from `pre_snapshot` and pushes
/// when the branch is ahead of upstream. Push is best-effort with
/// bounded linear backoff; a failed push surfaces as a warning so the
/// workflow keeps going.
pub fn reconcile(
    cwd: &Path,
    pre_snapshot: &FileHashSnapshot,
    message: &str,
    options: &ReconcileOptions,
) -> Result<ReconcileReport, GitError> {
    let mut report = ReconcileReport::default();

    let current = tracked_file_hashes(cwd)?;
    // The snapshot also moves when an earlier commit (made by the agent
    // itself) added tracked files, so confirm the tree is actually dirty
    // before committing.
    if &current != pre_snapshot && !run_git(cwd, &["status", "--porcelain"])?.is_empty() {
        run_git(cwd, &["add", "-A"])?;
        let stamped = format!(
            "{} ({})",
            message,
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        run_git(cwd, &["commit", "-m", &stamped])?;
        report.committed = true;
    }

    if unpushed_commit_count(cwd)? == 0 {
        return Ok(report);
    }

    let mut last_error = String::new();
    for attempt in 0..=options.push_retries {
        match run_git(cwd, &["push"]) {
            Ok(_) => {
                report.pushed = true;
                return Ok(report);
            }
            Err(GitError::Command { stderr, .. }) => {
                last_error = stderr;
                if attempt < options.push_retries {
                    std::thread::sleep(options.push_backoff * (attempt + 1));
                }
            }
            Err(other) => return Err(other),
        }
    }
    report.warning = Some(format!("push failed after retries: {last_error}"));
    Ok(report)
}
