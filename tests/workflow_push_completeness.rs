use pdd::agent::{AgentError, TaskOutcome, TaskRequest, TaskRunner};
use pdd::git::unpushed_commit_count;
use pdd::workflow::{run_e2e_fix_workflow, E2eFixRequest, RunStatus};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::tempdir;

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .current_dir(dir)
        .args(args)
        .status()
        .expect("spawn git");
    assert!(status.success(), "git {args:?} failed in {dir:?}");
}

fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .expect("spawn git");
    assert!(output.status.success(), "git {args:?} failed");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Local repo with an upstream-tracking branch against a bare remote.
fn repo_with_remote(work: &Path, remote: &Path) {
    git(remote, &["init", "--bare", "-b", "main"]);
    git(work, &["init", "-b", "main"]);
    git(work, &["config", "user.email", "dev@example.com"]);
    git(work, &["config", "user.name", "Dev"]);
    std::fs::write(work.join("README.md"), "seed").expect("seed file");
    git(work, &["add", "-A"]);
    git(work, &["commit", "-m", "seed"]);
    git(work, &["remote", "add", "origin", remote.to_str().expect("utf8 path")]);
    git(work, &["push", "-u", "origin", "main"]);
}

/// Simulates an agent that commits directly during step1 and reports a
/// green suite at step2 with a clean working tree.
struct CommittingAgent {
    cwd: PathBuf,
    calls: RefCell<u32>,
}

impl TaskRunner for CommittingAgent {
    fn run_task(&self, _request: &TaskRequest) -> Result<TaskOutcome, AgentError> {
        let call = {
            let mut calls = self.calls.borrow_mut();
            *calls += 1;
            *calls
        };
        let output = if call == 1 {
            std::fs::write(self.cwd.join("e2e_fix.rs"), "// repaired harness")
                .expect("agent writes file");
            git(&self.cwd, &["add", "-A"]);
            git(&self.cwd, &["commit", "-m", "repair e2e harness"]);
            "suite run, one failure fixed and committed".to_string()
        } else {
            "ALL_TESTS_PASS".to_string()
        };
        Ok(TaskOutcome {
            success: true,
            output,
            cost: 0.2,
            provider: "anthropic".to_string(),
        })
    }
}

#[test]
fn agent_commit_plus_early_exit_leaves_nothing_unpushed() {
    let work = tempdir().expect("workdir");
    let remote = tempdir().expect("remote");
    repo_with_remote(work.path(), remote.path());

    let runner = CommittingAgent {
        cwd: work.path().to_path_buf(),
        calls: RefCell::new(0),
    };
    let mut request = E2eFixRequest::new(21, "acme/app", work.path().to_path_buf(), 10.0);
    request.timeout = Duration::from_secs(5);
    request.reconcile_options.push_retries = 0;
    request.reconcile_options.push_backoff = Duration::from_millis(1);

    let outcome = run_e2e_fix_workflow(&request, &runner).expect("workflow runs");
    assert_eq!(*runner.calls.borrow(), 2, "early exit must skip steps 3..9");
    assert!(outcome.success);
    assert_eq!(outcome.status, RunStatus::Succeeded);
    assert!(outcome.push_warnings.is_empty(), "{:?}", outcome.push_warnings);

    // The agent's own commit must reach the remote even though the
    // working tree was clean at termination.
    assert_eq!(unpushed_commit_count(work.path()).expect("count"), 0);
    let remote_log = git_stdout(remote.path(), &["log", "--oneline", "main"]);
    assert!(
        remote_log.contains("repair e2e harness"),
        "agent commit missing from remote: {remote_log}"
    );
}

#[test]
fn reconcile_commits_agent_file_changes_the_agent_left_uncommitted() {
    let work = tempdir().expect("workdir");
    let remote = tempdir().expect("remote");
    repo_with_remote(work.path(), remote.path());

    struct DirtyAgent {
        cwd: PathBuf,
        calls: RefCell<u32>,
    }
    impl TaskRunner for DirtyAgent {
        fn run_task(&self, _request: &TaskRequest) -> Result<TaskOutcome, AgentError> {
            let call = {
                let mut calls = self.calls.borrow_mut();
                *calls += 1;
                *calls
            };
            let output = if call == 1 {
                std::fs::write(self.cwd.join("uncommitted.rs"), "// left dirty")
                    .expect("agent writes file");
                "suite run".to_string()
            } else {
                "ALL_TESTS_PASS".to_string()
            };
            Ok(TaskOutcome {
                success: true,
                output,
                cost: 0.1,
                provider: "google".to_string(),
            })
        }
    }

    let runner = DirtyAgent {
        cwd: work.path().to_path_buf(),
        calls: RefCell::new(0),
    };
    let mut request = E2eFixRequest::new(22, "acme/app", work.path().to_path_buf(), 10.0);
    request.timeout = Duration::from_secs(5);
    request.reconcile_options.push_retries = 0;
    request.reconcile_options.push_backoff = Duration::from_millis(1);

    let outcome = run_e2e_fix_workflow(&request, &runner).expect("workflow runs");
    assert!(outcome.success);
    assert_eq!(unpushed_commit_count(work.path()).expect("count"), 0);
    let status = git_stdout(work.path(), &["status", "--porcelain"]);
    assert!(status.is_empty(), "tree left dirty: {status}");
    let remote_files = git_stdout(remote.path(), &["ls-tree", "--name-only", "main"]);
    assert!(remote_files.contains("uncommitted.rs"));
}
