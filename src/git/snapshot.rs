use crate::git::{run_git, GitError};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Repo-relative path to sha256 hex digest for every file git knows about.
pub type FileHashSnapshot = BTreeMap<String, String>;

/// Hashes tracked and untracked-but-not-ignored files. Two snapshots
/// comparing equal means nothing commit-worthy happened in between.
pub fn tracked_file_hashes(cwd: &Path) -> Result<FileHashSnapshot, GitError> {
    let listing = run_git(cwd, &["ls-files", "--cached", "--others", "--exclude-standard"])?;
    let mut snapshot = FileHashSnapshot::new();
    for rel in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let full = cwd.join(rel);
        // Deleted-but-still-listed entries are skipped; their absence
        // still shows up as a snapshot difference.
        let Ok(bytes) = std::fs::read(&full) else {
            continue;
        };
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        snapshot.insert(rel.to_string(), format!("{:x}", hasher.finalize()));
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn init_repo(dir: &Path) {
        for args in [
            vec!["init"],
            vec!["config", "user.email", "dev@example.com"],
            vec!["config", "user.name", "Dev"],
        ] {
            let status = Command::new("git")
                .current_dir(dir)
                .args(&args)
                .status()
                .unwrap();
            assert!(status.success());
        }
    }

    #[test]
    fn snapshot_sees_untracked_files_and_changes() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        std::fs::write(dir.path().join("a.txt"), "one").unwrap();

        let first = tracked_file_hashes(dir.path()).unwrap();
        assert!(first.contains_key("a.txt"));

        let unchanged = tracked_file_hashes(dir.path()).unwrap();
        assert_eq!(first, unchanged);

        std::fs::write(dir.path().join("a.txt"), "two").unwrap();
        let changed = tracked_file_hashes(dir.path()).unwrap();
        assert_ne!(first, changed);
    }

    #[test]
    fn snapshot_skips_ignored_files() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        std::fs::write(dir.path().join(".gitignore"), "scratch/\n").unwrap();
        std::fs::create_dir(dir.path().join("scratch")).unwrap();
        std::fs::write(dir.path().join("scratch/tmp.log"), "noise").unwrap();

        let snap = tracked_file_hashes(dir.path()).unwrap();
        assert!(snap.contains_key(".gitignore"));
        assert!(!snap.keys().any(|k| k.starts_with("scratch/")));
    }
}
