//! Revision store adapter: a thin wrapper over the `git` CLI that shells
//! out and checks the exit status of each invocation.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

pub const FIELD_SEP: char = '\u{1f}';

/// A single commit's identity and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: String,
    pub short_id: String,
    pub author_name: String,
    pub author_email: String,
    /// ISO-8601 author date, as git reports it (`%aI`).
    pub date: String,
    /// Commit message subject line only.
    pub message: String,
}

/// One entry from `git status`, restricted to the fields commands need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub staged_new: bool,
    pub staged_modified: bool,
    pub staged_deleted: bool,
    pub unstaged_modified: bool,
    pub unstaged_deleted: bool,
    pub untracked: bool,
}

impl StatusEntry {
    pub fn is_new(&self) -> bool {
        self.staged_new || self.untracked
    }

    pub fn is_deleted(&self) -> bool {
        self.staged_deleted || self.unstaged_deleted
    }

    pub fn is_modified(&self) -> bool {
        self.staged_modified || self.unstaged_modified
    }
}

/// The interface the core consumes. `GitStore` is the only
/// implementation shipped; the trait exists so the rest of the system
/// never depends on the `git` binary directly.
pub trait RevisionStore {
    fn is_repo(&self) -> bool;
    fn init(&self) -> Result<bool>;
    fn resolve(&self, rev: &str) -> Result<CommitInfo>;
    fn current_branch(&self) -> Result<String>;
    fn read_blob_at(&self, commit: &str, path: &str) -> Result<Option<Vec<u8>>>;
    fn read_staged_blob(&self, path: &str) -> Result<Option<Vec<u8>>>;
    fn blob_id_at(&self, commit: &str, path: &str) -> Result<Option<String>>;
    fn list_tree_files(&self, commit: &str) -> Result<Vec<String>>;
    fn commits_touching(&self, path: &str) -> Result<Vec<CommitInfo>>;
    fn status_entries(&self) -> Result<Vec<StatusEntry>>;
    fn staged_paths(&self) -> Result<Vec<String>>;
    fn has_staged_changes(&self) -> Result<bool>;
    fn stage_all(&self) -> Result<()>;
    fn stage_paths(&self, paths: &[String]) -> Result<()>;
    fn commit(&self, message: &str) -> Result<CommitInfo>;
    fn hooks_dir(&self) -> Result<std::path::PathBuf>;
}

/// `git`-CLI-backed `RevisionStore`.
pub struct GitStore;

impl GitStore {
    pub fn new() -> Self {
        GitStore
    }

    fn config_is_set(&self, key: &str) -> bool {
        Command::new("git")
            .args(["config", "--get", key])
            .output()
            .map(|o| o.status.success() && !o.stdout.is_empty())
            .unwrap_or(false)
    }

    fn format_log(&self, args: &[&str]) -> Result<Vec<CommitInfo>> {
        let fmt = format!(
            "--format=%H{sep}%h{sep}%an{sep}%ae{sep}%aI{sep}%s",
            sep = FIELD_SEP
        );
        let mut full_args = vec!["log".to_string(), fmt];
        full_args.extend(args.iter().map(|s| s.to_string()));
        let output = Command::new("git")
            .args(&full_args)
            .output()
            .context("failed to run git log")?;
        if !output.status.success() {
            bail!(
                "git log failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let mut out = Vec::new();
        for line in text.lines() {
            let fields: Vec<&str> = line.split(FIELD_SEP).collect();
            if fields.len() < 6 {
                continue;
            }
            out.push(CommitInfo {
                id: fields[0].to_string(),
                short_id: fields[1].to_string(),
                author_name: fields[2].to_string(),
                author_email: fields[3].to_string(),
                date: fields[4].to_string(),
                message: fields[5].to_string(),
            });
        }
        Ok(out)
    }
}

impl Default for GitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionStore for GitStore {
    fn is_repo(&self) -> bool {
        Command::new("git")
            .args(["rev-parse", "--git-dir"])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn init(&self) -> Result<bool> {
        if self.is_repo() {
            return Ok(false);
        }
        let output = Command::new("git")
            .arg("init")
            .output()
            .context("failed to run git init")?;
        if !output.status.success() {
            bail!(
                "git init failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(true)
    }

    fn resolve(&self, rev: &str) -> Result<CommitInfo> {
        let commits = self.format_log(&["-1", rev])?;
        commits
            .into_iter()
            .next()
            .with_context(|| format!("cannot resolve revision '{rev}'"))
    }

    fn current_branch(&self) -> Result<String> {
        let output = Command::new("git")
            .args(["branch", "--show-current"])
            .output()
            .context("failed to get current branch")?;
        if !output.status.success() {
            bail!("failed to get current branch");
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn read_blob_at(&self, commit: &str, path: &str) -> Result<Option<Vec<u8>>> {
        let output = Command::new("git")
            .args(["cat-file", "-p", &format!("{commit}:{path}")])
            .output()
            .context("failed to run git cat-file")?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(output.stdout))
    }

    fn read_staged_blob(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let output = Command::new("git")
            .args(["cat-file", "-p", &format!(":{path}")])
            .output()
            .context("failed to run git cat-file")?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(output.stdout))
    }

    fn blob_id_at(&self, commit: &str, path: &str) -> Result<Option<String>> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "-q", &format!("{commit}:{path}")])
            .output()
            .context("failed to run git rev-parse")?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ))
    }

    fn list_tree_files(&self, commit: &str) -> Result<Vec<String>> {
        let output = Command::new("git")
            .args(["ls-tree", "-r", "--name-only", commit])
            .output()
            .context("failed to run git ls-tree")?;
        if !output.status.success() {
            bail!(
                "git ls-tree failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|s| s.to_string())
            .collect())
    }

    fn commits_touching(&self, path: &str) -> Result<Vec<CommitInfo>> {
        self.format_log(&["--".to_string(), path.to_string()])
    }

    fn status_entries(&self) -> Result<Vec<StatusEntry>> {
        let output = Command::new("git")
            .args(["status", "--porcelain=v1", "--untracked-files=all"])
            .output()
            .context("failed to run git status")?;
        if !output.status.success() {
            bail!(
                "git status failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        let mut out = Vec::new();
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            if line.len() < 3 {
                continue;
            }
            let index_status = line.as_bytes()[0] as char;
            let worktree_status = line.as_bytes()[1] as char;
            let path = line[3..].to_string();
            let path = path.split(" -> ").last().unwrap_or(&path).to_string();
            out.push(StatusEntry {
                path,
                staged_new: index_status == 'A',
                staged_modified: index_status == 'M',
                staged_deleted: index_status == 'D',
                unstaged_modified: worktree_status == 'M',
                unstaged_deleted: worktree_status == 'D',
                untracked: index_status == '?' && worktree_status == '?',
            });
        }
        Ok(out)
    }

    fn staged_paths(&self) -> Result<Vec<String>> {
        let output = Command::new("git")
            .args(["diff", "--cached", "--name-only"])
            .output()
            .context("failed to run git diff --cached")?;
        if !output.status.success() {
            bail!(
                "git diff --cached failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|s| s.to_string())
            .collect())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        Ok(!self.staged_paths()?.is_empty())
    }

    fn stage_all(&self) -> Result<()> {
        let output = Command::new("git")
            .args(["add", "-A"])
            .output()
            .context("failed to run git add -A")?;
        if !output.status.success() {
            bail!(
                "git add failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(())
    }

    fn stage_paths(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add".to_string()];
        args.extend(paths.iter().cloned());
        let output = Command::new("git")
            .args(&args)
            .output()
            .context("failed to run git add")?;
        if !output.status.success() {
            bail!(
                "git add failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<CommitInfo> {
        let mut args = vec![];
        if !self.config_is_set("user.name") {
            args.extend(["-c".to_string(), "user.name=csgit".to_string()]);
        }
        if !self.config_is_set("user.email") {
            args.extend(["-c".to_string(), "user.email=csgit@localhost".to_string()]);
        }
        args.extend(["commit".to_string(), "--file".to_string(), "-".to_string()]);

        let mut child = Command::new("git")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("failed to spawn git commit")?;
        child
            .stdin
            .take()
            .context("failed to open git commit stdin")?
            .write_all(message.as_bytes())
            .context("failed to write commit message")?;
        let output = child
            .wait_with_output()
            .context("failed to wait for git commit")?;
        if !output.status.success() {
            bail!(
                "git commit failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        self.resolve("HEAD")
    }

    fn hooks_dir(&self) -> Result<std::path::PathBuf> {
        let output = Command::new("git")
            .args(["rev-parse", "--git-path", "hooks"])
            .output()
            .context("failed to resolve hooks directory")?;
        if !output.status.success() {
            bail!("not inside a git repository");
        }
        Ok(Path::new(
            String::from_utf8_lossy(&output.stdout).trim(),
        )
        .to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;
    use tempfile::tempdir;

    fn init_repo() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        StdCommand::new("git")
            .args(["init", "-q"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        StdCommand::new("git")
            .args(["config", "user.email", "test@example.com"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        StdCommand::new("git")
            .args(["config", "user.name", "Test"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        dir
    }

    #[test]
    fn detects_repo_and_stages_commits() {
        let dir = init_repo();
        let cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();

        let store = GitStore::new();
        assert!(store.is_repo());

        std::fs::write(dir.path().join("a.inp"), "1 0 0 -1\n\n1 so 5\n").unwrap();
        store.stage_all().unwrap();
        assert!(store.has_staged_changes().unwrap());
        let commit = store.commit("add geometry").unwrap();
        assert!(!commit.id.is_empty());

        std::env::set_current_dir(cwd).unwrap();
    }
}
