//! Blocking git queries and checkout commands.
//!
//! Everything here shells out to the `git` binary and parses its textual
//! output. Errors are returned as trimmed stderr text; callers decide
//! which failures are fatal and which degrade a feature.

use std::{io, path::Path, process::Command};

fn run_git(cwd: &Path, args: &[&str]) -> io::Result<std::process::Output> {
    Command::new("git")
        .arg("-C")
        .arg(cwd)
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GCM_INTERACTIVE", "never")
        .env("GIT_PAGER", "cat")
        .env("PAGER", "cat")
        .env("GIT_EDITOR", ":")
        .env("EDITOR", ":")
        .output()
}

fn stdout_trimmed(out: std::process::Output) -> Result<String, String> {
    if out.status.success() {
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    } else {
        Err(String::from_utf8_lossy(&out.stderr).trim().to_string())
    }
}

/// Combined stdout + stderr, the way git reports checkout results
/// (advice about detached HEAD goes to stderr even on success).
fn combined_text(out: &std::process::Output) -> String {
    let mut text = String::from_utf8_lossy(&out.stdout).to_string();
    text.push_str(&String::from_utf8_lossy(&out.stderr));
    text.trim().to_string()
}

/// Resolve the repository root for `path`. Failure means `path` is not
/// inside a git repository, which is fatal at startup.
pub fn repo_root(path: &Path) -> Result<std::path::PathBuf, String> {
    let out = run_git(path, &["rev-parse", "--show-toplevel"]).map_err(|e| e.to_string())?;
    let root = stdout_trimmed(out)?;
    if root.is_empty() {
        return Err("not a git repository".to_string());
    }
    Ok(std::path::PathBuf::from(root))
}

/// Hash of the current HEAD. Fails on an empty repository; callers treat
/// that as "no commit is HEAD", not as an error worth surfacing.
pub fn head_hash(repo_root: &Path) -> Result<String, String> {
    let out = run_git(repo_root, &["rev-parse", "HEAD"]).map_err(|e| e.to_string())?;
    stdout_trimmed(out)
}

/// Hash a branch name currently points to.
pub fn branch_hash(repo_root: &Path, branch: &str) -> Result<String, String> {
    let out = run_git(repo_root, &["rev-parse", branch]).map_err(|e| e.to_string())?;
    stdout_trimmed(out)
}

/// Short name of the currently checked-out branch, or `None` when HEAD
/// is detached.
pub fn current_branch(repo_root: &Path) -> Option<String> {
    let out = run_git(repo_root, &["symbolic-ref", "--short", "-q", "HEAD"]).ok()?;
    stdout_trimmed(out).ok().filter(|s| !s.is_empty())
}

/// One raw `git log` record. Fields are exactly as git printed them;
/// normalization (date formatting, message flattening) happens in the
/// commit model.
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub hash: String,
    pub author: String,
    pub date: String,
    pub subject: String,
}

/// Full history across all refs, newest first. A failure here is fatal
/// to startup.
pub fn list_log(repo_root: &Path) -> Result<Vec<LogEntry>, String> {
    let out = run_git(
        repo_root,
        &["log", "--all", "--no-color", "--pretty=format:%H|%an|%ad|%s"],
    )
    .map_err(|e| e.to_string())?;
    if !out.status.success() {
        return Err(String::from_utf8_lossy(&out.stderr).trim().to_string());
    }

    let mut entries = Vec::new();
    for line in String::from_utf8_lossy(&out.stdout).lines() {
        let mut it = line.splitn(4, '|');
        let hash = it.next().unwrap_or("").trim().to_string();
        let author = it.next().unwrap_or("").to_string();
        let date = it.next().unwrap_or("").to_string();
        let subject = match it.next() {
            Some(s) => s.to_string(),
            None => continue,
        };
        if hash.is_empty() {
            continue;
        }
        entries.push(LogEntry {
            hash,
            author,
            date,
            subject,
        });
    }

    Ok(entries)
}

/// Number of pending working-tree changes (`git status --porcelain` line
/// count). Query failures count as a clean tree.
pub fn status_change_count(repo_root: &Path) -> usize {
    let Ok(out) = run_git(repo_root, &["status", "--porcelain"]) else {
        return 0;
    };
    if !out.status.success() {
        return 0;
    }
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .count()
}

/// Branches whose history contains `hash`, with the checked-out branch's
/// `* ` marker stripped and that branch moved to the front. Errors and
/// detached-HEAD placeholder lines yield an empty list.
pub fn branches_containing(repo_root: &Path, hash: &str) -> Vec<String> {
    let Ok(out) = run_git(repo_root, &["branch", "--contains", hash]) else {
        return Vec::new();
    };
    if !out.status.success() {
        return Vec::new();
    }

    let mut branches = Vec::new();
    for line in String::from_utf8_lossy(&out.stdout).lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(current) = line.strip_prefix('*') {
            let current = current.trim();
            // "* (HEAD detached at ...)" is not a branch
            if current.starts_with('(') {
                continue;
            }
            branches.insert(0, current.to_string());
        } else {
            branches.push(line.to_string());
        }
    }
    branches
}

/// Snapshot of every branch tip as `(hash, short name)` pairs, used to
/// seed the resolution cache in one query instead of one per commit.
pub fn branch_tips(repo_root: &Path) -> Result<Vec<(String, String)>, String> {
    let out = run_git(
        repo_root,
        &["branch", "-a", "--format=%(objectname) %(refname:short)"],
    )
    .map_err(|e| e.to_string())?;
    if !out.status.success() {
        return Err(String::from_utf8_lossy(&out.stderr).trim().to_string());
    }

    let mut tips = Vec::new();
    for line in String::from_utf8_lossy(&out.stdout).lines() {
        if let Some((hash, name)) = line.trim().split_once(' ') {
            if !hash.is_empty() && !name.is_empty() {
                tips.push((hash.to_string(), name.to_string()));
            }
        }
    }
    Ok(tips)
}

/// The configured user name, or empty when unset.
pub fn config_user_name(repo_root: &Path) -> String {
    run_git(repo_root, &["config", "user.name"])
        .ok()
        .and_then(|out| stdout_trimmed(out).ok())
        .unwrap_or_default()
}

/// How a confirmed selection will be applied to the repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutKind {
    /// Move HEAD to a branch and stay attached (`git switch`).
    Switch(String),
    /// Check out a bare revision, detaching HEAD (`git checkout <hash>`).
    Detach(String),
}

/// Decide between a branch switch and a detached checkout. A switch is
/// only valid when a branch was actually chosen and its tip is the
/// selected commit; anything else (no containing branch, or the commit
/// is an ancestor rather than the tip) detaches.
pub fn plan_checkout(
    chosen_branch: Option<&str>,
    chosen_tip: Option<&str>,
    hash: &str,
) -> CheckoutKind {
    match (chosen_branch, chosen_tip) {
        (Some(branch), Some(tip)) if tip == hash => CheckoutKind::Switch(branch.to_string()),
        _ => CheckoutKind::Detach(hash.to_string()),
    }
}

/// Run the planned checkout. Returns git's combined output for the
/// status line; on failure the same text is the error.
pub fn execute_checkout(repo_root: &Path, kind: &CheckoutKind) -> Result<String, String> {
    let out = match kind {
        CheckoutKind::Switch(branch) => run_git(repo_root, &["switch", branch.as_str()]),
        CheckoutKind::Detach(hash) => run_git(repo_root, &["checkout", hash.as_str()]),
    }
    .map_err(|e| e.to_string())?;

    let text = combined_text(&out);
    if out.status.success() { Ok(text) } else { Err(text) }
}
