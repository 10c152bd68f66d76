//! The in-memory commit model.
//!
//! Built once at startup from the full log, then mutated in place:
//! branch annotations arrive from the background loader and the HEAD
//! flag is refreshed by the reconcile timer and after checkouts.

use std::path::Path;

use chrono::{DateTime, Local};

use crate::git_ops::{self, LogEntry};

/// Sentinel hash of the pseudo-commit standing in for uncommitted
/// working-tree changes. Never a valid git object name.
pub const UNCOMMITTED_HASH: &str = "--------";

#[derive(Clone, Debug)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    pub date: String,
    pub message: String,
    /// Resolved branch name; empty until loaded (and empty when no
    /// branch contains this commit).
    pub branch: String,
    pub branch_loaded: bool,
    pub is_head: bool,
    pub is_uncommitted: bool,
}

impl Commit {
    pub fn short_hash(&self) -> &str {
        if self.hash.len() > 7 { &self.hash[..7] } else { &self.hash }
    }
}

/// Re-emit git's default verbose date ("Tue Aug 25 10:22:04 2026 +0000")
/// as `YYYY-MM-DD HH:MM:SS`. Anything unparsable passes through verbatim.
pub fn format_date(raw: &str) -> String {
    match DateTime::parse_from_str(raw.trim(), "%a %b %e %H:%M:%S %Y %z") {
        Ok(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Collapse embedded line breaks to spaces so a message always fits a
/// single list row.
pub fn flatten_message(message: &str) -> String {
    message.replace('\n', " ")
}

fn from_log_entry(entry: LogEntry, head_hash: &str) -> Commit {
    let is_head = !head_hash.is_empty() && entry.hash == head_hash;
    Commit {
        is_head,
        author: entry.author.trim().to_string(),
        date: format_date(&entry.date),
        message: flatten_message(&entry.subject),
        hash: entry.hash,
        branch: String::new(),
        branch_loaded: false,
        is_uncommitted: false,
    }
}

fn pseudo_commit(author: String, change_count: usize) -> Commit {
    Commit {
        hash: UNCOMMITTED_HASH.to_string(),
        author,
        date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        message: format!("Uncommitted Changes: {} files changed", change_count),
        branch: String::new(),
        branch_loaded: true,
        is_head: false,
        is_uncommitted: true,
    }
}

/// Build the full model: every commit across all refs, newest first,
/// with a pseudo-commit prepended when the working tree is dirty.
///
/// Only a log failure is fatal; a missing HEAD (empty repository) just
/// means no row gets the HEAD flag.
pub fn build_commits(repo_root: &Path) -> Result<Vec<Commit>, String> {
    let head = git_ops::head_hash(repo_root).unwrap_or_default();
    let log = git_ops::list_log(repo_root)?;

    let mut commits: Vec<Commit> = log
        .into_iter()
        .map(|entry| from_log_entry(entry, &head))
        .collect();

    let changes = git_ops::status_change_count(repo_root);
    if changes > 0 {
        let author = git_ops::config_user_name(repo_root);
        commits.insert(0, pseudo_commit(author, changes));
    }

    Ok(commits)
}

/// Point the HEAD flag at `head_hash`, clearing it everywhere else.
/// Cheap enough to run from the 500 ms reconcile tick.
pub fn update_head_flags(commits: &mut [Commit], head_hash: &str) {
    for commit in commits.iter_mut() {
        if !commit.is_uncommitted {
            commit.is_head = !head_hash.is_empty() && commit.hash == head_hash;
        }
    }
}

/// Forget every branch annotation so rows re-resolve against the cache.
/// Used after a checkout, when containment results may have changed.
pub fn clear_branch_annotations(commits: &mut [Commit]) {
    for commit in commits.iter_mut() {
        if !commit.is_uncommitted {
            commit.branch.clear();
            commit.branch_loaded = false;
        }
    }
}
