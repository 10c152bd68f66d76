//! Background branch resolution.
//!
//! Navigation never blocks on a containment query: resolution requests
//! go over a channel to a background task that runs the blocking git
//! work via `tokio::task::spawn_blocking`, writes into the shared
//! [`BranchCache`], and reports results back for the commit model. A
//! result that arrives for a row that has scrolled away is simply a
//! warm cache entry; nothing needs cancelling.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::branch_cache::BranchCache;
use crate::git_ops;

/// Request sent to the resolver task.
pub enum BranchRequest {
    /// Resolve the containing branch for one commit.
    Resolve { hash: String },
    /// Seed the cache from a snapshot of every branch tip. Runs once
    /// per model build and once after each checkout.
    Prefetch,
}

/// A finished resolution, applied to the commit model by the main loop.
#[derive(Debug)]
pub struct BranchResult {
    pub hash: String,
    /// Empty when no branch contains the commit (or the query failed,
    /// which renders identically).
    pub branch: String,
}

/// Handle for submitting resolution work.
pub struct BranchLoader {
    tx: mpsc::Sender<BranchRequest>,
}

impl BranchLoader {
    /// Spawn the resolver task. The receiver must be polled in the main
    /// event loop.
    pub fn new(
        repo_root: PathBuf,
        cache: Arc<BranchCache>,
    ) -> (Self, mpsc::Receiver<BranchResult>) {
        let (request_tx, request_rx) = mpsc::channel::<BranchRequest>(64);
        let (result_tx, result_rx) = mpsc::channel::<BranchResult>(64);

        tokio::spawn(branch_loader_task(repo_root, cache, request_rx, result_tx));

        (Self { tx: request_tx }, result_rx)
    }

    /// Queue a single-commit resolution (non-blocking; drops the
    /// request when the queue is full, a later redraw re-requests it).
    pub fn request_resolve(&self, hash: String) {
        let _ = self.tx.try_send(BranchRequest::Resolve { hash });
    }

    /// Queue a bulk tip prefetch.
    pub fn request_prefetch(&self) {
        let _ = self.tx.try_send(BranchRequest::Prefetch);
    }
}

async fn branch_loader_task(
    repo_root: PathBuf,
    cache: Arc<BranchCache>,
    mut rx: mpsc::Receiver<BranchRequest>,
    tx: mpsc::Sender<BranchResult>,
) {
    while let Some(request) = rx.recv().await {
        match request {
            BranchRequest::Resolve { hash } => {
                // Cache hit or a claim held by an earlier request:
                // answer from the cache without touching git.
                if let Some(branch) = cache.get(&hash) {
                    let _ = tx.send(BranchResult { hash, branch }).await;
                    continue;
                }
                if !cache.begin_resolve(&hash) {
                    continue;
                }

                let root = repo_root.clone();
                let query_hash = hash.clone();
                let result = tokio::task::spawn_blocking(move || {
                    git_ops::branches_containing(&root, &query_hash)
                })
                .await;

                let branch = match result {
                    Ok(branches) => branches.into_iter().next().unwrap_or_default(),
                    Err(_) => String::new(),
                };

                cache.insert(hash.clone(), branch.clone());
                let _ = tx.send(BranchResult { hash, branch }).await;
            }
            BranchRequest::Prefetch => {
                let root = repo_root.clone();
                let result =
                    tokio::task::spawn_blocking(move || git_ops::branch_tips(&root)).await;

                let Ok(Ok(tips)) = result else {
                    continue;
                };

                cache.insert_bulk(tips.clone());
                for (hash, branch) in tips {
                    let _ = tx.send(BranchResult { hash, branch }).await;
                }
            }
        }
    }
}
