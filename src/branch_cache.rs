//! Shared cache of commit-hash to branch-name resolutions.
//!
//! Readers are the render path and the navigation code; writers are the
//! background resolver tasks and the bulk prefetch. An empty string is a
//! real cached value: it records that no branch contains the commit, so
//! the expensive containment query is not repeated.

use std::collections::{HashMap, HashSet};

use parking_lot::{Mutex, RwLock};

/// Thread-safe hash -> branch map with an in-flight guard so each hash
/// is resolved by at most one task at a time.
pub struct BranchCache {
    map: RwLock<HashMap<String, String>>,
    in_flight: Mutex<HashSet<String>>,
}

impl BranchCache {
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Cached branch for a hash, if resolved.
    pub fn get(&self, hash: &str) -> Option<String> {
        self.map.read().get(hash).cloned()
    }

    /// Store a resolution and release the in-flight claim for the hash.
    pub fn insert(&self, hash: String, branch: String) {
        self.in_flight.lock().remove(&hash);
        self.map.write().insert(hash, branch);
    }

    /// Seed many entries under a single write lock (bulk prefetch).
    /// Existing entries are kept: a per-commit containment result is
    /// more precise than a tip snapshot.
    pub fn insert_bulk(&self, pairs: Vec<(String, String)>) {
        let mut map = self.map.write();
        for (hash, branch) in pairs {
            map.entry(hash).or_insert(branch);
        }
    }

    /// Claim a hash for resolution. Returns false when the hash is
    /// already cached or another task holds the claim, so the
    /// underlying query runs effectively once per hash.
    pub fn begin_resolve(&self, hash: &str) -> bool {
        if self.map.read().contains_key(hash) {
            return false;
        }
        self.in_flight.lock().insert(hash.to_string())
    }

    /// Drop every entry and claim. Called after an executed checkout,
    /// when branch containment may have changed under us.
    pub fn invalidate_all(&self) {
        self.in_flight.lock().clear();
        self.map.write().clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.map.read().len()
    }
}
