//! Session-scoped resolution cache.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// Key identifying one version-resolution outcome.
///
/// Two keys are equal iff every field is equal and the repository lists are
/// equal element-wise; repository-manager entries are flattened to their
/// mirrored members before the key is built, so logically identical requests
/// hit the same entry regardless of mirror indirection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionCacheKey {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub context: String,
    pub local_basedir: PathBuf,
    pub workspace: Option<String>,
    pub repositories: Vec<RepositoryKey>,
}

/// One remote repository's contribution to a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryKey {
    pub id: String,
    pub url: String,
}

/// A memoized resolution outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedVersion {
    pub version: String,
    pub repository: Option<CachedRepository>,
}

/// Where a cached version was sourced from, re-bound to live repository
/// instances on lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedRepository {
    Remote(String),
    Local,
    Workspace,
}

/// A simplistic session-scoped cache with no eviction, suitable for
/// short-lived resolution sessions. Reads and writes are safe from
/// concurrent tasks; identical keys are last-writer-wins.
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: RwLock<HashMap<VersionCacheKey, CachedVersion>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &VersionCacheKey) -> Option<CachedVersion> {
        self.entries.read().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: VersionCacheKey, value: CachedVersion) {
        self.entries.write().unwrap().insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
