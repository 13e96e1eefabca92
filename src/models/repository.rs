//! Repository descriptors, policies and mirror/alias handling.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::metadata::Nature;

/// How a connector reacts to a missing or mismatching checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChecksumPolicy {
    /// Abort the transfer
    Fail,
    /// Log and continue
    #[default]
    Warn,
    /// Skip verification entirely
    Ignore,
}

/// Policy governing one kind of version (releases or snapshots) on a remote
/// repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryPolicy {
    pub enabled: bool,
    pub checksum_policy: ChecksumPolicy,
}

impl Default for RepositoryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            checksum_policy: ChecksumPolicy::default(),
        }
    }
}

/// A remote repository that artifacts and metadata can be resolved from or
/// deployed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteRepository {
    pub id: String,
    pub url: String,
    pub content_type: String,
    pub releases: RepositoryPolicy,
    pub snapshots: RepositoryPolicy,
    /// Whether this repository serves as a facade for other repositories,
    /// e.g. a mirror or repository manager.
    pub repository_manager: bool,
    /// The repositories this entry mirrors, empty unless
    /// `repository_manager` is set.
    pub mirrored: Vec<RemoteRepository>,
}

impl RemoteRepository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            content_type: "default".into(),
            releases: RepositoryPolicy::default(),
            snapshots: RepositoryPolicy::default(),
            repository_manager: false,
            mirrored: Vec::new(),
        }
    }

    /// The policy applicable to metadata of the given nature.
    pub fn policy_for(&self, nature: Nature) -> &RepositoryPolicy {
        if nature.includes_snapshots() && self.snapshots.enabled {
            &self.snapshots
        } else {
            &self.releases
        }
    }
}

impl fmt::Display for RemoteRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.url)
    }
}

/// The local repository on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalRepository {
    pub basedir: PathBuf,
    pub content_type: String,
}

impl LocalRepository {
    pub fn new(basedir: impl Into<PathBuf>) -> Self {
        Self {
            basedir: basedir.into(),
            content_type: "default".into(),
        }
    }
}

/// The repository backing an in-progress build workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceRepository {
    pub id: String,
}

impl WorkspaceRepository {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// The repository a resolution result was sourced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySource {
    Remote(RemoteRepository),
    Local(LocalRepository),
    Workspace(WorkspaceRepository),
}

impl RepositorySource {
    pub fn id(&self) -> &str {
        match self {
            RepositorySource::Remote(repo) => &repo.id,
            RepositorySource::Local(_) => "local",
            RepositorySource::Workspace(repo) => &repo.id,
        }
    }
}

/// A repository definition that either carries its own value or reuses a
/// named definition verbatim. Aliases are resolved exactly once, at
/// session-assembly time, never per field access.
#[derive(Debug, Clone)]
pub enum RepositoryRef {
    Direct(RemoteRepository),
    Alias(String),
}

impl RepositoryRef {
    /// Resolve this reference against a registry of named definitions.
    pub fn resolve(self, registry: &HashMap<String, RemoteRepository>) -> Result<RemoteRepository> {
        match self {
            RepositoryRef::Direct(repository) => Ok(repository),
            RepositoryRef::Alias(name) => registry.get(&name).cloned().ok_or_else(|| {
                Error::Config(format!("repository reference {:?} is not defined", name))
            }),
        }
    }
}

/// A mirror definition rewriting matching remote repositories to a single
/// endpoint.
#[derive(Debug, Clone)]
pub struct Mirror {
    pub id: String,
    pub url: String,
    pub content_type: String,
    /// Patterns selecting the mirrored repositories: an exact id, `*`, a
    /// comma-separated list, with `!id` entries excluding.
    pub mirror_of: String,
}

impl Mirror {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        mirror_of: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            content_type: "default".into(),
            mirror_of: mirror_of.into(),
        }
    }

    /// Whether this mirror applies to the given repository.
    pub fn matches(&self, repository: &RemoteRepository) -> bool {
        let mut matched = false;
        for pattern in self.mirror_of.split(',').map(str::trim) {
            if let Some(excluded) = pattern.strip_prefix('!') {
                if excluded == repository.id {
                    return false;
                }
            } else if pattern == "*" || pattern == repository.id {
                matched = true;
            }
        }
        matched
    }

    /// Rewrite the repository list, folding every matching repository into
    /// one mirror entry that records its mirrored members.
    pub fn apply(mirrors: &[Mirror], repositories: Vec<RemoteRepository>) -> Vec<RemoteRepository> {
        let mut result: Vec<RemoteRepository> = Vec::with_capacity(repositories.len());
        for repository in repositories {
            let Some(mirror) = mirrors.iter().find(|m| m.matches(&repository)) else {
                result.push(repository);
                continue;
            };
            match result.iter_mut().find(|r| r.id == mirror.id) {
                Some(existing) => existing.mirrored.push(repository),
                None => {
                    let mut entry = RemoteRepository::new(mirror.id.clone(), mirror.url.clone());
                    entry.content_type = mirror.content_type.clone();
                    entry.releases = repository.releases.clone();
                    entry.snapshots = repository.snapshots.clone();
                    entry.repository_manager = true;
                    entry.mirrored.push(repository);
                    result.push(entry);
                }
            }
        }
        result
    }
}
