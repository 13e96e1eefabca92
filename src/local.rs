//! Local repository path computation and workspace lookup.

use std::path::PathBuf;

use crate::metadata::Metadata;
use crate::models::artifact::Artifact;
use crate::models::repository::{LocalRepository, RemoteRepository, WorkspaceRepository};

/// Computes repository-relative paths for metadata in the local repository.
/// Pure path arithmetic; no I/O happens here.
pub trait LocalRepositoryManager: Send + Sync {
    fn repository(&self) -> &LocalRepository;

    /// Relative path of the locally-installed copy of `metadata`.
    fn path_for_local_metadata(&self, metadata: &Metadata) -> PathBuf;

    /// Relative path of the copy of `metadata` tracked for `repository`.
    fn path_for_remote_metadata(
        &self,
        metadata: &Metadata,
        repository: &RemoteRepository,
        context: &str,
    ) -> PathBuf;
}

/// Manager using the standard repository layout:
/// `group/as/dirs/artifact-id[/version]/maven-metadata-<origin>.xml`.
pub struct SimpleLocalRepositoryManager {
    repository: LocalRepository,
}

impl SimpleLocalRepositoryManager {
    pub fn new(basedir: impl Into<PathBuf>) -> Self {
        Self {
            repository: LocalRepository::new(basedir),
        }
    }

    fn metadata_path(&self, metadata: &Metadata, origin: &str) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in metadata.group_id().split('.') {
            path.push(segment);
        }
        path.push(metadata.artifact_id());
        if !metadata.version().is_empty() {
            path.push(metadata.version());
        }
        let file_name = metadata.file_name();
        match file_name.rsplit_once('.') {
            Some((stem, suffix)) => path.push(format!("{}-{}.{}", stem, origin, suffix)),
            None => path.push(format!("{}-{}", file_name, origin)),
        }
        path
    }
}

impl LocalRepositoryManager for SimpleLocalRepositoryManager {
    fn repository(&self) -> &LocalRepository {
        &self.repository
    }

    fn path_for_local_metadata(&self, metadata: &Metadata) -> PathBuf {
        self.metadata_path(metadata, "local")
    }

    fn path_for_remote_metadata(
        &self,
        metadata: &Metadata,
        repository: &RemoteRepository,
        _context: &str,
    ) -> PathBuf {
        self.metadata_path(metadata, &repository.id)
    }
}

/// Lets an in-progress build short-circuit resolution to uncommitted build
/// output.
pub trait WorkspaceReader: Send + Sync {
    fn repository(&self) -> &WorkspaceRepository;

    /// The versions of `artifact` available in the workspace.
    fn find_versions(&self, artifact: &Artifact) -> Vec<String>;
}
