//! Version resolution: turning symbolic version tokens into concrete,
//! repository-backed versions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::cache::{CachedRepository, CachedVersion, RepositoryKey, VersionCacheKey};
use crate::error::{Error, Result};
use crate::listener::RepositoryEvent;
use crate::metadata::document::{MetadataDocument, Versioning};
use crate::metadata::{Metadata, Nature};
use crate::models::artifact::{Artifact, LATEST, RELEASE, SNAPSHOT};
use crate::models::repository::{RemoteRepository, RepositorySource};
use crate::session::Session;

/// A request to resolve one (possibly symbolic) version.
#[derive(Debug, Clone)]
pub struct VersionRequest {
    pub artifact: Artifact,
    pub repositories: Vec<RemoteRepository>,
    pub context: String,
}

impl VersionRequest {
    pub fn new(artifact: Artifact, repositories: Vec<RemoteRepository>) -> Self {
        Self {
            artifact,
            repositories,
            context: String::new(),
        }
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// The outcome of a version resolution. Tolerated per-source errors are
/// reported here rather than failing the operation.
#[derive(Debug)]
pub struct VersionResult {
    pub version: String,
    pub repository: Option<RepositorySource>,
    pub errors: Vec<Error>,
}

/// A request for one metadata document from one remote repository.
#[derive(Debug, Clone)]
pub struct MetadataRequest {
    pub metadata: Metadata,
    pub repository: RemoteRepository,
    pub context: String,
    /// Prefer an up-to-date local copy over hitting the network.
    pub favor_local_repository: bool,
    /// Remove the local copy when the remote side reports the file gone.
    pub delete_local_copy_if_missing: bool,
}

/// The outcome of one metadata request. `metadata` carries the backing file
/// when the document exists; a recoverable failure is reported via `error`.
#[derive(Debug)]
pub struct MetadataResult {
    pub metadata: Option<Metadata>,
    pub repository: RemoteRepository,
    pub error: Option<Error>,
}

/// Batch-resolves metadata against remote repositories plus the local
/// repository. External collaborator; implementations handle staleness
/// checks and actual transport.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve_metadata(
        &self,
        session: &Session,
        requests: Vec<MetadataRequest>,
    ) -> Vec<MetadataResult>;
}

/// Working state for one resolution key: the winning version so far and the
/// timestamp that made it win.
#[derive(Debug, Clone)]
struct VersionInfo {
    timestamp: String,
    version: String,
    repository: RepositorySource,
}

/// Resolves symbolic version tokens (`RELEASE`, `LATEST`, snapshot versions)
/// using metadata merged across all applicable repositories.
pub struct VersionResolver {
    metadata_resolver: Arc<dyn MetadataResolver>,
}

impl VersionResolver {
    pub fn new(metadata_resolver: Arc<dyn MetadataResolver>) -> Self {
        Self { metadata_resolver }
    }

    /// Resolve the requested version.
    ///
    /// Recoverable metadata errors are accumulated on the result; the call
    /// only fails when no concrete version can be determined at all.
    pub async fn resolve_version(
        &self,
        session: &Session,
        request: &VersionRequest,
    ) -> Result<VersionResult> {
        self.resolve(session, request.clone()).await
    }

    fn resolve<'a>(
        &'a self,
        session: &'a Session,
        request: VersionRequest,
    ) -> BoxFuture<'a, Result<VersionResult>> {
        Box::pin(async move {
            let artifact = request.artifact.clone();
            let version = artifact.version().to_string();

            let cache_key = session
                .cache()
                .map(|_| build_cache_key(session, &request));
            if let (Some(cache), Some(key)) = (session.cache(), cache_key.as_ref()) {
                if let Some(record) = cache.get(key) {
                    tracing::debug!(artifact = %artifact, version = %record.version, "version cache hit");
                    return Ok(VersionResult {
                        version: record.version,
                        repository: rebind_repository(
                            session,
                            &request.repositories,
                            record.repository,
                        ),
                        errors: Vec::new(),
                    });
                }
            }

            let mut result = VersionResult {
                version: String::new(),
                repository: None,
                errors: Vec::new(),
            };

            let metadata = if version == RELEASE {
                Some(Metadata::plain(
                    artifact.group_id(),
                    artifact.artifact_id(),
                    "",
                    Nature::Release,
                ))
            } else if version == LATEST {
                Some(Metadata::plain(
                    artifact.group_id(),
                    artifact.artifact_id(),
                    "",
                    Nature::ReleaseOrSnapshot,
                ))
            } else if version.ends_with(SNAPSHOT) {
                let workspace = session
                    .workspace()
                    .filter(|w| w.find_versions(&artifact).contains(&version));
                if let Some(workspace) = workspace {
                    result.repository =
                        Some(RepositorySource::Workspace(workspace.repository().clone()));
                    None
                } else {
                    Some(Metadata::plain(
                        artifact.group_id(),
                        artifact.artifact_id(),
                        version.clone(),
                        Nature::Snapshot,
                    ))
                }
            } else {
                None
            };

            let Some(metadata) = metadata else {
                // Workspace short-circuit or already-concrete version; there
                // is nothing to memoize.
                result.version = version;
                return Ok(result);
            };

            let metadata_requests = request
                .repositories
                .iter()
                .map(|repository| MetadataRequest {
                    metadata: metadata.clone(),
                    repository: repository.clone(),
                    context: request.context.clone(),
                    favor_local_repository: true,
                    delete_local_copy_if_missing: true,
                })
                .collect();
            let metadata_results = self
                .metadata_resolver
                .resolve_metadata(session, metadata_requests)
                .await;

            let lrm = session.local_repository_manager();
            let local_file = lrm
                .repository()
                .basedir
                .join(lrm.path_for_local_metadata(&metadata));
            let local_metadata = local_file.is_file().then(|| {
                let mut local = metadata.clone();
                local.set_file(local_file);
                local
            });

            let mut infos: HashMap<String, VersionInfo> = HashMap::new();

            let local_source = RepositorySource::Local(lrm.repository().clone());
            let versioning =
                read_versions(session, local_metadata.as_ref(), &mut result.errors).await;
            merge_versioning(&artifact, &mut infos, &versioning, &local_source);

            for metadata_result in metadata_results {
                if let Some(error) = metadata_result.error {
                    result.errors.push(error);
                }
                let versioning =
                    read_versions(session, metadata_result.metadata.as_ref(), &mut result.errors)
                        .await;
                let source = RepositorySource::Remote(metadata_result.repository);
                merge_versioning(&artifact, &mut infos, &versioning, &source);
            }

            let from_metadata;
            if version == RELEASE {
                from_metadata = apply(&mut result, &infos, RELEASE);
            } else if version == LATEST {
                if !apply(&mut result, &infos, LATEST) {
                    apply(&mut result, &infos, RELEASE);
                }
                from_metadata = !result.version.is_empty();

                if result.version.ends_with(SNAPSHOT) {
                    // The newest version is itself floating; resolve it in
                    // turn, scoped to the repository it came from.
                    let sub_repositories = match &result.repository {
                        Some(RepositorySource::Remote(repository)) => vec![repository.clone()],
                        _ => request.repositories.clone(),
                    };
                    let sub_request = VersionRequest {
                        artifact: artifact.set_version(result.version.clone()),
                        repositories: sub_repositories,
                        context: request.context.clone(),
                    };
                    let sub_result = self.resolve(session, sub_request).await?;
                    result.version = sub_result.version;
                    result.repository = sub_result.repository;
                    result.errors.extend(sub_result.errors);
                }
            } else {
                let classified = format!("{}{}", SNAPSHOT, artifact.classifier());
                from_metadata = apply(&mut result, &infos, &classified)
                    || apply(&mut result, &infos, SNAPSHOT);
                if !from_metadata {
                    // Metadata contained nothing newer; the requested token
                    // is already the best answer.
                    result.version = version.clone();
                }
            }

            if result.version.is_empty() {
                return Err(Error::VersionResolution {
                    artifact: artifact.to_string(),
                    errors: std::mem::take(&mut result.errors),
                });
            }

            if let (Some(cache), Some(key)) = (session.cache(), cache_key) {
                if from_metadata {
                    cache.put(
                        key,
                        CachedVersion {
                            version: result.version.clone(),
                            repository: cache_repository(result.repository.as_ref()),
                        },
                    );
                }
            }

            Ok(result)
        })
    }
}

fn apply(result: &mut VersionResult, infos: &HashMap<String, VersionInfo>, key: &str) -> bool {
    match infos.get(key) {
        Some(info) => {
            result.version = info.version.clone();
            result.repository = Some(info.repository.clone());
            true
        }
        None => false,
    }
}

async fn read_versions(
    session: &Session,
    metadata: Option<&Metadata>,
    errors: &mut Vec<Error>,
) -> Versioning {
    let Some(metadata) = metadata else {
        return Versioning::default();
    };
    let Some(file) = metadata.file() else {
        return Versioning::default();
    };
    match MetadataDocument::read(file).await {
        Ok(Some(document)) => document.versioning,
        // A missing file is expected, not an error.
        Ok(None) => Versioning::default(),
        Err(error) => {
            tracing::warn!(metadata = %metadata, error = %error, "ignoring unreadable metadata");
            session.listeners().metadata_invalid(&RepositoryEvent {
                metadata: Some(metadata),
                error: Some(&error),
                ..Default::default()
            });
            errors.push(error);
            Versioning::default()
        }
    }
}

fn merge_versioning(
    artifact: &Artifact,
    infos: &mut HashMap<String, VersionInfo>,
    versioning: &Versioning,
    repository: &RepositorySource,
) {
    if let Some(release) = non_empty(versioning.release.as_deref()) {
        merge_info(infos, RELEASE, versioning.last_updated(), release, repository);
    }
    if let Some(latest) = non_empty(versioning.latest.as_deref()) {
        merge_info(infos, LATEST, versioning.last_updated(), latest, repository);
    }

    let mut main_snapshot = false;
    for sv in &versioning.snapshot_versions.snapshot_versions {
        if !sv.version.is_empty() {
            main_snapshot |= sv.classifier.is_empty();
            let key = format!("{}{}", SNAPSHOT, sv.classifier);
            merge_info(infos, &key, &sv.updated, &sv.version, repository);
        }
    }

    if !main_snapshot {
        if let Some(snapshot) = &versioning.snapshot {
            let mut version = artifact.version().to_string();
            if snapshot.build_number > 0 {
                if let Some(timestamp) = &snapshot.timestamp {
                    let expanded = version.strip_suffix(SNAPSHOT).map(|prefix| {
                        format!("{}{}-{}", prefix, timestamp, snapshot.build_number)
                    });
                    if let Some(expanded) = expanded {
                        version = expanded;
                    }
                }
            }
            merge_info(infos, SNAPSHOT, versioning.last_updated(), &version, repository);
        }
    }
}

fn merge_info(
    infos: &mut HashMap<String, VersionInfo>,
    key: &str,
    timestamp: &str,
    version: &str,
    repository: &RepositorySource,
) {
    match infos.get_mut(key) {
        Some(info) => {
            // An empty or older timestamp never displaces an existing
            // record; an equal one keeps the first-seen record.
            if !timestamp.is_empty() && timestamp > info.timestamp.as_str() {
                info.timestamp = timestamp.to_string();
                info.version = version.to_string();
                info.repository = repository.clone();
            }
        }
        None => {
            infos.insert(
                key.to_string(),
                VersionInfo {
                    timestamp: timestamp.to_string(),
                    version: version.to_string(),
                    repository: repository.clone(),
                },
            );
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn build_cache_key(session: &Session, request: &VersionRequest) -> VersionCacheKey {
    let mut repositories = Vec::with_capacity(request.repositories.len());
    for repository in &request.repositories {
        if repository.repository_manager {
            repositories.extend(repository.mirrored.iter().map(repository_key));
        } else {
            repositories.push(repository_key(repository));
        }
    }
    VersionCacheKey {
        group_id: request.artifact.group_id().to_string(),
        artifact_id: request.artifact.artifact_id().to_string(),
        version: request.artifact.version().to_string(),
        context: request.context.clone(),
        local_basedir: session
            .local_repository_manager()
            .repository()
            .basedir
            .clone(),
        workspace: session.workspace().map(|w| w.repository().id.clone()),
        repositories,
    }
}

fn repository_key(repository: &RemoteRepository) -> RepositoryKey {
    RepositoryKey {
        id: repository.id.clone(),
        url: repository.url.clone(),
    }
}

fn cache_repository(repository: Option<&RepositorySource>) -> Option<CachedRepository> {
    repository.map(|source| match source {
        RepositorySource::Remote(repo) => CachedRepository::Remote(repo.id.clone()),
        RepositorySource::Local(_) => CachedRepository::Local,
        RepositorySource::Workspace(_) => CachedRepository::Workspace,
    })
}

fn rebind_repository(
    session: &Session,
    repositories: &[RemoteRepository],
    cached: Option<CachedRepository>,
) -> Option<RepositorySource> {
    match cached? {
        CachedRepository::Remote(id) => find_repository(repositories, &id).map(RepositorySource::Remote),
        CachedRepository::Local => Some(RepositorySource::Local(
            session.local_repository_manager().repository().clone(),
        )),
        CachedRepository::Workspace => session
            .workspace()
            .map(|w| RepositorySource::Workspace(w.repository().clone())),
    }
}

fn find_repository(repositories: &[RemoteRepository], id: &str) -> Option<RemoteRepository> {
    for repository in repositories {
        if repository.id == id {
            return Some(repository.clone());
        }
        if let Some(found) = find_repository(&repository.mirrored, id) {
            return Some(found);
        }
    }
    None
}
