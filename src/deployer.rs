//! Deployment orchestration: publishing artifacts and repository metadata.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::connector::transfer::{ArtifactUpload, MetadataDownload, MetadataUpload};
use crate::connector::{ConnectorProvider, RepositoryConnector};
use crate::error::{Error, Result};
use crate::listener::{EventCatapult, RepositoryEvent};
use crate::metadata::{Metadata, RemoteSnapshotMetadata, SnapshotKey, VersionsKey, VersionsMetadata};
use crate::models::artifact::Artifact;
use crate::models::repository::RemoteRepository;
use crate::session::Session;

/// A request to publish a set of artifacts and metadata to one remote
/// repository.
///
/// Passing the metadata returned by a previous [`DeployResult`] back in via
/// `metadata` makes artifacts deployed one call at a time share the snapshot
/// timestamp and build number allocated by the first call.
#[derive(Debug)]
pub struct DeployRequest {
    pub artifacts: Vec<Artifact>,
    pub metadata: Vec<Metadata>,
    pub repository: RemoteRepository,
}

/// The artifacts and metadata that were published.
#[derive(Debug, Default)]
pub struct DeployResult {
    pub artifacts: Vec<Artifact>,
    pub metadata: Vec<Metadata>,
}

/// Records an update check for a metadata/repository pair after each merge,
/// so later operations can apply staleness policies. External collaborator.
pub trait UpdateCheckManager: Send + Sync {
    fn touch_metadata(
        &self,
        session: &Session,
        metadata: &Metadata,
        file: &Path,
        repository: &RemoteRepository,
    );
}

/// Sequences metadata and artifact uploads for deploy requests.
pub struct Deployer {
    connectors: Arc<dyn ConnectorProvider>,
    update_checks: Arc<dyn UpdateCheckManager>,
}

impl Deployer {
    pub fn new(
        connectors: Arc<dyn ConnectorProvider>,
        update_checks: Arc<dyn UpdateCheckManager>,
    ) -> Self {
        Self {
            connectors,
            update_checks,
        }
    }

    /// Deploy the requested artifacts and metadata.
    ///
    /// Fails immediately when the session is offline. The connector obtained
    /// for the target repository is closed on every exit path. Individual
    /// upload failures do not abort unrelated items mid-batch; after the
    /// batch, the first captured failure fails the whole deploy while the
    /// completed siblings' effects remain committed.
    pub async fn deploy(&self, session: &Session, request: DeployRequest) -> Result<DeployResult> {
        if session.is_offline() {
            return Err(Error::Offline);
        }

        let connector = match self.connectors.connect(session, &request.repository).await {
            Ok(connector) => connector,
            Err(error) => {
                return Err(Error::Deployment {
                    item: request.repository.to_string(),
                    source: Box::new(error),
                })
            }
        };

        let result = self.perform(session, connector.as_ref(), request).await;
        connector.close().await;
        result
    }

    async fn perform(
        &self,
        session: &Session,
        connector: &dyn RepositoryConnector,
        request: DeployRequest,
    ) -> Result<DeployResult> {
        let repository = request.repository;
        let catapult = Arc::new(EventCatapult::new(
            session.listeners().clone(),
            repository.clone(),
        ));

        let mut snapshots: Vec<RemoteSnapshotMetadata> = Vec::new();
        let mut versions_seen: HashSet<VersionsKey> = HashSet::new();
        let mut passthrough: Vec<Metadata> = Vec::new();

        // Metadata handed back from a previous deploy re-establishes the
        // association between the artifacts of one project, keeping the
        // already-allocated snapshot identity. A caller-supplied versions
        // record likewise suppresses a second upload for its coordinate.
        for metadata in request.metadata {
            match metadata {
                Metadata::Snapshot(snapshot) => {
                    if !snapshots.iter().any(|s| s.key() == snapshot.key()) {
                        snapshots.push(snapshot);
                    }
                }
                Metadata::Versions(versions) => {
                    versions_seen.insert(versions.key());
                }
                plain @ Metadata::Plain(_) => passthrough.push(plain),
            }
        }

        for artifact in &request.artifacts {
            if artifact.is_snapshot() {
                let key = SnapshotKey::of(artifact);
                match snapshots.iter_mut().find(|s| s.key() == key) {
                    Some(snapshot) => snapshot.bind(artifact),
                    None => {
                        let mut snapshot = RemoteSnapshotMetadata::new(artifact);
                        snapshot.bind(artifact);
                        snapshots.push(snapshot);
                    }
                }
            }
        }

        let mut metadata_uploads: Vec<MetadataUpload> = Vec::new();

        // Snapshot metadata is merged before any dependent artifact is
        // queued, so the shared timestamp/build-number is allocated exactly
        // once.
        let mut merged_snapshots: Vec<RemoteSnapshotMetadata> = Vec::new();
        for snapshot in snapshots {
            let metadata = self
                .upload_metadata(
                    session,
                    Metadata::Snapshot(snapshot),
                    &repository,
                    connector,
                    &catapult,
                    &mut metadata_uploads,
                )
                .await?;
            if let Metadata::Snapshot(snapshot) = metadata {
                merged_snapshots.push(snapshot);
            }
        }

        let mut artifact_uploads: Vec<ArtifactUpload> = Vec::new();
        for artifact in &request.artifacts {
            let mut artifact = artifact.clone();

            if artifact.is_snapshot() && artifact.version() == artifact.base_version() {
                let key = SnapshotKey::of(&artifact);
                let expanded = merged_snapshots
                    .iter()
                    .find(|s| s.key() == key)
                    .and_then(|s| s.expanded_version(&artifact));
                if let Some(expanded) = expanded {
                    artifact = artifact.set_version(expanded);
                }
            }

            if versions_seen.insert(VersionsKey::of(&artifact)) {
                self.upload_metadata(
                    session,
                    Metadata::Versions(VersionsMetadata::new(&artifact)),
                    &repository,
                    connector,
                    &catapult,
                    &mut metadata_uploads,
                )
                .await?;
            }

            let file = artifact.file().ok_or_else(|| {
                Error::Validation(format!("artifact {} has no file to deploy", artifact))
            })?;
            artifact_uploads.push(ArtifactUpload::with_events(
                artifact.clone(),
                file.to_path_buf(),
                catapult.clone(),
            ));
        }

        // Caller-supplied metadata that the repository does not maintain
        // itself is published as-is.
        for metadata in passthrough {
            self.upload_metadata(
                session,
                metadata,
                &repository,
                connector,
                &catapult,
                &mut metadata_uploads,
            )
            .await?;
        }

        connector.put(&mut artifact_uploads, &mut metadata_uploads).await;

        for upload in &mut artifact_uploads {
            if let Some(error) = upload.take_error() {
                return Err(Error::Deployment {
                    item: upload.artifact().to_string(),
                    source: Box::new(error),
                });
            }
        }
        for upload in &mut metadata_uploads {
            if let Some(error) = upload.take_error() {
                return Err(Error::Deployment {
                    item: upload.metadata().to_string(),
                    source: Box::new(error),
                });
            }
        }

        tracing::debug!(
            repository = %repository,
            artifacts = artifact_uploads.len(),
            metadata = metadata_uploads.len(),
            "deploy completed"
        );

        Ok(DeployResult {
            artifacts: artifact_uploads
                .iter()
                .map(|upload| upload.artifact().clone())
                .collect(),
            metadata: metadata_uploads
                .iter()
                .map(|upload| upload.metadata().clone())
                .collect(),
        })
    }

    /// Apply the merge protocol to one metadata item and queue it for
    /// upload.
    ///
    /// Mergeable metadata whose state is not yet resolved first stages the
    /// current remote copy (a missing remote document is fine and means "no
    /// prior state"); already-resolved metadata merges against the last
    /// local copy without refetching. Non-mergeable metadata is copied
    /// byte-for-byte.
    async fn upload_metadata(
        &self,
        session: &Session,
        mut metadata: Metadata,
        repository: &RemoteRepository,
        connector: &dyn RepositoryConnector,
        catapult: &Arc<EventCatapult>,
        metadata_uploads: &mut Vec<MetadataUpload>,
    ) -> Result<Metadata> {
        let lrm = session.local_repository_manager();
        let dst = lrm
            .repository()
            .basedir
            .join(lrm.path_for_remote_metadata(&metadata, repository, ""));

        if metadata.is_mergeable() && !metadata.is_resolved() {
            let listeners = session.listeners();
            listeners.metadata_resolving(&RepositoryEvent {
                metadata: Some(&metadata),
                repository: Some(repository),
                ..Default::default()
            });

            let policy = repository.policy_for(metadata.nature());
            let mut download =
                MetadataDownload::new(metadata.clone(), dst.clone(), policy.checksum_policy);
            connector.get(&mut [], std::slice::from_mut(&mut download)).await;

            let error = download.take_error();
            listeners.metadata_resolved(&RepositoryEvent {
                metadata: Some(&metadata),
                repository: Some(repository),
                error: error.as_ref(),
                ..Default::default()
            });

            if let Some(error) = error {
                if !error.is_not_found() {
                    return Err(Error::Deployment {
                        item: metadata.to_string(),
                        source: Box::new(error),
                    });
                }
            }
        }

        metadata.merge(&dst, &dst).await.map_err(|error| Error::Deployment {
            item: metadata.to_string(),
            source: Box::new(error),
        })?;

        self.update_checks
            .touch_metadata(session, &metadata, &dst, repository);

        metadata_uploads.push(MetadataUpload::with_events(
            metadata.clone(),
            dst,
            catapult.clone(),
        ));
        Ok(metadata)
    }
}
