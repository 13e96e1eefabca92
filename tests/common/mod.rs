//! Common test utilities: stub collaborators and session setup.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use artifact_resolver::cache::SessionCache;
use artifact_resolver::config::Config;
use artifact_resolver::connector::{
    ArtifactDownload, ArtifactUpload, ConnectorProvider, MetadataDownload, MetadataUpload,
    RepositoryConnector, TransferState,
};
use artifact_resolver::deployer::UpdateCheckManager;
use artifact_resolver::error::{Error, Result};
use artifact_resolver::listener::{RepositoryEvent, RepositoryListener};
use artifact_resolver::local::WorkspaceReader;
use artifact_resolver::metadata::Metadata;
use artifact_resolver::models::artifact::Artifact;
use artifact_resolver::models::repository::{RemoteRepository, WorkspaceRepository};
use artifact_resolver::resolver::{MetadataRequest, MetadataResolver, MetadataResult};
use artifact_resolver::session::{Session, SessionBuilder};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Session builder rooted at the given local repository directory.
pub fn session_builder(local_repository: &Path) -> SessionBuilder {
    let config = Config {
        local_repository: local_repository.display().to_string(),
        ..Config::default()
    };
    Session::builder(config)
}

pub fn offline_session_builder(local_repository: &Path) -> SessionBuilder {
    let config = Config {
        local_repository: local_repository.display().to_string(),
        offline: true,
        ..Config::default()
    };
    Session::builder(config)
}

/// Write a throwaway artifact file and return an artifact bound to it.
pub fn artifact_with_file(dir: &Path, artifact: Artifact) -> Artifact {
    let name = format!(
        "{}-{}{}.{}",
        artifact.artifact_id(),
        artifact.version(),
        if artifact.classifier().is_empty() {
            String::new()
        } else {
            format!("-{}", artifact.classifier())
        },
        artifact.extension()
    );
    let path = dir.join(name);
    std::fs::write(&path, b"artifact-bytes").unwrap();
    artifact.set_file(path)
}

/// Key a metadata document by coordinate and file name for the stub remote
/// state.
pub fn metadata_key(metadata: &Metadata) -> String {
    format!(
        "{}:{}:{}:{}",
        metadata.group_id(),
        metadata.artifact_id(),
        metadata.version(),
        metadata.file_name()
    )
}

/// Metadata resolver serving canned documents, keyed by repository id and
/// version scope. Documents are staged into the local repository the same
/// way a real resolver would.
#[derive(Default)]
pub struct StaticMetadataResolver {
    /// (repository id, version scope) -> document bytes
    docs: Mutex<HashMap<(String, String), Vec<u8>>>,
    pub batches: AtomicUsize,
}

impl StaticMetadataResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doc(self, repository_id: &str, version: &str, xml: &str) -> Self {
        self.docs.lock().unwrap().insert(
            (repository_id.to_string(), version.to_string()),
            xml.as_bytes().to_vec(),
        );
        self
    }

    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataResolver for StaticMetadataResolver {
    async fn resolve_metadata(
        &self,
        session: &Session,
        requests: Vec<MetadataRequest>,
    ) -> Vec<MetadataResult> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let key = (
                request.repository.id.clone(),
                request.metadata.version().to_string(),
            );
            let doc = self.docs.lock().unwrap().get(&key).cloned();
            let metadata = match doc {
                Some(content) => {
                    let lrm = session.local_repository_manager();
                    let path = lrm.repository().basedir.join(lrm.path_for_remote_metadata(
                        &request.metadata,
                        &request.repository,
                        &request.context,
                    ));
                    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                    std::fs::write(&path, content).unwrap();
                    let mut metadata = request.metadata.clone();
                    metadata.set_file(path);
                    Some(metadata)
                }
                None => None,
            };
            results.push(MetadataResult {
                metadata,
                repository: request.repository,
                error: None,
            });
        }
        results
    }
}

/// The "remote repository" state shared by every stub connector the provider
/// hands out, so it survives connector close between deploy calls.
#[derive(Default)]
pub struct RemoteState {
    /// metadata coordinate -> document bytes
    pub metadata: Mutex<HashMap<String, Vec<u8>>>,
    /// artifact coordinate -> uploaded bytes
    pub artifacts: Mutex<HashMap<String, Vec<u8>>>,
    /// coordinates in upload order
    pub uploaded: Mutex<Vec<String>>,
}

/// Connector stub performing "transfers" against [`RemoteState`].
pub struct StubConnector {
    state: Arc<RemoteState>,
    fail_on: Option<String>,
    closed: Arc<AtomicUsize>,
    metadata_gets: Arc<AtomicUsize>,
}

#[async_trait]
impl RepositoryConnector for StubConnector {
    async fn get(
        &self,
        artifact_downloads: &mut [ArtifactDownload],
        metadata_downloads: &mut [MetadataDownload],
    ) {
        for download in artifact_downloads.iter_mut() {
            download.set_state(TransferState::Active);
            download.set_error(Error::Transfer {
                path: download.artifact().to_string(),
                reason: "artifact downloads are not served by this stub".into(),
            });
            download.set_state(TransferState::Done);
        }
        for download in metadata_downloads.iter_mut() {
            self.metadata_gets.fetch_add(1, Ordering::SeqCst);
            download.set_state(TransferState::Active);
            let key = metadata_key(download.metadata());
            let doc = self.state.metadata.lock().unwrap().get(&key).cloned();
            match doc {
                Some(content) => {
                    std::fs::create_dir_all(download.file().parent().unwrap()).unwrap();
                    std::fs::write(download.file(), content).unwrap();
                }
                None => download.set_error(Error::MetadataNotFound {
                    path: key,
                    repository: "stub".into(),
                }),
            }
            download.set_state(TransferState::Done);
        }
    }

    async fn put(
        &self,
        artifact_uploads: &mut [ArtifactUpload],
        metadata_uploads: &mut [MetadataUpload],
    ) {
        for upload in metadata_uploads.iter_mut() {
            upload.set_state(TransferState::Active);
            let key = metadata_key(upload.metadata());
            match std::fs::read(upload.file()) {
                Ok(content) => {
                    self.state.metadata.lock().unwrap().insert(key.clone(), content);
                    self.state.uploaded.lock().unwrap().push(key);
                }
                Err(e) => upload.set_error(e.into()),
            }
            upload.set_state(TransferState::Done);
        }
        for upload in artifact_uploads.iter_mut() {
            upload.set_state(TransferState::Active);
            let coords = upload.artifact().to_string();
            let failed = self
                .fail_on
                .as_ref()
                .is_some_and(|pattern| coords.contains(pattern.as_str()));
            if failed {
                upload.set_error(Error::Transfer {
                    path: coords,
                    reason: "injected failure".into(),
                });
            } else {
                match std::fs::read(upload.file()) {
                    Ok(content) => {
                        self.state.artifacts.lock().unwrap().insert(coords.clone(), content);
                        self.state.uploaded.lock().unwrap().push(coords);
                    }
                    Err(e) => upload.set_error(e.into()),
                }
            }
            upload.set_state(TransferState::Done);
        }
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Provider handing out [`StubConnector`]s over one shared remote state.
#[derive(Default)]
pub struct StubConnectorProvider {
    pub state: Arc<RemoteState>,
    pub fail_on: Option<String>,
    pub connects: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    pub metadata_gets: Arc<AtomicUsize>,
}

impl StubConnectorProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(pattern: &str) -> Self {
        Self {
            fail_on: Some(pattern.to_string()),
            ..Self::default()
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn metadata_get_count(&self) -> usize {
        self.metadata_gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectorProvider for StubConnectorProvider {
    async fn connect(
        &self,
        _session: &Session,
        _repository: &RemoteRepository,
    ) -> Result<Box<dyn RepositoryConnector>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubConnector {
            state: self.state.clone(),
            fail_on: self.fail_on.clone(),
            closed: self.closed.clone(),
            metadata_gets: self.metadata_gets.clone(),
        }))
    }
}

/// Update-check collaborator recording every touch.
#[derive(Default)]
pub struct RecordingUpdateChecks {
    pub touched: Mutex<Vec<String>>,
}

impl UpdateCheckManager for RecordingUpdateChecks {
    fn touch_metadata(
        &self,
        _session: &Session,
        metadata: &Metadata,
        _file: &Path,
        repository: &RemoteRepository,
    ) {
        self.touched
            .lock()
            .unwrap()
            .push(format!("{}@{}", metadata, repository.id));
    }
}

/// Listener recording the notification sequence.
#[derive(Default)]
pub struct RecordingListener {
    pub events: Mutex<Vec<String>>,
}

impl RecordingListener {
    fn record(&self, name: &str) {
        self.events.lock().unwrap().push(name.to_string());
    }

    pub fn names(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RepositoryListener for RecordingListener {
    fn metadata_resolving(&self, _event: &RepositoryEvent<'_>) {
        self.record("metadata_resolving");
    }
    fn metadata_resolved(&self, _event: &RepositoryEvent<'_>) {
        self.record("metadata_resolved");
    }
    fn metadata_invalid(&self, _event: &RepositoryEvent<'_>) {
        self.record("metadata_invalid");
    }
    fn artifact_deploying(&self, _event: &RepositoryEvent<'_>) {
        self.record("artifact_deploying");
    }
    fn artifact_deployed(&self, _event: &RepositoryEvent<'_>) {
        self.record("artifact_deployed");
    }
    fn metadata_deploying(&self, _event: &RepositoryEvent<'_>) {
        self.record("metadata_deploying");
    }
    fn metadata_deployed(&self, _event: &RepositoryEvent<'_>) {
        self.record("metadata_deployed");
    }
}

/// Workspace reader exposing a fixed set of versions.
pub struct StaticWorkspace {
    repository: WorkspaceRepository,
    versions: Vec<String>,
}

impl StaticWorkspace {
    pub fn new(versions: &[&str]) -> Self {
        Self {
            repository: WorkspaceRepository::new("workspace"),
            versions: versions.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl WorkspaceReader for StaticWorkspace {
    fn repository(&self) -> &WorkspaceRepository {
        &self.repository
    }

    fn find_versions(&self, _artifact: &Artifact) -> Vec<String> {
        self.versions.clone()
    }
}

/// Number of entries in a session's cache, zero when disabled.
pub fn cache_len(session: &Session) -> usize {
    session.cache().map(|c: &Arc<SessionCache>| c.len()).unwrap_or(0)
}
