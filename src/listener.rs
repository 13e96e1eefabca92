//! Repository listener: best-effort observer of resolution and deployment.

use std::path::Path;
use std::sync::Arc;

use crate::error::Error;
use crate::metadata::Metadata;
use crate::models::artifact::Artifact;
use crate::models::repository::RemoteRepository;

/// A notification about one resolution or deployment step.
#[derive(Default)]
pub struct RepositoryEvent<'a> {
    pub artifact: Option<&'a Artifact>,
    pub metadata: Option<&'a Metadata>,
    pub repository: Option<&'a RemoteRepository>,
    pub file: Option<&'a Path>,
    pub error: Option<&'a Error>,
}

/// Observer of repository operations.
///
/// All notifications are synchronous and best-effort: correctness never
/// depends on a listener being present, and implementations must not block
/// indefinitely. Every method defaults to a no-op.
#[allow(unused_variables)]
pub trait RepositoryListener: Send + Sync {
    fn metadata_resolving(&self, event: &RepositoryEvent<'_>) {}
    fn metadata_resolved(&self, event: &RepositoryEvent<'_>) {}
    fn metadata_invalid(&self, event: &RepositoryEvent<'_>) {}
    fn artifact_deploying(&self, event: &RepositoryEvent<'_>) {}
    fn artifact_deployed(&self, event: &RepositoryEvent<'_>) {}
    fn metadata_deploying(&self, event: &RepositoryEvent<'_>) {}
    fn metadata_deployed(&self, event: &RepositoryEvent<'_>) {}
}

/// Handle over an optional listener. Invocations on an absent listener are
/// no-ops, so call sites never null-check.
#[derive(Clone, Default)]
pub struct Listeners(Option<Arc<dyn RepositoryListener>>);

impl Listeners {
    pub fn new(listener: Option<Arc<dyn RepositoryListener>>) -> Self {
        Self(listener)
    }

    pub fn metadata_resolving(&self, event: &RepositoryEvent<'_>) {
        if let Some(listener) = &self.0 {
            listener.metadata_resolving(event);
        }
    }

    pub fn metadata_resolved(&self, event: &RepositoryEvent<'_>) {
        if let Some(listener) = &self.0 {
            listener.metadata_resolved(event);
        }
    }

    pub fn metadata_invalid(&self, event: &RepositoryEvent<'_>) {
        if let Some(listener) = &self.0 {
            listener.metadata_invalid(event);
        }
    }

    pub fn artifact_deploying(&self, event: &RepositoryEvent<'_>) {
        if let Some(listener) = &self.0 {
            listener.artifact_deploying(event);
        }
    }

    pub fn artifact_deployed(&self, event: &RepositoryEvent<'_>) {
        if let Some(listener) = &self.0 {
            listener.artifact_deployed(event);
        }
    }

    pub fn metadata_deploying(&self, event: &RepositoryEvent<'_>) {
        if let Some(listener) = &self.0 {
            listener.metadata_deploying(event);
        }
    }

    pub fn metadata_deployed(&self, event: &RepositoryEvent<'_>) {
        if let Some(listener) = &self.0 {
            listener.metadata_deployed(event);
        }
    }
}

/// Bundles the listener handle with the deploy target so transfers can fire
/// deploying/deployed notifications as their state advances.
pub(crate) struct EventCatapult {
    listeners: Listeners,
    repository: RemoteRepository,
}

impl std::fmt::Debug for EventCatapult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCatapult")
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

impl EventCatapult {
    pub(crate) fn new(listeners: Listeners, repository: RemoteRepository) -> Self {
        Self {
            listeners,
            repository,
        }
    }

    pub(crate) fn artifact_deploying(&self, artifact: &Artifact, file: &Path) {
        self.listeners.artifact_deploying(&RepositoryEvent {
            artifact: Some(artifact),
            repository: Some(&self.repository),
            file: Some(file),
            ..Default::default()
        });
    }

    pub(crate) fn artifact_deployed(&self, artifact: &Artifact, file: &Path) {
        self.listeners.artifact_deployed(&RepositoryEvent {
            artifact: Some(artifact),
            repository: Some(&self.repository),
            file: Some(file),
            ..Default::default()
        });
    }

    pub(crate) fn metadata_deploying(&self, metadata: &Metadata, file: &Path) {
        self.listeners.metadata_deploying(&RepositoryEvent {
            metadata: Some(metadata),
            repository: Some(&self.repository),
            file: Some(file),
            ..Default::default()
        });
    }

    pub(crate) fn metadata_deployed(&self, metadata: &Metadata, file: &Path) {
        self.listeners.metadata_deployed(&RepositoryEvent {
            metadata: Some(metadata),
            repository: Some(&self.repository),
            file: Some(file),
            ..Default::default()
        });
    }
}
