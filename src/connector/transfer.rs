//! Transfer state machine for connector uploads and downloads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Error;
use crate::listener::EventCatapult;
use crate::metadata::Metadata;
use crate::models::artifact::Artifact;
use crate::models::repository::ChecksumPolicy;

/// Lifecycle of one transfer. There is no failure state: a failed transfer
/// still reaches `Done`, with the failure recorded as a captured error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    New,
    Active,
    Done,
}

/// Shared lifecycle record. A transfer is exclusively owned by the
/// orchestrator that created it for the duration of one connector call; the
/// connector only advances its state and captures at most one error.
#[derive(Debug, Default)]
struct Transfer {
    state: Option<TransferState>,
    error: Option<Error>,
}

impl Transfer {
    fn state(&self) -> TransferState {
        self.state.unwrap_or(TransferState::New)
    }

    /// Advance the state. `Done` is terminal; once reached, further
    /// transitions are ignored so completion is observed exactly once.
    /// Returns the transition actually applied, if any.
    fn advance(&mut self, state: TransferState) -> Option<TransferState> {
        if self.state() == TransferState::Done {
            return None;
        }
        self.state = Some(state);
        Some(state)
    }
}

/// An artifact upload submitted to a connector.
#[derive(Debug)]
pub struct ArtifactUpload {
    artifact: Artifact,
    file: PathBuf,
    transfer: Transfer,
    events: Option<Arc<EventCatapult>>,
}

impl ArtifactUpload {
    pub fn new(artifact: Artifact, file: impl Into<PathBuf>) -> Self {
        Self {
            artifact,
            file: file.into(),
            transfer: Transfer::default(),
            events: None,
        }
    }

    pub(crate) fn with_events(
        artifact: Artifact,
        file: impl Into<PathBuf>,
        events: Arc<EventCatapult>,
    ) -> Self {
        Self {
            events: Some(events),
            ..Self::new(artifact, file)
        }
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn state(&self) -> TransferState {
        self.transfer.state()
    }

    /// Advance the transfer state, firing deploying/deployed notifications
    /// on the `Active` and `Done` transitions. `Active` must be entered
    /// before any bytes move; `Done` fires exactly once, even on failure.
    pub fn set_state(&mut self, state: TransferState) {
        let Some(applied) = self.transfer.advance(state) else {
            return;
        };
        if let Some(events) = &self.events {
            match applied {
                TransferState::Active => events.artifact_deploying(&self.artifact, &self.file),
                TransferState::Done => events.artifact_deployed(&self.artifact, &self.file),
                TransferState::New => {}
            }
        }
    }

    pub fn set_error(&mut self, error: Error) {
        self.transfer.error = Some(error);
    }

    pub fn error(&self) -> Option<&Error> {
        self.transfer.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<Error> {
        self.transfer.error.take()
    }
}

/// A metadata upload submitted to a connector.
#[derive(Debug)]
pub struct MetadataUpload {
    metadata: Metadata,
    file: PathBuf,
    transfer: Transfer,
    events: Option<Arc<EventCatapult>>,
}

impl MetadataUpload {
    pub fn new(metadata: Metadata, file: impl Into<PathBuf>) -> Self {
        Self {
            metadata,
            file: file.into(),
            transfer: Transfer::default(),
            events: None,
        }
    }

    pub(crate) fn with_events(
        metadata: Metadata,
        file: impl Into<PathBuf>,
        events: Arc<EventCatapult>,
    ) -> Self {
        Self {
            events: Some(events),
            ..Self::new(metadata, file)
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn state(&self) -> TransferState {
        self.transfer.state()
    }

    pub fn set_state(&mut self, state: TransferState) {
        let Some(applied) = self.transfer.advance(state) else {
            return;
        };
        if let Some(events) = &self.events {
            match applied {
                TransferState::Active => events.metadata_deploying(&self.metadata, &self.file),
                TransferState::Done => events.metadata_deployed(&self.metadata, &self.file),
                TransferState::New => {}
            }
        }
    }

    pub fn set_error(&mut self, error: Error) {
        self.transfer.error = Some(error);
    }

    pub fn error(&self) -> Option<&Error> {
        self.transfer.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<Error> {
        self.transfer.error.take()
    }
}

/// An artifact download submitted to a connector.
#[derive(Debug)]
pub struct ArtifactDownload {
    artifact: Artifact,
    file: PathBuf,
    checksum_policy: ChecksumPolicy,
    transfer: Transfer,
}

impl ArtifactDownload {
    pub fn new(artifact: Artifact, file: impl Into<PathBuf>, checksum_policy: ChecksumPolicy) -> Self {
        Self {
            artifact,
            file: file.into(),
            checksum_policy,
            transfer: Transfer::default(),
        }
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn checksum_policy(&self) -> ChecksumPolicy {
        self.checksum_policy
    }

    pub fn state(&self) -> TransferState {
        self.transfer.state()
    }

    pub fn set_state(&mut self, state: TransferState) {
        self.transfer.advance(state);
    }

    pub fn set_error(&mut self, error: Error) {
        self.transfer.error = Some(error);
    }

    pub fn error(&self) -> Option<&Error> {
        self.transfer.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<Error> {
        self.transfer.error.take()
    }
}

/// A metadata download submitted to a connector.
#[derive(Debug)]
pub struct MetadataDownload {
    metadata: Metadata,
    file: PathBuf,
    checksum_policy: ChecksumPolicy,
    transfer: Transfer,
}

impl MetadataDownload {
    pub fn new(metadata: Metadata, file: impl Into<PathBuf>, checksum_policy: ChecksumPolicy) -> Self {
        Self {
            metadata,
            file: file.into(),
            checksum_policy,
            transfer: Transfer::default(),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn checksum_policy(&self) -> ChecksumPolicy {
        self.checksum_policy
    }

    pub fn state(&self) -> TransferState {
        self.transfer.state()
    }

    pub fn set_state(&mut self, state: TransferState) {
        self.transfer.advance(state);
    }

    pub fn set_error(&mut self, error: Error) {
        self.transfer.error = Some(error);
    }

    pub fn error(&self) -> Option<&Error> {
        self.transfer.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<Error> {
        self.transfer.error.take()
    }
}
