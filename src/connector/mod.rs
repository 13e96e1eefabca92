//! The repository connector contract.

pub mod transfer;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::repository::RemoteRepository;
use crate::session::Session;

pub use transfer::{
    ArtifactDownload, ArtifactUpload, MetadataDownload, MetadataUpload, TransferState,
};

/// A connector performing batches of downloads and uploads against one
/// remote repository.
///
/// A connector never fails a batch call for a per-item problem: it records
/// the error on the affected transfer and carries on. For every transfer it
/// must enter [`TransferState::Active`] before any bytes move and
/// [`TransferState::Done`] when finished, failed or not; all submitted
/// transfers have reached `Done` by the time `get`/`put` returns. Within one
/// `put` batch, metadata uploads are processed before artifact uploads.
/// Empty collections are accepted without error. Connectors own no retry
/// policy; callers decide.
#[async_trait]
pub trait RepositoryConnector: Send + Sync {
    /// Perform the given downloads, recording any per-item error on the
    /// transfer itself.
    async fn get(
        &self,
        artifact_downloads: &mut [ArtifactDownload],
        metadata_downloads: &mut [MetadataDownload],
    );

    /// Perform the given uploads, recording any per-item error on the
    /// transfer itself.
    async fn put(
        &self,
        artifact_uploads: &mut [ArtifactUpload],
        metadata_uploads: &mut [MetadataUpload],
    );

    /// Release all held network resources. Closing is idempotent; no
    /// transfer may be submitted afterwards. Outstanding transfers are
    /// resolved to a failure promptly, in a connector-defined way.
    async fn close(&self);
}

/// Yields a connector for a remote repository, typically by matching the
/// repository's content type against the available transports.
#[async_trait]
pub trait ConnectorProvider: Send + Sync {
    async fn connect(
        &self,
        session: &Session,
        repository: &RemoteRepository,
    ) -> Result<Box<dyn RepositoryConnector>>;
}
