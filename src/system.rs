//! Stable entry point over the resolver and deployer components.

use std::sync::Arc;

use crate::connector::ConnectorProvider;
use crate::deployer::{DeployRequest, DeployResult, Deployer, UpdateCheckManager};
use crate::error::{Error, Result};
use crate::resolver::{
    MetadataRequest, MetadataResolver, MetadataResult, VersionRequest, VersionResolver,
    VersionResult,
};
use crate::session::Session;

/// Facade dispatching to the version resolver, the deployer and the
/// metadata-resolution collaborator.
pub struct RepositorySystem {
    version_resolver: VersionResolver,
    deployer: Deployer,
    metadata_resolver: Arc<dyn MetadataResolver>,
}

impl std::fmt::Debug for RepositorySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositorySystem").finish_non_exhaustive()
    }
}

impl RepositorySystem {
    pub fn builder() -> RepositorySystemBuilder {
        RepositorySystemBuilder::default()
    }

    /// Resolve one (possibly symbolic) version. See
    /// [`VersionResolver::resolve_version`].
    pub async fn resolve_version(
        &self,
        session: &Session,
        request: &VersionRequest,
    ) -> Result<VersionResult> {
        self.version_resolver.resolve_version(session, request).await
    }

    /// Batch-resolve metadata documents, delegating to the configured
    /// metadata resolver.
    pub async fn resolve_metadata(
        &self,
        session: &Session,
        requests: Vec<MetadataRequest>,
    ) -> Vec<MetadataResult> {
        self.metadata_resolver.resolve_metadata(session, requests).await
    }

    /// Deploy artifacts and metadata. See [`Deployer::deploy`].
    pub async fn deploy(&self, session: &Session, request: DeployRequest) -> Result<DeployResult> {
        self.deployer.deploy(session, request).await
    }
}

/// Builder collecting the collaborators a [`RepositorySystem`] requires.
/// Missing collaborators fail construction, not first use.
#[derive(Default)]
pub struct RepositorySystemBuilder {
    metadata_resolver: Option<Arc<dyn MetadataResolver>>,
    connectors: Option<Arc<dyn ConnectorProvider>>,
    update_checks: Option<Arc<dyn UpdateCheckManager>>,
}

impl RepositorySystemBuilder {
    pub fn metadata_resolver(mut self, metadata_resolver: Arc<dyn MetadataResolver>) -> Self {
        self.metadata_resolver = Some(metadata_resolver);
        self
    }

    pub fn connector_provider(mut self, connectors: Arc<dyn ConnectorProvider>) -> Self {
        self.connectors = Some(connectors);
        self
    }

    pub fn update_check_manager(mut self, update_checks: Arc<dyn UpdateCheckManager>) -> Self {
        self.update_checks = Some(update_checks);
        self
    }

    pub fn build(self) -> Result<RepositorySystem> {
        let metadata_resolver = self
            .metadata_resolver
            .ok_or_else(|| Error::Config("metadata resolver has not been specified".into()))?;
        let connectors = self
            .connectors
            .ok_or_else(|| Error::Config("connector provider has not been specified".into()))?;
        let update_checks = self
            .update_checks
            .ok_or_else(|| Error::Config("update check manager has not been specified".into()))?;

        Ok(RepositorySystem {
            version_resolver: VersionResolver::new(metadata_resolver.clone()),
            deployer: Deployer::new(connectors, update_checks),
            metadata_resolver,
        })
    }
}
