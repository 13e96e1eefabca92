//! Resolution session: the shared state one sequence of operations runs under.

use std::sync::Arc;

use crate::cache::SessionCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::listener::{Listeners, RepositoryListener};
use crate::local::{LocalRepositoryManager, SimpleLocalRepositoryManager, WorkspaceReader};

/// A session shared by concurrent resolution and deployment operations.
///
/// The session owns the optional resolution cache, the optional repository
/// listener, the optional workspace reader and the local repository manager.
/// All of them are behind `Arc`s, so a session is cheap to share across
/// tasks.
#[derive(Clone)]
pub struct Session {
    config: Config,
    cache: Option<Arc<SessionCache>>,
    listeners: Listeners,
    workspace: Option<Arc<dyn WorkspaceReader>>,
    local_repository_manager: Arc<dyn LocalRepositoryManager>,
}

impl Session {
    /// Start building a session from the given configuration. The local
    /// repository manager defaults to the standard layout rooted at the
    /// configured local repository.
    pub fn builder(config: Config) -> SessionBuilder {
        SessionBuilder {
            local_repository_manager: Some(Arc::new(SimpleLocalRepositoryManager::new(
                config.local_repository.clone(),
            ))),
            config,
            cache: Some(Arc::new(SessionCache::new())),
            listener: None,
            workspace: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_offline(&self) -> bool {
        self.config.offline
    }

    pub fn cache(&self) -> Option<&Arc<SessionCache>> {
        self.cache.as_ref()
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn workspace(&self) -> Option<&Arc<dyn WorkspaceReader>> {
        self.workspace.as_ref()
    }

    pub fn local_repository_manager(&self) -> &Arc<dyn LocalRepositoryManager> {
        &self.local_repository_manager
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    config: Config,
    cache: Option<Arc<SessionCache>>,
    listener: Option<Arc<dyn RepositoryListener>>,
    workspace: Option<Arc<dyn WorkspaceReader>>,
    local_repository_manager: Option<Arc<dyn LocalRepositoryManager>>,
}

impl SessionBuilder {
    /// Disable the resolution cache.
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn listener(mut self, listener: Arc<dyn RepositoryListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn workspace(mut self, workspace: Arc<dyn WorkspaceReader>) -> Self {
        self.workspace = Some(workspace);
        self
    }

    pub fn local_repository_manager(mut self, manager: Arc<dyn LocalRepositoryManager>) -> Self {
        self.local_repository_manager = Some(manager);
        self
    }

    pub fn build(self) -> Result<Session> {
        let local_repository_manager = self
            .local_repository_manager
            .ok_or_else(|| Error::Config("local repository manager has not been specified".into()))?;
        Ok(Session {
            config: self.config,
            cache: self.cache,
            listeners: Listeners::new(self.listener),
            workspace: self.workspace,
            local_repository_manager,
        })
    }
}
