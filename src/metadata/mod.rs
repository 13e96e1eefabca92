//! Repository metadata: natures, variants and the merge protocol.
//!
//! A metadata item is either *mergeable* (it folds a freshly downloaded
//! remote document into its own pending state before being written back) or
//! *copyable* (a merge degrades to a plain file copy). The distinction is a
//! variant of the [`Metadata`] enum, decided once at construction, never
//! re-inspected per call site.

pub mod document;
pub mod snapshot;
pub mod versions;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::artifact::Artifact;

pub use snapshot::RemoteSnapshotMetadata;
pub use versions::VersionsMetadata;

/// Standard file name of repository-level metadata documents.
pub const MAVEN_METADATA_XML: &str = "maven-metadata.xml";

/// The kind of versions a metadata document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nature {
    Release,
    Snapshot,
    ReleaseOrSnapshot,
}

impl Nature {
    pub fn includes_releases(self) -> bool {
        !matches!(self, Nature::Snapshot)
    }

    pub fn includes_snapshots(self) -> bool {
        !matches!(self, Nature::Release)
    }
}

/// A metadata item handled by the resolver or deployer.
#[derive(Debug, Clone)]
pub enum Metadata {
    /// Repository-maintained snapshot metadata, merged on deploy to allocate
    /// the shared timestamp/build-number.
    Snapshot(RemoteSnapshotMetadata),
    /// Repository-maintained versions-list metadata, merged on deploy.
    Versions(VersionsMetadata),
    /// Any other metadata; merges degrade to a byte-for-byte copy.
    Plain(PlainMetadata),
}

/// Non-mergeable metadata, also used as the request descriptor handed to the
/// metadata-resolution collaborator.
#[derive(Debug, Clone)]
pub struct PlainMetadata {
    pub group_id: String,
    pub artifact_id: String,
    /// Version scope, empty for group/artifact-level metadata.
    pub version: String,
    pub file_name: String,
    pub nature: Nature,
    pub file: Option<PathBuf>,
}

impl Metadata {
    /// Descriptor for a standard group/artifact(+version) metadata document.
    pub fn plain(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        nature: Nature,
    ) -> Self {
        Metadata::Plain(PlainMetadata {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            file_name: MAVEN_METADATA_XML.into(),
            nature,
            file: None,
        })
    }

    pub fn group_id(&self) -> &str {
        match self {
            Metadata::Snapshot(m) => m.group_id(),
            Metadata::Versions(m) => m.group_id(),
            Metadata::Plain(m) => &m.group_id,
        }
    }

    pub fn artifact_id(&self) -> &str {
        match self {
            Metadata::Snapshot(m) => m.artifact_id(),
            Metadata::Versions(m) => m.artifact_id(),
            Metadata::Plain(m) => &m.artifact_id,
        }
    }

    /// The version scope, empty for group/artifact-level metadata.
    pub fn version(&self) -> &str {
        match self {
            Metadata::Snapshot(m) => m.base_version(),
            Metadata::Versions(_) => "",
            Metadata::Plain(m) => &m.version,
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Metadata::Plain(m) => &m.file_name,
            _ => MAVEN_METADATA_XML,
        }
    }

    pub fn nature(&self) -> Nature {
        match self {
            Metadata::Snapshot(_) => Nature::Snapshot,
            Metadata::Versions(_) => Nature::ReleaseOrSnapshot,
            Metadata::Plain(m) => m.nature,
        }
    }

    /// The backing file, if any.
    pub fn file(&self) -> Option<&Path> {
        match self {
            Metadata::Snapshot(m) => m.file(),
            Metadata::Versions(m) => m.file(),
            Metadata::Plain(m) => m.file.as_deref(),
        }
    }

    pub fn set_file(&mut self, file: impl Into<PathBuf>) {
        match self {
            Metadata::Snapshot(m) => m.set_file(file),
            Metadata::Versions(m) => m.set_file(file),
            Metadata::Plain(m) => m.file = Some(file.into()),
        }
    }

    /// Whether merging folds remote state in, as opposed to copying bytes.
    pub fn is_mergeable(&self) -> bool {
        !matches!(self, Metadata::Plain(_))
    }

    /// Whether this is a standard repository-maintained metadata kind that
    /// the deployer manages itself.
    pub fn is_repository_maintained(&self) -> bool {
        !matches!(self, Metadata::Plain(_))
    }

    /// Whether a previous merge already fixed this metadata's state, so the
    /// remote copy need not be fetched again.
    pub fn is_resolved(&self) -> bool {
        match self {
            Metadata::Snapshot(m) => m.is_resolved(),
            _ => false,
        }
    }

    /// Combine the recessive document at `recessive` with this metadata's
    /// pending state and write the outcome to `target`. For non-mergeable
    /// metadata this copies the backing file to `target` instead.
    pub async fn merge(&mut self, recessive: &Path, target: &Path) -> Result<()> {
        match self {
            Metadata::Snapshot(m) => m.merge(recessive, target).await?,
            Metadata::Versions(m) => m.merge(recessive, target).await?,
            Metadata::Plain(m) => {
                let source = m.file.as_deref().ok_or_else(|| {
                    Error::Validation(format!("metadata {} has no backing file", m.file_name))
                })?;
                if source != target {
                    if let Some(parent) = target.parent() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                    tokio::fs::copy(source, target).await?;
                }
            }
        }
        self.set_file(target);
        Ok(())
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id(), self.artifact_id())?;
        if !self.version().is_empty() {
            write!(f, ":{}", self.version())?;
        }
        write!(f, "/{}", self.file_name())
    }
}

/// Identity of a snapshot metadata document: the non-timestamped coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub group_id: String,
    pub artifact_id: String,
    pub base_version: String,
}

impl SnapshotKey {
    pub fn of(artifact: &Artifact) -> Self {
        Self {
            group_id: artifact.group_id().to_string(),
            artifact_id: artifact.artifact_id().to_string(),
            base_version: artifact.base_version(),
        }
    }
}

/// Identity of a versions-list metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionsKey {
    pub group_id: String,
    pub artifact_id: String,
}

impl VersionsKey {
    pub fn of(artifact: &Artifact) -> Self {
        Self {
            group_id: artifact.group_id().to_string(),
            artifact_id: artifact.artifact_id().to_string(),
        }
    }
}
