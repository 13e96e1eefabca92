//! Versions-list metadata maintained at the group/artifact level.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::Result;
use crate::metadata::document::{format_last_updated, MetadataDocument};
use crate::metadata::VersionsKey;
use crate::models::artifact::Artifact;

/// Mergeable metadata accumulating the list of deployed versions for one
/// group/artifact pair, along with the `latest`/`release` markers.
#[derive(Debug, Clone)]
pub struct VersionsMetadata {
    group_id: String,
    artifact_id: String,
    /// The (base) version being deployed
    version: String,
    snapshot: bool,
    file: Option<PathBuf>,
}

impl VersionsMetadata {
    pub fn new(artifact: &Artifact) -> Self {
        Self {
            group_id: artifact.group_id().to_string(),
            artifact_id: artifact.artifact_id().to_string(),
            version: artifact.base_version(),
            snapshot: artifact.is_snapshot(),
            file: None,
        }
    }

    pub fn key(&self) -> VersionsKey {
        VersionsKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn set_file(&mut self, file: impl Into<PathBuf>) {
        self.file = Some(file.into());
    }

    /// Fold the deployed version into the recessive document and write the
    /// outcome to `target`.
    pub async fn merge(&mut self, recessive: &Path, target: &Path) -> Result<()> {
        let mut document = MetadataDocument::read(recessive).await?.unwrap_or_default();

        document.group_id = self.group_id.clone();
        document.artifact_id = self.artifact_id.clone();
        document.version = None;

        let versions = &mut document.versioning.versions.versions;
        if !versions.contains(&self.version) {
            versions.push(self.version.clone());
        }
        document.versioning.latest = Some(self.version.clone());
        if !self.snapshot {
            document.versioning.release = Some(self.version.clone());
        }
        document.versioning.last_updated = Some(format_last_updated(Utc::now()));
        document.versioning.snapshot = None;
        document.versioning.snapshot_versions.snapshot_versions.clear();

        document.write(target).await?;
        self.file = Some(target.to_path_buf());
        Ok(())
    }
}
