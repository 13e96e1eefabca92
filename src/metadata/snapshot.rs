//! Snapshot metadata shared by all artifacts of one deployed project version.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Utc;

use crate::error::Result;
use crate::metadata::document::{
    format_last_updated, format_snapshot_timestamp, MetadataDocument, Snapshot, SnapshotVersion,
};
use crate::metadata::SnapshotKey;
use crate::models::artifact::{Artifact, SNAPSHOT};

/// The timestamp and build number allocated for one deployment round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotIdentity {
    /// `yyyyMMdd.HHmmss` qualifier timestamp
    pub timestamp: String,
    pub build_number: u32,
    /// `yyyyMMddHHmmss` form of the same instant
    pub last_updated: String,
}

impl SnapshotIdentity {
    /// The version qualifier substituted for the `SNAPSHOT` keyword.
    pub fn qualifier(&self) -> String {
        format!("{}-{}", self.timestamp, self.build_number)
    }
}

/// Mergeable metadata keyed by the non-timestamped artifact coordinate.
///
/// Artifacts of one project version are bound to a single instance so they
/// share one timestamp and build number. The identity is allocated exactly
/// once, on the first merge against the remote document; later merges (the
/// deploy-by-deploy reuse mode) keep the allocated identity and only fold in
/// additional bound artifacts.
#[derive(Debug, Clone)]
pub struct RemoteSnapshotMetadata {
    group_id: String,
    artifact_id: String,
    base_version: String,
    /// (classifier, extension) pairs awaiting qualifier assignment
    bound: Vec<(String, String)>,
    identity: OnceLock<SnapshotIdentity>,
    file: Option<PathBuf>,
}

impl RemoteSnapshotMetadata {
    pub fn new(artifact: &Artifact) -> Self {
        Self {
            group_id: artifact.group_id().to_string(),
            artifact_id: artifact.artifact_id().to_string(),
            base_version: artifact.base_version(),
            bound: Vec::new(),
            identity: OnceLock::new(),
            file: None,
        }
    }

    pub fn key(&self) -> SnapshotKey {
        SnapshotKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            base_version: self.base_version.clone(),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn base_version(&self) -> &str {
        &self.base_version
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn set_file(&mut self, file: impl Into<PathBuf>) {
        self.file = Some(file.into());
    }

    /// Register an artifact as sharing this metadata's snapshot identity.
    pub fn bind(&mut self, artifact: &Artifact) {
        let entry = (
            artifact.classifier().to_string(),
            artifact.extension().to_string(),
        );
        if !self.bound.contains(&entry) {
            self.bound.push(entry);
        }
    }

    /// Whether the snapshot identity has been allocated by a prior merge.
    pub fn is_resolved(&self) -> bool {
        self.identity.get().is_some()
    }

    pub fn identity(&self) -> Option<&SnapshotIdentity> {
        self.identity.get()
    }

    /// The concrete timestamped version for a bound artifact, available once
    /// this metadata has been merged.
    pub fn expanded_version(&self, artifact: &Artifact) -> Option<String> {
        let identity = self.identity.get()?;
        let base = artifact.base_version();
        let prefix = base.strip_suffix(SNAPSHOT)?;
        Some(format!("{}{}", prefix, identity.qualifier()))
    }

    /// Fold the recessive document at `recessive` together with the bound
    /// artifacts into `target`. The first merge allocates the snapshot
    /// identity by bumping the recessive build number.
    pub async fn merge(&mut self, recessive: &Path, target: &Path) -> Result<()> {
        let mut document = MetadataDocument::read(recessive).await?.unwrap_or_default();

        let identity = self.identity.get_or_init(|| {
            let now = Utc::now();
            let build_number = document
                .versioning
                .snapshot
                .as_ref()
                .map(|s| s.build_number)
                .unwrap_or(0)
                + 1;
            SnapshotIdentity {
                timestamp: format_snapshot_timestamp(now),
                build_number,
                last_updated: format_last_updated(now),
            }
        });

        document.group_id = self.group_id.clone();
        document.artifact_id = self.artifact_id.clone();
        document.version = Some(self.base_version.clone());
        document.versioning.snapshot = Some(Snapshot {
            timestamp: Some(identity.timestamp.clone()),
            build_number: identity.build_number,
        });
        document.versioning.last_updated = Some(identity.last_updated.clone());

        let version = self
            .base_version
            .strip_suffix(SNAPSHOT)
            .map(|prefix| format!("{}{}", prefix, identity.qualifier()))
            .unwrap_or_else(|| self.base_version.clone());

        let entries = &mut document.versioning.snapshot_versions.snapshot_versions;
        for (classifier, extension) in &self.bound {
            let entry = SnapshotVersion {
                classifier: classifier.clone(),
                extension: extension.clone(),
                version: version.clone(),
                updated: identity.last_updated.clone(),
            };
            match entries
                .iter_mut()
                .find(|sv| sv.classifier == *classifier && sv.extension == *extension)
            {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }

        document.write(target).await?;
        self.file = Some(target.to_path_buf());

        tracing::debug!(
            metadata = %format!("{}:{}:{}", self.group_id, self.artifact_id, self.base_version),
            build_number = identity.build_number,
            timestamp = %identity.timestamp,
            "merged snapshot metadata"
        );
        Ok(())
    }
}
