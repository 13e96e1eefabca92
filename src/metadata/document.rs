//! `maven-metadata.xml` document model and I/O.
//!
//! Parsing uses quick-xml's serde integration; rendering builds the document
//! with a plain string writer so the output stays byte-stable across
//! round-trips.

use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Format a `lastUpdated` timestamp (`yyyyMMddHHmmss`, UTC).
///
/// The fixed-width zero-padded layout is what makes the resolver's
/// lexicographic timestamp comparison order correctly.
pub fn format_last_updated(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// Format a snapshot qualifier timestamp (`yyyyMMdd.HHmmss`, UTC).
pub fn format_snapshot_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d.%H%M%S").to_string()
}

/// Root of a repository metadata document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetadataDocument {
    #[serde(rename = "groupId", default)]
    pub group_id: String,
    #[serde(rename = "artifactId", default)]
    pub artifact_id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub versioning: Versioning,
}

/// The `versioning` block of a metadata document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Versioning {
    /// Latest version of any kind
    #[serde(default)]
    pub latest: Option<String>,
    /// Latest non-snapshot version
    #[serde(default)]
    pub release: Option<String>,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub versions: VersionList,
    #[serde(default)]
    pub snapshot: Option<Snapshot>,
    #[serde(rename = "snapshotVersions", default)]
    pub snapshot_versions: SnapshotVersionList,
}

impl Versioning {
    pub fn last_updated(&self) -> &str {
        self.last_updated.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VersionList {
    #[serde(rename = "version", default)]
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SnapshotVersionList {
    #[serde(rename = "snapshotVersion", default)]
    pub snapshot_versions: Vec<SnapshotVersion>,
}

/// The raw snapshot identity block: a timestamp plus build number used to
/// derive a qualifier when no per-classifier entry exists.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "buildNumber", default)]
    pub build_number: u32,
}

/// A fully resolved snapshot version for one classifier/extension pair.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SnapshotVersion {
    #[serde(default)]
    pub classifier: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub updated: String,
}

impl MetadataDocument {
    /// Parse a metadata document from raw bytes.
    pub fn parse(path: &Path, content: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(content).map_err(|e| Error::InvalidMetadata {
            path: path.display().to_string(),
            reason: format!("invalid UTF-8: {}", e),
        })?;
        quick_xml::de::from_str(text).map_err(|e| Error::InvalidMetadata {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Read and parse a metadata document. A missing file is not an error,
    /// it reports as `Ok(None)`.
    pub async fn read(path: &Path) -> Result<Option<Self>> {
        match tokio::fs::read(path).await {
            Ok(content) => Self::parse(path, &content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Render the document as XML.
    pub fn render(&self) -> Bytes {
        let mut xml = String::with_capacity(512);
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<metadata>\n");
        push_element(&mut xml, 2, "groupId", &self.group_id);
        push_element(&mut xml, 2, "artifactId", &self.artifact_id);
        if let Some(version) = &self.version {
            push_element(&mut xml, 2, "version", version);
        }
        xml.push_str("  <versioning>\n");
        if let Some(latest) = &self.versioning.latest {
            push_element(&mut xml, 4, "latest", latest);
        }
        if let Some(release) = &self.versioning.release {
            push_element(&mut xml, 4, "release", release);
        }
        if let Some(snapshot) = &self.versioning.snapshot {
            xml.push_str("    <snapshot>\n");
            if let Some(timestamp) = &snapshot.timestamp {
                push_element(&mut xml, 6, "timestamp", timestamp);
            }
            push_element(&mut xml, 6, "buildNumber", &snapshot.build_number.to_string());
            xml.push_str("    </snapshot>\n");
        }
        if !self.versioning.versions.versions.is_empty() {
            xml.push_str("    <versions>\n");
            for version in &self.versioning.versions.versions {
                push_element(&mut xml, 6, "version", version);
            }
            xml.push_str("    </versions>\n");
        }
        if let Some(last_updated) = &self.versioning.last_updated {
            push_element(&mut xml, 4, "lastUpdated", last_updated);
        }
        let snapshot_versions = &self.versioning.snapshot_versions.snapshot_versions;
        if !snapshot_versions.is_empty() {
            xml.push_str("    <snapshotVersions>\n");
            for sv in snapshot_versions {
                xml.push_str("      <snapshotVersion>\n");
                if !sv.classifier.is_empty() {
                    push_element(&mut xml, 8, "classifier", &sv.classifier);
                }
                if !sv.extension.is_empty() {
                    push_element(&mut xml, 8, "extension", &sv.extension);
                }
                push_element(&mut xml, 8, "version", &sv.version);
                push_element(&mut xml, 8, "updated", &sv.updated);
                xml.push_str("      </snapshotVersion>\n");
            }
            xml.push_str("    </snapshotVersions>\n");
        }
        xml.push_str("  </versioning>\n");
        xml.push_str("</metadata>\n");
        Bytes::from(xml)
    }

    /// Render and write the document, creating parent directories as needed.
    pub async fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.render()).await?;
        Ok(())
    }
}

fn push_element(xml: &mut String, indent: usize, name: &str, value: &str) {
    for _ in 0..indent {
        xml.push(' ');
    }
    xml.push('<');
    xml.push_str(name);
    xml.push('>');
    xml.push_str(&escape(value));
    xml.push_str("</");
    xml.push_str(name);
    xml.push_str(">\n");
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
