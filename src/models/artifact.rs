//! Immutable artifact coordinates.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// The symbolic token requesting the newest release version.
pub const RELEASE: &str = "RELEASE";

/// The symbolic token requesting the newest version of any kind.
pub const LATEST: &str = "LATEST";

/// The suffix marking a floating snapshot version.
pub const SNAPSHOT: &str = "SNAPSHOT";

/// A specific artifact, identified by group, name, version, classifier and
/// extension.
///
/// Instances are immutable: every mutator returns a new artifact and leaves
/// the original unchanged. Artifacts that have been resolved or deployed
/// carry the expanded version (e.g. `1.0-20230102.030405-7`) while
/// [`Artifact::base_version`] keeps reporting the unresolved meta version
/// (`1.0-SNAPSHOT`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    group_id: String,
    artifact_id: String,
    version: String,
    classifier: String,
    extension: String,
    file: Option<PathBuf>,
    properties: HashMap<String, String>,
}

impl Artifact {
    /// Create an artifact with an empty classifier.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        extension: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: String::new(),
            extension: extension.into(),
            file: None,
            properties: HashMap::new(),
        }
    }

    /// Create an artifact with an explicit classifier.
    pub fn with_classifier(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        classifier: impl Into<String>,
        extension: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            classifier: classifier.into(),
            ..Self::new(group_id, artifact_id, extension, version)
        }
    }

    /// Parse coordinates of the form
    /// `groupId:artifactId[:extension[:classifier]]:version`.
    pub fn from_coords(coords: &str) -> Result<Self> {
        let parts: Vec<&str> = coords.split(':').collect();
        match parts.as_slice() {
            [g, a, v] => Ok(Self::new(*g, *a, "jar", *v)),
            [g, a, e, v] => Ok(Self::new(*g, *a, *e, *v)),
            [g, a, e, c, v] => Ok(Self::with_classifier(*g, *a, *c, *e, *v)),
            _ => Err(Error::Validation(format!(
                "bad coordinates {:?}, expected <groupId>:<artifactId>[:<extension>[:<classifier>]]:<version>",
                coords
            ))),
        }
        .and_then(|artifact| {
            if parts.iter().any(|p| p.is_empty()) {
                Err(Error::Validation(format!(
                    "bad coordinates {:?}, empty segment",
                    coords
                )))
            } else {
                Ok(artifact)
            }
        })
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// The version, possibly expanded for resolved/deployed snapshots.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns a new artifact with the given version.
    pub fn set_version(&self, version: impl Into<String>) -> Self {
        let mut artifact = self.clone();
        artifact.version = version.into();
        artifact
    }

    /// The unresolved meta version, e.g. `1.0-SNAPSHOT` for an artifact whose
    /// version was expanded to `1.0-20230102.030405-7`.
    pub fn base_version(&self) -> String {
        match timestamped_prefix(&self.version) {
            Some(prefix) => format!("{}{}", prefix, SNAPSHOT),
            None => self.version.clone(),
        }
    }

    /// Whether this artifact uses a snapshot version, expanded or not.
    pub fn is_snapshot(&self) -> bool {
        self.version.ends_with(SNAPSHOT) || timestamped_prefix(&self.version).is_some()
    }

    /// The classifier, empty if none.
    pub fn classifier(&self) -> &str {
        &self.classifier
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The local file, present only for resolved or to-be-deployed artifacts.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Returns a new artifact with the given file.
    pub fn set_file(&self, file: impl Into<PathBuf>) -> Self {
        let mut artifact = self.clone();
        artifact.file = Some(file.into());
        artifact
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Returns a new artifact with the given property set.
    pub fn set_property(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut artifact = self.clone();
        artifact.properties.insert(key.into(), value.into());
        artifact
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.extension)?;
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        write!(f, ":{}", self.version)
    }
}

/// If `version` carries an expanded snapshot qualifier
/// (`<prefix>-yyyyMMdd.HHmmss-buildNumber`), returns the prefix including the
/// trailing dash.
fn timestamped_prefix(version: &str) -> Option<&str> {
    let (rest, build) = version.rsplit_once('-')?;
    if build.is_empty() || !build.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (prefix, stamp) = rest.rsplit_once('-')?;
    let bytes = stamp.as_bytes();
    if bytes.len() != 15 || bytes[8] != b'.' {
        return None;
    }
    if !bytes[..8].iter().chain(&bytes[9..]).all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(&version[..prefix.len() + 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutators_return_new_instances() {
        let original = Artifact::new("com.example", "lib", "jar", "1.0-SNAPSHOT");
        let versioned = original.set_version("1.0-20230102.030405-7");
        assert_eq!(original.version(), "1.0-SNAPSHOT");
        assert_eq!(versioned.version(), "1.0-20230102.030405-7");

        let with_file = original.set_file("/tmp/lib-1.0-SNAPSHOT.jar");
        assert!(original.file().is_none());
        assert!(with_file.file().is_some());
    }

    #[test]
    fn base_version_collapses_expanded_snapshots() {
        let expanded = Artifact::new("g", "a", "jar", "1.0-20230102.030405-7");
        assert_eq!(expanded.base_version(), "1.0-SNAPSHOT");
        assert!(expanded.is_snapshot());

        let plain = Artifact::new("g", "a", "jar", "1.0-SNAPSHOT");
        assert_eq!(plain.base_version(), "1.0-SNAPSHOT");
        assert!(plain.is_snapshot());

        let release = Artifact::new("g", "a", "jar", "1.0");
        assert_eq!(release.base_version(), "1.0");
        assert!(!release.is_snapshot());
    }

    #[test]
    fn non_snapshot_qualifiers_are_not_expanded() {
        let artifact = Artifact::new("g", "a", "jar", "1.0-beta-1");
        assert!(!artifact.is_snapshot());
        assert_eq!(artifact.base_version(), "1.0-beta-1");
    }

    #[test]
    fn parse_coords() {
        let artifact = Artifact::from_coords("com.example:lib:1.0").unwrap();
        assert_eq!(artifact.group_id(), "com.example");
        assert_eq!(artifact.artifact_id(), "lib");
        assert_eq!(artifact.extension(), "jar");
        assert_eq!(artifact.version(), "1.0");

        let artifact = Artifact::from_coords("com.example:lib:war:2.0").unwrap();
        assert_eq!(artifact.extension(), "war");

        let artifact = Artifact::from_coords("com.example:lib:jar:sources:2.0").unwrap();
        assert_eq!(artifact.classifier(), "sources");
        assert_eq!(artifact.to_string(), "com.example:lib:jar:sources:2.0");
    }

    #[test]
    fn parse_coords_rejects_malformed_input() {
        assert!(Artifact::from_coords("com.example").is_err());
        assert!(Artifact::from_coords("com.example:lib").is_err());
        assert!(Artifact::from_coords("a:b:c:d:e:f").is_err());
        assert!(Artifact::from_coords("com.example::1.0").is_err());
    }
}
