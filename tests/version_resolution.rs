//! Version resolution scenarios against stubbed metadata sources.

mod common;

use std::sync::Arc;

use artifact_resolver::models::artifact::Artifact;
use artifact_resolver::models::repository::{RemoteRepository, RepositorySource};
use artifact_resolver::resolver::{VersionRequest, VersionResolver};
use artifact_resolver::Error;

use common::*;

fn central() -> RemoteRepository {
    RemoteRepository::new("central", "https://repo1.example.org/maven2")
}

fn group_metadata(release: &str, latest: &str, last_updated: &str) -> String {
    format!(
        r#"<metadata>
  <groupId>com.example</groupId>
  <artifactId>lib</artifactId>
  <versioning>
    <latest>{latest}</latest>
    <release>{release}</release>
    <versions>
      <version>{release}</version>
      <version>{latest}</version>
    </versions>
    <lastUpdated>{last_updated}</lastUpdated>
  </versioning>
</metadata>
"#
    )
}

fn snapshot_metadata(timestamp: &str, build_number: u32, last_updated: &str) -> String {
    format!(
        r#"<metadata>
  <groupId>com.example</groupId>
  <artifactId>lib</artifactId>
  <versioning>
    <snapshot>
      <timestamp>{timestamp}</timestamp>
      <buildNumber>{build_number}</buildNumber>
    </snapshot>
    <lastUpdated>{last_updated}</lastUpdated>
  </versioning>
</metadata>
"#
    )
}

#[tokio::test]
async fn concrete_version_skips_metadata_and_cache() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let session = session_builder(local.path()).build().unwrap();

    let metadata_resolver = Arc::new(StaticMetadataResolver::new());
    let resolver = VersionResolver::new(metadata_resolver.clone());

    let request = VersionRequest::new(Artifact::new("com.example", "lib", "jar", "1.0"), vec![central()]);
    let result = resolver.resolve_version(&session, &request).await.unwrap();

    assert_eq!(result.version, "1.0");
    assert!(result.repository.is_none());
    assert!(result.errors.is_empty());
    assert_eq!(metadata_resolver.batch_count(), 0);
    assert_eq!(cache_len(&session), 0);
}

#[tokio::test]
async fn release_resolves_from_remote_metadata() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let session = session_builder(local.path()).build().unwrap();

    let metadata_resolver = Arc::new(
        StaticMetadataResolver::new().with_doc(
            "central",
            "",
            &group_metadata("1.0", "1.0", "20230101000000"),
        ),
    );
    let resolver = VersionResolver::new(metadata_resolver);

    let request = VersionRequest::new(
        Artifact::new("com.example", "lib", "jar", "RELEASE"),
        vec![central()],
    );
    let result = resolver.resolve_version(&session, &request).await.unwrap();

    assert_eq!(result.version, "1.0");
    match result.repository {
        Some(RepositorySource::Remote(repo)) => assert_eq!(repo.id, "central"),
        other => panic!("expected remote repository, got {:?}", other),
    }
}

#[tokio::test]
async fn cached_result_short_circuits_metadata_work() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let session = session_builder(local.path()).build().unwrap();

    let metadata_resolver = Arc::new(
        StaticMetadataResolver::new().with_doc(
            "central",
            "",
            &group_metadata("1.0", "1.0", "20230101000000"),
        ),
    );
    let resolver = VersionResolver::new(metadata_resolver.clone());

    let request = VersionRequest::new(
        Artifact::new("com.example", "lib", "jar", "RELEASE"),
        vec![central()],
    );
    let first = resolver.resolve_version(&session, &request).await.unwrap();
    let second = resolver.resolve_version(&session, &request).await.unwrap();

    assert_eq!(first.version, second.version);
    assert_eq!(metadata_resolver.batch_count(), 1);
    match second.repository {
        Some(RepositorySource::Remote(repo)) => assert_eq!(repo.id, "central"),
        other => panic!("expected remote repository, got {:?}", other),
    }
}

#[tokio::test]
async fn later_timestamp_wins_across_repositories() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let session = session_builder(local.path()).build().unwrap();

    let older = RemoteRepository::new("older", "https://older.example.org");
    let newer = RemoteRepository::new("newer", "https://newer.example.org");

    let metadata_resolver = Arc::new(
        StaticMetadataResolver::new()
            .with_doc("older", "", &group_metadata("1.0", "1.0", "20230101000000"))
            .with_doc("newer", "", &group_metadata("2.0", "2.0", "20230102000000")),
    );
    let resolver = VersionResolver::new(metadata_resolver);

    let request = VersionRequest::new(
        Artifact::new("com.example", "lib", "jar", "RELEASE"),
        vec![older, newer],
    );
    let result = resolver.resolve_version(&session, &request).await.unwrap();

    assert_eq!(result.version, "2.0");
    assert_eq!(result.repository.unwrap().id(), "newer");
}

#[tokio::test]
async fn latest_snapshot_is_recursively_expanded() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let session = session_builder(local.path()).build().unwrap();

    let metadata_resolver = Arc::new(
        StaticMetadataResolver::new()
            .with_doc("central", "", &group_metadata("1.0", "2.0-SNAPSHOT", "20230102000000"))
            .with_doc(
                "central",
                "2.0-SNAPSHOT",
                &snapshot_metadata("20230102.030405", 7, "20230102030405"),
            ),
    );
    let resolver = VersionResolver::new(metadata_resolver);

    let request = VersionRequest::new(
        Artifact::new("com.example", "lib", "jar", "LATEST"),
        vec![central()],
    );
    let result = resolver.resolve_version(&session, &request).await.unwrap();

    assert_eq!(result.version, "2.0-20230102.030405-7");
    assert_eq!(result.repository.unwrap().id(), "central");
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn latest_falls_back_to_release() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let session = session_builder(local.path()).build().unwrap();

    let doc = r#"<metadata>
  <groupId>com.example</groupId>
  <artifactId>lib</artifactId>
  <versioning>
    <release>1.0</release>
    <lastUpdated>20230101000000</lastUpdated>
  </versioning>
</metadata>
"#;
    let metadata_resolver = Arc::new(StaticMetadataResolver::new().with_doc("central", "", doc));
    let resolver = VersionResolver::new(metadata_resolver);

    let request = VersionRequest::new(
        Artifact::new("com.example", "lib", "jar", "LATEST"),
        vec![central()],
    );
    let result = resolver.resolve_version(&session, &request).await.unwrap();
    assert_eq!(result.version, "1.0");
}

#[tokio::test]
async fn snapshot_block_expands_requested_version() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let session = session_builder(local.path()).build().unwrap();

    let metadata_resolver = Arc::new(StaticMetadataResolver::new().with_doc(
        "central",
        "1.0-SNAPSHOT",
        &snapshot_metadata("20230102.030405", 7, "20230102030405"),
    ));
    let resolver = VersionResolver::new(metadata_resolver);

    let request = VersionRequest::new(
        Artifact::new("com.example", "lib", "jar", "1.0-SNAPSHOT"),
        vec![central()],
    );
    let result = resolver.resolve_version(&session, &request).await.unwrap();

    assert_eq!(result.version, "1.0-20230102.030405-7");
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn snapshot_prefers_classifier_scoped_entry() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let session = session_builder(local.path()).build().unwrap();

    let doc = r#"<metadata>
  <groupId>com.example</groupId>
  <artifactId>lib</artifactId>
  <version>1.0-SNAPSHOT</version>
  <versioning>
    <lastUpdated>20230102000000</lastUpdated>
    <snapshotVersions>
      <snapshotVersion>
        <extension>jar</extension>
        <version>1.0-20230101.000000-1</version>
        <updated>20230101000000</updated>
      </snapshotVersion>
      <snapshotVersion>
        <classifier>tests</classifier>
        <extension>jar</extension>
        <version>1.0-20230102.000000-2</version>
        <updated>20230102000000</updated>
      </snapshotVersion>
    </snapshotVersions>
  </versioning>
</metadata>
"#;
    let metadata_resolver =
        Arc::new(StaticMetadataResolver::new().with_doc("central", "1.0-SNAPSHOT", doc));
    let resolver = VersionResolver::new(metadata_resolver);

    let tests_artifact =
        Artifact::with_classifier("com.example", "lib", "tests", "jar", "1.0-SNAPSHOT");
    let request = VersionRequest::new(tests_artifact, vec![central()]);
    let result = resolver.resolve_version(&session, &request).await.unwrap();
    assert_eq!(result.version, "1.0-20230102.000000-2");

    let main_artifact = Artifact::new("com.example", "lib", "jar", "1.0-SNAPSHOT");
    let request = VersionRequest::new(main_artifact, vec![central()]);
    let result = resolver.resolve_version(&session, &request).await.unwrap();
    assert_eq!(result.version, "1.0-20230101.000000-1");
}

#[tokio::test]
async fn snapshot_without_metadata_resolves_unchanged_and_uncached() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let session = session_builder(local.path()).build().unwrap();

    let metadata_resolver = Arc::new(StaticMetadataResolver::new());
    let resolver = VersionResolver::new(metadata_resolver.clone());

    let request = VersionRequest::new(
        Artifact::new("g", "a", "jar", "1.0-SNAPSHOT"),
        vec![central()],
    );
    let result = resolver.resolve_version(&session, &request).await.unwrap();

    assert_eq!(result.version, "1.0-SNAPSHOT");
    assert!(result.errors.is_empty());
    assert_eq!(metadata_resolver.batch_count(), 1);
    assert_eq!(cache_len(&session), 0);
}

#[tokio::test]
async fn workspace_snapshot_short_circuits_resolution() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let session = session_builder(local.path())
        .workspace(Arc::new(StaticWorkspace::new(&["1.0-SNAPSHOT"])))
        .build()
        .unwrap();

    let metadata_resolver = Arc::new(StaticMetadataResolver::new());
    let resolver = VersionResolver::new(metadata_resolver.clone());

    let request = VersionRequest::new(
        Artifact::new("com.example", "lib", "jar", "1.0-SNAPSHOT"),
        vec![central()],
    );
    let result = resolver.resolve_version(&session, &request).await.unwrap();

    assert_eq!(result.version, "1.0-SNAPSHOT");
    assert!(matches!(
        result.repository,
        Some(RepositorySource::Workspace(_))
    ));
    assert_eq!(metadata_resolver.batch_count(), 0);
    assert_eq!(cache_len(&session), 0);
}

#[tokio::test]
async fn local_metadata_is_read_without_remote_repositories() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let metadata_dir = local.path().join("com/example/lib");
    std::fs::create_dir_all(&metadata_dir).unwrap();
    std::fs::write(
        metadata_dir.join("maven-metadata-local.xml"),
        group_metadata("0.9", "0.9", "20230101000000"),
    )
    .unwrap();

    let session = session_builder(local.path()).build().unwrap();
    let resolver = VersionResolver::new(Arc::new(StaticMetadataResolver::new()));

    let request = VersionRequest::new(
        Artifact::new("com.example", "lib", "jar", "RELEASE"),
        Vec::new(),
    );
    let result = resolver.resolve_version(&session, &request).await.unwrap();

    assert_eq!(result.version, "0.9");
    assert!(matches!(result.repository, Some(RepositorySource::Local(_))));
}

#[tokio::test]
async fn malformed_metadata_is_tolerated_and_reported() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let listener = Arc::new(RecordingListener::default());
    let session = session_builder(local.path())
        .listener(listener.clone())
        .build()
        .unwrap();

    let broken = RemoteRepository::new("broken", "https://broken.example.org");
    let metadata_resolver = Arc::new(
        StaticMetadataResolver::new()
            .with_doc("broken", "", "<metadata><versioning>")
            .with_doc("central", "", &group_metadata("1.0", "1.0", "20230101000000")),
    );
    let resolver = VersionResolver::new(metadata_resolver);

    let request = VersionRequest::new(
        Artifact::new("com.example", "lib", "jar", "RELEASE"),
        vec![broken, central()],
    );
    let result = resolver.resolve_version(&session, &request).await.unwrap();

    assert_eq!(result.version, "1.0");
    assert_eq!(result.errors.len(), 1);
    assert!(listener.names().contains(&"metadata_invalid".to_string()));
}

#[tokio::test]
async fn unresolvable_symbolic_version_fails_with_resolution_error() {
    init_tracing();
    let local = tempfile::tempdir().unwrap();
    let session = session_builder(local.path()).build().unwrap();

    let resolver = VersionResolver::new(Arc::new(StaticMetadataResolver::new()));
    let request = VersionRequest::new(
        Artifact::new("com.example", "lib", "jar", "RELEASE"),
        vec![central()],
    );
    let err = resolver.resolve_version(&session, &request).await.unwrap_err();
    assert!(matches!(err, Error::VersionResolution { .. }));
}
