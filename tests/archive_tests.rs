//! Integration tests for the upload archiver.

mod common;

use common::{payload, read_zip_entries, setup};
use dropbin::error::AppError;
use dropbin::services::archive::{ArchiveService, NamingContext};
use dropbin::storage::StorageProvider;

#[tokio::test]
async fn archive_bundles_all_valid_files() {
    let env = setup().await;
    let naming = NamingContext::new("Report", Some("secret"));

    let payloads = vec![payload("a.txt", b"alpha"), payload("b.txt", b"bravo")];
    let path = ArchiveService::archive(env.storage.as_ref(), &payloads, &naming)
        .await
        .expect("Archive failed");

    assert_eq!(
        path,
        format!("uploads/secret_Report_{}.zip", naming.stamp)
    );

    let data = env.storage.get(&path).await.expect("Archive blob missing");
    let entries = read_zip_entries(&data);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, format!("1_Report_{}.txt", naming.stamp));
    assert_eq!(entries[0].1, b"alpha");
    assert_eq!(entries[1].0, format!("2_Report_{}.txt", naming.stamp));
    assert_eq!(entries[1].1, b"bravo");
}

#[tokio::test]
async fn archive_skips_empty_payloads_without_counting_them() {
    let env = setup().await;
    let naming = NamingContext::new("Report", None);

    let payloads = vec![payload("skip.txt", b""), payload("keep.txt", b"kept")];
    let path = ArchiveService::archive(env.storage.as_ref(), &payloads, &naming)
        .await
        .expect("Archive failed");

    let data = env.storage.get(&path).await.expect("Archive blob missing");
    let entries = read_zip_entries(&data);
    assert_eq!(entries.len(), 1);
    // The skipped payload does not consume a sequence index
    assert_eq!(entries[0].0, format!("1_Report_{}.txt", naming.stamp));
}

#[tokio::test]
async fn archive_with_no_valid_files_fails() {
    let env = setup().await;
    let naming = NamingContext::new("Report", None);

    let payloads = vec![payload("a.txt", b""), payload("b.txt", b"")];
    let err = ArchiveService::archive(env.storage.as_ref(), &payloads, &naming)
        .await
        .expect_err("Archive should fail with no valid files");
    assert!(matches!(err, AppError::NoValidFiles));

    let empty: Vec<dropbin::services::archive::UploadPayload> = Vec::new();
    let err = ArchiveService::archive(env.storage.as_ref(), &empty, &naming)
        .await
        .expect_err("Archive should fail with no payloads");
    assert!(matches!(err, AppError::NoValidFiles));
}

#[tokio::test]
async fn archive_removes_individual_files_after_bundling() {
    let env = setup().await;
    let naming = NamingContext::new("Report", Some("secret"));

    let payloads = vec![payload("a.txt", b"alpha")];
    let archive_path = ArchiveService::archive(env.storage.as_ref(), &payloads, &naming)
        .await
        .expect("Archive failed");

    let interim = format!("uploads/1_Report_{}.txt", naming.stamp);
    assert!(
        !env.storage.exists(&interim).await.expect("exists check"),
        "Interim per-file blob should be removed after archiving"
    );
    assert!(env.storage.exists(&archive_path).await.expect("exists check"));
}

#[tokio::test]
async fn archive_names_are_unique_per_operation() {
    let env = setup().await;

    // Identical title and password must still yield distinct archives
    let first = ArchiveService::archive(
        env.storage.as_ref(),
        &[payload("a.txt", b"one")],
        &NamingContext::new("Report", Some("secret")),
    )
    .await
    .expect("First archive failed");

    let second = ArchiveService::archive(
        env.storage.as_ref(),
        &[payload("a.txt", b"two")],
        &NamingContext::new("Report", Some("secret")),
    )
    .await
    .expect("Second archive failed");

    assert_ne!(first, second);
    assert!(env.storage.exists(&first).await.expect("exists check"));
    assert!(env.storage.exists(&second).await.expect("exists check"));
}

#[tokio::test]
async fn store_loose_keeps_files_unarchived() {
    let env = setup().await;

    let path = ArchiveService::store_loose(env.storage.as_ref(), &payload("note.txt", b"loose"))
        .await
        .expect("Loose store failed");

    assert!(path.starts_with("uploads/"));
    assert!(path.ends_with(".txt"));
    let data = env.storage.get(&path).await.expect("Blob missing");
    assert_eq!(&data[..], b"loose");
}
