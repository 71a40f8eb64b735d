//! Integration tests for upload, download, metadata and delete

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use ::common::access::ErrorKind;
use ::common::domain::NewFile;
use ::common::memory::{MemoryContentStore, MemoryStore};
use ::common::ports::{FileStore, ShareStore};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::common::{body, read_all, yielding_body, FlakyFileStore, Harness, Script};

#[tokio::test]
async fn test_upload_assigns_id_and_keeps_fields() {
    let h = Harness::new();
    let alice = h.register("alice").await;

    let new = NewFile::new("a.txt", "text/plain", 10)
        .with_key_material(b"nonce".to_vec(), b"wrapped-for-alice".to_vec());
    let file = h
        .files
        .upload(&h.cancel, alice.id, new, body(b"0123456789"))
        .await
        .unwrap();

    let stored = h.files.get_metadata(&h.cancel, file.id, alice.id).await.unwrap();
    assert_eq!(stored, file);
    assert!(!stored.id.is_nil());
    assert_eq!(stored.owner_id, alice.id);
    assert_eq!(stored.filename, "a.txt");
    assert_eq!(stored.mime_type, "text/plain");
    assert_eq!(stored.size, 10);
    assert_eq!(stored.iv, b"nonce");
    assert_eq!(stored.encrypted_key, b"wrapped-for-alice");
    assert!(stored.created_at.unix_timestamp() > 0);

    assert!(h.content.contains(&file.id.to_string()));
    assert_eq!(h.content.content_type(&file.id.to_string()).as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn test_upload_ids_are_fresh() {
    let h = Harness::new();
    let alice = h.register("alice").await;

    let first = h.upload(&alice, "a.txt", b"aaa").await;
    let second = h.upload(&alice, "a.txt", b"aaa").await;
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_upload_rejects_existing_id() {
    let h = Harness::new();
    let alice = h.register("alice").await;
    let mallory = h.register("mallory").await;
    let file = h.upload(&alice, "a.txt", b"secret").await;

    let new = NewFile {
        id: Some(file.id),
        ..NewFile::new("evil.txt", "text/plain", 4)
    };
    let err = h
        .files
        .upload(&h.cancel, mallory.id, new, body(b"evil"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let download = h.files.download(&h.cancel, file.id, alice.id).await.unwrap();
    assert_eq!(read_all(download.content).await, b"secret");
}

#[tokio::test]
async fn test_concurrent_uploads_with_same_id_keep_winner_content() {
    let h = Harness::new();
    let alice = h.register("alice").await;
    let bob = h.register("bob").await;
    let id = Uuid::new_v4();

    let from_alice = NewFile {
        id: Some(id),
        ..NewFile::new("a.txt", "text/plain", 3)
    };
    let from_bob = NewFile {
        id: Some(id),
        ..NewFile::new("b.txt", "text/plain", 3)
    };

    // Both pass the metadata lookup before either content write lands
    let (alice_result, bob_result) = tokio::join!(
        h.files.upload(&h.cancel, alice.id, from_alice, yielding_body(b"AAA")),
        h.files.upload(&h.cancel, bob.id, from_bob, yielding_body(b"BBB")),
    );

    let (winner, expected, loser_err) = match (alice_result, bob_result) {
        (Ok(file), Err(err)) => (file, b"AAA", err),
        (Err(err), Ok(file)) => (file, b"BBB", err),
        (a, b) => panic!("expected exactly one upload to win: {:?} / {:?}", a, b),
    };
    assert_eq!(loser_err.kind(), ErrorKind::Conflict);

    let download = h.files.download(&h.cancel, id, winner.owner_id).await.unwrap();
    assert_eq!(download.file, winner);
    assert_eq!(read_all(download.content).await, expected);
    assert_eq!(h.content.len(), 1);
}

#[tokio::test]
async fn test_upload_requires_filename() {
    let h = Harness::new();
    let alice = h.register("alice").await;

    let err = h
        .files
        .upload(&h.cancel, alice.id, NewFile::new("  ", "text/plain", 1), body(b"x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(h.content.is_empty());
}

#[tokio::test]
async fn test_owner_download_needs_no_share() {
    let h = Harness::new();
    let alice = h.register("alice").await;
    let file = h.upload(&alice, "a.txt", b"ciphertext").await;

    let download = h.files.download(&h.cancel, file.id, alice.id).await.unwrap();
    assert!(download.key_material.is_none());
    assert_eq!(download.file, file);
    assert_eq!(read_all(download.content).await, b"ciphertext");
}

#[tokio::test]
async fn test_download_missing_file() {
    let h = Harness::new();
    let alice = h.register("alice").await;

    let err = h
        .files
        .download(&h.cancel, Uuid::new_v4(), alice.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unauthorized_download_never_touches_content() {
    let h = Harness::scripted(|store| store.get = Script::Fail);
    let alice = h.register("alice").await;
    let bob = h.register("bob").await;
    let file = h.upload(&alice, "a.txt", b"ciphertext").await;

    // A content read would fail with storage_unavailable
    let err = h.files.download(&h.cancel, file.id, bob.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_storage_failure_is_not_reported_as_unauthorized() {
    let h = Harness::scripted(|store| store.get = Script::Fail);
    let alice = h.register("alice").await;
    let file = h.upload(&alice, "a.txt", b"ciphertext").await;

    let err = h.files.download(&h.cancel, file.id, alice.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
}

#[tokio::test]
async fn test_download_with_missing_content() {
    let h = Harness::new();
    let alice = h.register("alice").await;
    let file = h.upload(&alice, "a.txt", b"ciphertext").await;

    ::common::ports::ContentStore::delete(&h.content, &file.id.to_string())
        .await
        .unwrap();

    let err = h.files.download(&h.cancel, file.id, alice.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_get_metadata_requires_owner() {
    let h = Harness::new();
    let alice = h.register("alice").await;
    let bob = h.register("bob").await;
    let file = h.upload(&alice, "a.txt", b"abc").await;

    let err = h.files.get_metadata(&h.cancel, file.id, bob.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = h
        .files
        .get_metadata(&h.cancel, Uuid::new_v4(), alice.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_list_owned_newest_first() {
    let h = Harness::new();
    let alice = h.register("alice").await;
    let bob = h.register("bob").await;
    let base = OffsetDateTime::now_utc();

    for (name, offset) in [("first.txt", 0), ("third.txt", 2), ("second.txt", 1)] {
        let new = NewFile {
            created_at: Some(base + time::Duration::seconds(offset)),
            ..NewFile::new(name, "text/plain", 1)
        };
        h.files.upload(&h.cancel, alice.id, new, body(b"x")).await.unwrap();
    }
    h.upload(&bob, "bob.txt", b"y").await;

    let names: Vec<String> = h
        .files
        .list_owned(&h.cancel, alice.id)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.filename)
        .collect();
    assert_eq!(names, vec!["third.txt", "second.txt", "first.txt"]);

    assert!(h.files.list_owned(&h.cancel, Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_by_non_owner_changes_nothing() {
    let h = Harness::new();
    let alice = h.register("alice").await;
    let bob = h.register("bob").await;
    let file = h.upload(&alice, "a.txt", b"ciphertext").await;

    let err = h.files.delete(&h.cancel, file.id, bob.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let download = h.files.download(&h.cancel, file.id, alice.id).await.unwrap();
    assert_eq!(read_all(download.content).await, b"ciphertext");
}

#[tokio::test]
async fn test_delete_removes_content_metadata_and_shares() {
    let h = Harness::new();
    let alice = h.register("alice").await;
    let bob = h.register("bob").await;
    let file = h.upload(&alice, "a.txt", b"ciphertext").await;
    let share = h
        .shares
        .grant(&h.cancel, file.id, alice.id, bob.id, b"wrapped-for-bob".to_vec())
        .await
        .unwrap();

    h.files.delete(&h.cancel, file.id, alice.id).await.unwrap();

    assert!(!h.content.contains(&file.id.to_string()));
    assert!(FileStore::find_by_id(&h.store, file.id).await.unwrap().is_none());
    assert!(ShareStore::find_by_id(&h.store, share.id).await.unwrap().is_none());

    let err = h.files.download(&h.cancel, file.id, bob.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = h.files.delete(&h.cancel, file.id, alice.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_failed_content_delete_keeps_metadata() {
    let h = Harness::scripted(|store| store.delete = Script::Fail);
    let alice = h.register("alice").await;
    let file = h.upload(&alice, "a.txt", b"ciphertext").await;

    let err = h.files.delete(&h.cancel, file.id, alice.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);

    assert!(FileStore::find_by_id(&h.store, file.id).await.unwrap().is_some());
    assert!(h.content.contains(&file.id.to_string()));
}

#[tokio::test]
async fn test_metadata_failure_after_content_write_is_orphaned() {
    let store = MemoryStore::new();
    let content = MemoryContentStore::new();
    let flaky = Arc::new(FlakyFileStore::new(store.clone()));
    flaky.fail_save.store(true, Ordering::SeqCst);
    let h = Harness::build(store, flaky.clone(), Arc::new(content.clone()), content);
    let alice = h.register("alice").await;

    let err = h
        .files
        .upload(&h.cancel, alice.id, NewFile::new("a.txt", "text/plain", 3), body(b"abc"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Orphaned);
    assert!(err.kind().is_persistence());
    let ::common::access::AccessError::Orphaned { file_id, .. } = err else {
        panic!("expected orphaned error");
    };
    assert!(h.content.contains(&file_id.to_string()));
    assert!(h.files.list_owned(&h.cancel, alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_metadata_delete_failure_is_persistence_unavailable() {
    let store = MemoryStore::new();
    let content = MemoryContentStore::new();
    let flaky = Arc::new(FlakyFileStore::new(store.clone()));
    let h = Harness::build(store, flaky.clone(), Arc::new(content.clone()), content);
    let alice = h.register("alice").await;
    let file = h.upload(&alice, "a.txt", b"abc").await;

    flaky.fail_delete.store(true, Ordering::SeqCst);
    let err = h.files.delete(&h.cancel, file.id, alice.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PersistenceUnavailable);
}

#[tokio::test]
async fn test_content_write_failure_skips_metadata() {
    let h = Harness::scripted(|store| store.put = Script::Fail);
    let alice = h.register("alice").await;

    let err = h
        .files
        .upload(&h.cancel, alice.id, NewFile::new("a.txt", "text/plain", 3), body(b"abc"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    assert!(h.files.list_owned(&h.cancel, alice.id).await.unwrap().is_empty());
}
