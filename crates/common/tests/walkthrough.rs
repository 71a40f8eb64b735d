//! End-to-end sharing flow over the in-memory stores

mod common;

use ::common::access::ErrorKind;
use ::common::domain::NewFile;

use crate::common::{body, read_all, Harness};

#[tokio::test]
async fn test_share_and_revoke_walkthrough() {
    let h = Harness::new();
    let cancel = &h.cancel;

    let alice = h
        .identity
        .register(cancel, "alice", "pw1", b"alice-pub".to_vec(), b"alice-epk".to_vec())
        .await
        .unwrap();

    let err = h
        .identity
        .register(cancel, "alice", "pw2", b"other-pub".to_vec(), b"other-epk".to_vec())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let bob = h
        .identity
        .register(cancel, "bob", "hunter2", b"bob-pub".to_vec(), b"bob-epk".to_vec())
        .await
        .unwrap();

    let file = h
        .files
        .upload(
            cancel,
            alice.id,
            NewFile::new("a.txt", "text/plain", 10),
            body(b"0123456789"),
        )
        .await
        .unwrap();

    let err = h.files.download(cancel, file.id, bob.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let share = h
        .shares
        .grant(cancel, file.id, alice.id, bob.id, b"wrapped-abc".to_vec())
        .await
        .unwrap();

    let download = h.files.download(cancel, file.id, bob.id).await.unwrap();
    assert_eq!(download.file.filename, "a.txt");
    assert_eq!(download.key_material.as_deref(), Some(&b"wrapped-abc"[..]));
    assert_eq!(read_all(download.content).await, b"0123456789");

    h.shares.revoke(cancel, share.id, alice.id).await.unwrap();

    let err = h.files.download(cancel, file.id, bob.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}
