// Integration tests for hierarchical folder resolution
//
// These tests verify lookup-before-create idempotency and the partial-failure
// policy: aborted resolutions leave their folders behind for reuse.

mod common;

use common::{EventLog, MemDrive};
use std::sync::atomic::Ordering;
use std::time::Duration;
use study_buddy::storage::{FolderId, HierarchyStore};
use study_buddy::{Error, FolderPath, FolderResolver};

const TIMEOUT: Duration = Duration::from_secs(5);

fn lecture_path() -> FolderPath {
    FolderPath::lecture("Study Buddy", "2024_Spring", "Math 101", "Derivatives")
}

#[tokio::test]
async fn test_second_resolution_only_looks_up() {
    let drive = MemDrive::new(EventLog::default());
    let resolver = FolderResolver::new(&drive, TIMEOUT);
    let path = lecture_path();

    let first = resolver.resolve(&path, None).await.unwrap();
    assert_eq!(drive.creates(), 4, "One folder per segment on an empty store");
    assert_eq!(drive.finds(), 4);

    let second = resolver.resolve(&path, None).await.unwrap();
    assert_eq!(second, first, "Same terminal folder both times");
    assert_eq!(drive.creates(), 4, "No creates on the second resolution");
    assert_eq!(drive.finds(), 8);

    assert_eq!(
        drive.path_of(&first),
        vec!["Study Buddy", "2024_Spring", "Math 101", "Derivatives"]
    );
}

#[tokio::test]
async fn test_shared_prefix_reuses_existing_folders() {
    let drive = MemDrive::new(EventLog::default());
    let resolver = FolderResolver::new(&drive, TIMEOUT);

    let derivatives = resolver.resolve(&lecture_path(), None).await.unwrap();
    let integrals = resolver
        .resolve(
            &FolderPath::lecture("Study Buddy", "2024_Spring", "Math 101", "Integrals"),
            None,
        )
        .await
        .unwrap();

    assert_ne!(derivatives, integrals);
    assert_eq!(drive.creates(), 5, "Only the new topic folder is created");
}

#[tokio::test]
async fn test_create_failure_aborts_and_leaves_residue() {
    let drive = MemDrive::new(EventLog::default());
    *drive.fail_create.lock().unwrap() = Some("Math 101".to_string());
    let resolver = FolderResolver::new(&drive, TIMEOUT);

    let err = resolver.resolve(&lecture_path(), None).await.unwrap_err();
    match &err {
        Error::FolderResolutionFailure { segment, .. } => assert_eq!(segment, "Math 101"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_retryable());
    assert_eq!(drive.folders.lock().unwrap().len(), 2, "Root and semester stay");
    assert!(
        !drive.log.events().iter().any(|e| e == "drive.find Derivatives"),
        "Nothing after the failed segment is attempted"
    );

    // The retry reuses the residue and only creates what is missing
    *drive.fail_create.lock().unwrap() = None;
    let id = resolver.resolve(&lecture_path(), None).await.unwrap();
    assert_eq!(drive.folders.lock().unwrap().len(), 4);
    assert_eq!(drive.path_of(&id).len(), 4);
}

#[tokio::test]
async fn test_lookup_failure_propagates() {
    let drive = MemDrive::new(EventLog::default());
    drive.fail_find.store(true, Ordering::SeqCst);
    let resolver = FolderResolver::new(&drive, TIMEOUT);

    let err = resolver.resolve(&lecture_path(), None).await.unwrap_err();
    assert!(matches!(err, Error::FolderResolutionFailure { ref segment, .. } if segment == "Study Buddy"));
    assert_eq!(drive.creates(), 0);
}

#[tokio::test]
async fn test_resolution_below_root_parent() {
    let drive = MemDrive::new(EventLog::default());
    let shared = drive.create_folder("Shared", None).await.unwrap();
    let resolver = FolderResolver::new(&drive, TIMEOUT);

    let id = resolver
        .resolve(&FolderPath::new(["Study Buddy", "2024_Spring"]), Some(&shared))
        .await
        .unwrap();

    assert_eq!(drive.path_of(&id), vec!["Shared", "Study Buddy", "2024_Spring"]);
}

#[tokio::test]
async fn test_empty_path() {
    let drive = MemDrive::new(EventLog::default());
    let resolver = FolderResolver::new(&drive, TIMEOUT);
    let root = FolderId("root".to_string());

    let id = resolver
        .resolve(&FolderPath::new(Vec::<String>::new()), Some(&root))
        .await
        .unwrap();
    assert_eq!(id, root);

    let err = resolver
        .resolve(&FolderPath::new(Vec::<String>::new()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FolderResolutionFailure { .. }));
    assert_eq!(drive.log.events().len(), 0);
}

#[tokio::test]
async fn test_sequential_duplicate_names_under_different_parents() {
    // Exact-name matching is scoped to the parent
    let drive = MemDrive::new(EventLog::default());
    let resolver = FolderResolver::new(&drive, TIMEOUT);

    let a = resolver
        .resolve(&FolderPath::new(["A", "Notes"]), None)
        .await
        .unwrap();
    let b = resolver
        .resolve(&FolderPath::new(["B", "Notes"]), None)
        .await
        .unwrap();

    assert_ne!(a, b);
    assert_eq!(drive.creates(), 4);
}
