//! `FileSessionStorage` on a real filesystem

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use busline::auth::{AuthAction, AuthReducer, AuthState};
use busline::mocks::{fixtures, MockBackend};
use busline::session::{FileSessionStorage, SessionError, SessionStorage, StoredSession};
use busline::ClientEnvironment;
use busline_runtime::Store;
use busline_testing::test_clock;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn storage(dir: &tempfile::TempDir) -> FileSessionStorage {
    FileSessionStorage::new(dir.path().join("nested").join("session.json"))
}

#[test]
fn missing_file_is_no_session() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);

    assert!(matches!(storage.load(), Ok(None)));
    assert_ok!(storage.clear());
}

#[test]
fn session_needs_token_and_user() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);

    assert_ok!(storage.save_token("token-1"));
    assert!(storage.path().exists());
    assert!(matches!(storage.load(), Ok(None)));

    assert_ok!(storage.save_user(&fixtures::passenger()));
    let session = storage.load().unwrap().expect("both keys present");
    assert_eq!(session.token, "token-1");
    assert_eq!(session.user, fixtures::passenger());

    assert_ok!(storage.clear());
    assert!(!storage.path().exists());
    assert!(matches!(storage.load(), Ok(None)));
}

#[test]
fn reopened_storage_sees_saved_session() {
    let dir = tempfile::tempdir().unwrap();
    let session = StoredSession {
        token: "token-1".to_string(),
        user: fixtures::passenger(),
    };
    assert_ok!(storage(&dir).save(&session));

    let restored = storage(&dir).load().unwrap();
    assert_eq!(restored, Some(session));
}

#[test]
fn corrupt_file_is_reported_then_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);
    std::fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
    std::fs::write(storage.path(), b"{ not json").unwrap();

    let error = assert_err!(storage.load());
    assert!(matches!(error, SessionError::Corrupt(_)));

    assert_ok!(storage.save_token("token-2"));
    assert_ok!(storage.save_user(&fixtures::passenger()));
    assert_eq!(storage.load().unwrap().map(|s| s.token).as_deref(), Some("token-2"));
}

#[tokio::test]
async fn restore_reads_file_written_by_earlier_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    assert_ok!(FileSessionStorage::new(&path).save(&StoredSession {
        token: "token-1".to_string(),
        user: fixtures::passenger(),
    }));

    let env = ClientEnvironment::new(
        MockBackend::new(),
        Arc::new(FileSessionStorage::new(&path)),
        Arc::new(test_clock()),
    );
    let store = Store::new(AuthState::default(), AuthReducer::new(), env);

    let mut handle = store.send(AuthAction::RestoreSession).await.unwrap();
    handle.wait().await;

    let (logged_in, user) = store.state(|s| (s.is_logged_in(), s.user.clone())).await;
    assert!(logged_in);
    assert_eq!(user.map(|u| u.passenger_guid).as_deref(), Some("passenger-1"));
    assert_eq!(store.environment().credentials.token().as_deref(), Some("token-1"));
}
