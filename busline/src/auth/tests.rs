//! Unit tests for `AuthReducer`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use super::*;
use crate::environment::ClientEnvironment;
use crate::error::{ApiError, ValidationError};
use crate::mocks::{fixtures, Endpoint, MockBackend};
use crate::session::{MemorySessionStorage, SessionStorage, StoredSession};
use crate::types::{LoginRequest, RegisterRequest};
use busline_core::{effect::Effect, reducer::Reducer};
use busline_testing::{assertions, test_clock, ReducerTest};
use std::sync::Arc;

fn test_env(backend: MockBackend, storage: &MemorySessionStorage) -> ClientEnvironment<MockBackend> {
    ClientEnvironment::new(backend, Arc::new(storage.clone()), Arc::new(test_clock()))
}

fn backend() -> MockBackend {
    MockBackend::new().with_account("secret", fixtures::passenger())
}

fn login(mobile: &str, password: &str) -> AuthAction {
    AuthAction::Login(LoginRequest {
        country_code: String::new(),
        mobile_number: mobile.to_string(),
        password: password.to_string(),
    })
}

/// Run the single `Future` effect a reducer returned and hand back its action
async fn run(effects: impl IntoIterator<Item = Effect<AuthAction>>) -> Option<AuthAction> {
    let mut futures = effects.into_iter().filter_map(|effect| match effect {
        Effect::Future(future) => Some(future),
        _ => None,
    });
    let future = futures.next().expect("expected a Future effect");
    future.await
}

// ============================================================================
// Login
// ============================================================================

#[test]
fn login_without_password_is_rejected_locally() {
    let storage = MemorySessionStorage::new();
    ReducerTest::new(AuthReducer::new())
        .with_env(test_env(backend(), &storage))
        .given_state(AuthState::default())
        .when_action(login("911000000", "  "))
        .then_state(|state| {
            assert!(!state.loading);
            assert_eq!(
                state.error,
                Some(ApiError::Validation(ValidationError::MissingField("Password")))
            );
        })
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}

#[tokio::test]
async fn login_stores_token_then_loads_profile() {
    let storage = MemorySessionStorage::new();
    let backend = backend();
    let env = test_env(backend.clone(), &storage);
    let reducer = AuthReducer::new();
    let mut state = AuthState::default();

    let effects = reducer.reduce(&mut state, login("911000000", "secret"), &env);
    assert!(state.loading);

    let next = run(effects).await.unwrap();
    assert!(matches!(next, AuthAction::LoginSucceeded));
    assert_eq!(env.credentials.token().as_deref(), Some("mock-token"));
    assert_eq!(storage.token().as_deref(), Some("mock-token"));

    let effects = reducer.reduce(&mut state, next, &env);
    let next = run(effects).await.unwrap();
    assert!(matches!(next, AuthAction::ProfileLoaded(_)));
    assert_eq!(storage.user(), Some(fixtures::passenger()));

    let _ = reducer.reduce(&mut state, next, &env);
    assert!(state.is_logged_in());
    assert!(!state.loading);
    assert_eq!(backend.calls(Endpoint::Profile), 1);
}

#[tokio::test]
async fn login_failure_surfaces_backend_message() {
    let storage = MemorySessionStorage::new();
    let env = test_env(backend(), &storage);
    let reducer = AuthReducer::new();
    let mut state = AuthState::default();

    let effects = reducer.reduce(&mut state, login("911000000", "wrong"), &env);
    let next = run(effects).await.unwrap();
    let _ = reducer.reduce(&mut state, next, &env);

    assert!(!state.loading);
    assert!(!state.authenticated);
    assert_eq!(
        state.error.map(|e| e.to_string()).as_deref(),
        Some("Invalid mobile number or password")
    );
    assert_eq!(env.credentials.token(), None);
}

// ============================================================================
// Profile and session
// ============================================================================

#[tokio::test]
async fn rejected_token_is_dropped_on_profile_load() {
    let storage = MemorySessionStorage::with_session(StoredSession {
        token: "stale".to_string(),
        user: fixtures::passenger(),
    });
    let env = test_env(backend(), &storage);
    env.credentials.set("stale");
    let reducer = AuthReducer::new();
    let mut state = AuthState {
        authenticated: true,
        user: Some(fixtures::passenger()),
        ..AuthState::default()
    };

    let effects = reducer.reduce(&mut state, AuthAction::LoadProfile, &env);
    let next = run(effects).await.unwrap();
    let _ = reducer.reduce(&mut state, next, &env);

    assert_eq!(state.error, Some(ApiError::Unauthenticated));
    assert!(!state.is_logged_in());
    assert_eq!(env.credentials.token(), None);
    assert!(storage.load().unwrap().is_none());
}

#[test]
fn profile_without_token_prompts_login() {
    let storage = MemorySessionStorage::new();
    ReducerTest::new(AuthReducer::new())
        .with_env(test_env(backend(), &storage))
        .given_state(AuthState::default())
        .when_action(AuthAction::LoadProfile)
        .then_state(|state| assert_eq!(state.error, Some(ApiError::Unauthenticated)))
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}

#[tokio::test]
async fn restore_needs_token_and_user() {
    let storage = MemorySessionStorage::new();
    storage.save_token("mock-token").unwrap();
    let env = test_env(backend(), &storage);
    let reducer = AuthReducer::new();
    let mut state = AuthState::default();

    let effects = reducer.reduce(&mut state, AuthAction::RestoreSession, &env);
    let next = run(effects).await.unwrap();
    let _ = reducer.reduce(&mut state, next, &env);

    assert!(state.restored);
    assert!(!state.authenticated);
    assert_eq!(env.credentials.token(), None);

    storage.save_user(&fixtures::passenger()).unwrap();
    let effects = reducer.reduce(&mut state, AuthAction::RestoreSession, &env);
    let next = run(effects).await.unwrap();
    let _ = reducer.reduce(&mut state, next, &env);

    assert!(state.is_logged_in());
    assert_eq!(env.credentials.token().as_deref(), Some("mock-token"));
}

#[tokio::test]
async fn logout_clears_token_and_profile() {
    let storage = MemorySessionStorage::with_session(StoredSession {
        token: "mock-token".to_string(),
        user: fixtures::passenger(),
    });
    let env = test_env(backend(), &storage);
    env.credentials.set("mock-token");
    let reducer = AuthReducer::new();
    let mut state = AuthState {
        authenticated: true,
        user: Some(fixtures::passenger()),
        ..AuthState::default()
    };

    let effects = reducer.reduce(&mut state, AuthAction::Logout, &env);
    assert!(!state.is_logged_in());
    assert!(run(effects).await.is_none());

    assert_eq!(env.credentials.token(), None);
    assert_eq!(storage.token(), None);
    assert_eq!(storage.user(), None);
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn registration_creates_account() {
    let storage = MemorySessionStorage::new();
    let env = test_env(MockBackend::new(), &storage);
    let reducer = AuthReducer::new();
    let mut state = AuthState::default();

    let request = RegisterRequest {
        first_name: " Sara ".to_string(),
        last_name: "Tesfaye".to_string(),
        country_code: String::new(),
        mobile_number: "922000000".to_string(),
        email: "sara@example.com".to_string(),
        password: "pw".to_string(),
        gender: "Female".to_string(),
    };

    let effects = reducer.reduce(&mut state, AuthAction::Register(request), &env);
    let next = run(effects).await.unwrap();
    let _ = reducer.reduce(&mut state, next, &env);

    let registered = state.registered.expect("registered passenger");
    assert_eq!(registered.first_name, "Sara");
    assert_eq!(registered.country_code, "+251");
    assert!(state.error.is_none());
}

#[test]
fn registration_requires_names() {
    let storage = MemorySessionStorage::new();
    let request = RegisterRequest {
        first_name: String::new(),
        last_name: "Tesfaye".to_string(),
        country_code: "+251".to_string(),
        mobile_number: "922000000".to_string(),
        email: String::new(),
        password: "pw".to_string(),
        gender: String::new(),
    };

    ReducerTest::new(AuthReducer::new())
        .with_env(test_env(MockBackend::new(), &storage))
        .given_state(AuthState::default())
        .when_action(AuthAction::Register(request))
        .then_state(|state| {
            assert_eq!(
                state.error.as_ref().map(ToString::to_string).as_deref(),
                Some("First name is required")
            );
        })
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}
