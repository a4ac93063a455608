//! Unit tests for `TripReducer`.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use super::*;
use crate::environment::ClientEnvironment;
use crate::error::{ApiError, ValidationError};
use crate::mocks::{fixtures, Endpoint, MockBackend};
use crate::session::MemorySessionStorage;
use crate::types::{Page, PageRequest, TripQuery};
use busline_core::{effect::Effect, reducer::Reducer};
use busline_testing::{assertions, test_clock, ReducerTest};
use std::sync::Arc;

fn test_env(backend: MockBackend) -> ClientEnvironment<MockBackend> {
    ClientEnvironment::new(backend, Arc::new(MemorySessionStorage::new()), Arc::new(test_clock()))
}

fn query() -> TripQuery {
    TripQuery {
        origin_guid: " addis ".to_string(),
        destination_guid: "bahir-dar".to_string(),
        travel_date: "2025-10-28".to_string(),
        bus_carrier_guid: Some("  ".to_string()),
    }
}

async fn run(effects: impl IntoIterator<Item = Effect<TripAction>>) -> TripAction {
    let future = effects
        .into_iter()
        .find_map(|effect| match effect {
            Effect::Future(future) => Some(future),
            _ => None,
        })
        .expect("expected a Future effect");
    future.await.expect("expected an action")
}

#[tokio::test]
async fn search_trims_query_and_loads_results() {
    let backend = MockBackend::new().with_search_results(vec![
        fixtures::trip("trip-1", 850, 15),
        fixtures::trip("trip-2", 900, 15),
    ]);
    let env = test_env(backend.clone());
    let reducer = TripReducer::new();
    let mut state = TripState::default();

    let effects = reducer.reduce(&mut state, TripAction::SearchTrips { query: query(), page: None }, &env);
    let searched = state.search.query.clone().unwrap();
    assert_eq!(searched.origin_guid, "addis");
    assert_eq!(searched.bus_carrier_guid, None);
    assert!(state.search.loading);

    let loaded = run(effects).await;
    let _ = reducer.reduce(&mut state, loaded, &env);

    assert_eq!(state.search.trips.len(), 2);
    assert_eq!(state.search.pagination.map(|p| p.total_pages), Some(1));
    assert!(!state.search.loading);
    assert_eq!(
        backend.call_log(),
        vec![(Endpoint::SearchTrips, "addis->bahir-dar@2025-10-28".to_string())]
    );
}

#[tokio::test]
async fn no_trips_is_empty_not_an_error() {
    let env = test_env(MockBackend::new());
    let reducer = TripReducer::new();
    let mut state = TripState::default();

    let effects = reducer.reduce(&mut state, TripAction::SearchTrips { query: query(), page: None }, &env);
    let loaded = run(effects).await;
    let _ = reducer.reduce(&mut state, loaded, &env);

    assert!(state.search.trips.is_empty());
    assert!(state.search.error.is_none());
    assert!(state.search.pagination.is_none());
}

#[test]
fn search_requires_destination() {
    let mut incomplete = query();
    incomplete.destination_guid = String::new();

    ReducerTest::new(TripReducer::new())
        .with_env(test_env(MockBackend::new()))
        .given_state(TripState::default())
        .when_action(TripAction::SearchTrips {
            query: incomplete,
            page: Some(PageRequest::first(5)),
        })
        .then_state(|state| {
            assert_eq!(
                state.search.error,
                Some(ApiError::Validation(ValidationError::MissingField("Destination")))
            );
            assert!(!state.search.loading);
        })
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}

#[test]
fn older_search_results_are_dropped() {
    ReducerTest::new(TripReducer::new())
        .with_env(test_env(MockBackend::new()))
        .given_state(TripState::default())
        .given_actions(vec![
            TripAction::SearchTrips { query: query(), page: None },
            TripAction::SearchTrips { query: query(), page: None },
        ])
        .when_action(TripAction::TripsLoaded {
            seq: 1,
            page: Page {
                items: vec![fixtures::trip("trip-1", 850, 15)],
                pagination: None,
            },
        })
        .then_state(|state| {
            assert!(state.search.trips.is_empty());
            assert!(state.search.loading);
        })
        .run();
}

#[tokio::test]
async fn trip_detail_loads_and_clears() {
    let backend = MockBackend::new().with_trip(fixtures::trip("trip-1", 850, 15));
    let env = test_env(backend);
    let reducer = TripReducer::new();
    let mut state = TripState::default();

    let effects = reducer.reduce(&mut state, TripAction::LoadTripDetails("trip-1".to_string()), &env);
    let loaded = run(effects).await;
    let _ = reducer.reduce(&mut state, loaded, &env);

    let trip = state.detail.trip.as_ref().expect("trip loaded");
    assert_eq!(trip.seats().len(), 4);
    assert_eq!(trip.max_payment_minutes(), Some(15));

    let _ = reducer.reduce(&mut state, TripAction::ClearTripDetails, &env);
    assert!(state.detail.trip.is_none());
    assert!(state.detail.trip_guid.is_none());
    assert_eq!(state.detail.seq, 1);
}

#[tokio::test]
async fn unknown_trip_sets_error() {
    let env = test_env(MockBackend::new());
    let reducer = TripReducer::new();
    let mut state = TripState::default();

    let effects = reducer.reduce(&mut state, TripAction::LoadTripDetails("missing".to_string()), &env);
    let failed = run(effects).await;
    let _ = reducer.reduce(&mut state, failed, &env);

    assert!(matches!(state.detail.error, Some(ApiError::Backend { status: 404, .. })));
    assert!(state.detail.trip.is_none());
}
