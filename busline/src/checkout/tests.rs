//! Unit tests for `CheckoutReducer`.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use super::*;
use crate::environment::ClientEnvironment;
use crate::error::{ApiError, ValidationError};
use crate::grouping::group_by_pnr;
use crate::mocks::{fixtures, Endpoint, MockBackend};
use crate::session::MemorySessionStorage;
use crate::types::{LegacyTicket, PassengerForm};
use busline_core::{effect::Effect, reducer::Reducer};
use busline_testing::{assertions, test_clock, test_time, ReducerTest};
use rust_decimal::Decimal;
use std::sync::Arc;

type Env = ClientEnvironment<MockBackend>;

fn test_env(backend: MockBackend) -> Env {
    let env = ClientEnvironment::new(backend, Arc::new(MemorySessionStorage::new()), Arc::new(test_clock()));
    env.credentials.set("mock-token");
    env
}

fn form(first: &str, last: &str, mobile: &str) -> PassengerForm {
    PassengerForm {
        first_name: first.to_string(),
        last_name: last.to_string(),
        country_code: String::new(),
        mobile_number: mobile.to_string(),
        email: String::new(),
    }
}

async fn run(effects: impl IntoIterator<Item = Effect<CheckoutAction>>) -> CheckoutAction {
    let future = effects
        .into_iter()
        .find_map(|effect| match effect {
            Effect::Future(future) => Some(future),
            _ => None,
        })
        .expect("expected a Future effect");
    future.await.expect("expected an action")
}

// ============================================================================
// Booking
// ============================================================================

#[tokio::test]
async fn booking_issues_tickets() {
    let trip = fixtures::trip("trip-1", 850, 15);
    let backend = MockBackend::new().with_trip(trip.clone());
    let env = test_env(backend.clone());
    let reducer = CheckoutReducer::new();
    let mut state = CheckoutState::default();

    let action = CheckoutAction::book(
        &trip,
        vec![form(" Abebe ", "Kebede", "911000000"), form("Sara", "Tesfaye", "922000000")],
    );
    let effects = reducer.reduce(&mut state, action, &env);
    assert!(state.booking.loading);

    let booked = run(effects).await;
    let _ = reducer.reduce(&mut state, booked, &env);

    let confirmation = state.booking.confirmation.expect("confirmation");
    assert_eq!(confirmation.pnr, "PNR0001");
    assert_eq!(confirmation.payment.payment_guid, "payment-1");
    assert_eq!(confirmation.tickets.len(), 2);
    assert_eq!(confirmation.tickets[0].full_name, "Abebe Kebede");
    assert_eq!(confirmation.tickets[0].phone_number, "+251911000000");
    assert_eq!(backend.calls(Endpoint::BookTickets), 1);
}

#[test]
fn booking_needs_a_passenger() {
    ReducerTest::new(CheckoutReducer::new())
        .with_env(test_env(MockBackend::new()))
        .given_state(CheckoutState::default())
        .when_action(CheckoutAction::BookTickets {
            trip_guid: "trip-1".to_string(),
            passengers: Vec::new(),
            max_tickets_per_user: None,
        })
        .then_state(|state| {
            assert_eq!(
                state.booking.error,
                Some(ApiError::Validation(ValidationError::NoPassengers))
            );
        })
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}

#[test]
fn incomplete_passenger_is_named() {
    ReducerTest::new(CheckoutReducer::new())
        .with_env(test_env(MockBackend::new()))
        .given_state(CheckoutState::default())
        .when_action(CheckoutAction::BookTickets {
            trip_guid: "trip-1".to_string(),
            passengers: vec![form("Abebe", "Kebede", "911000000"), form("Sara", " ", "922000000")],
            max_tickets_per_user: None,
        })
        .then_state(|state| {
            assert_eq!(
                state.booking.error.as_ref().map(ToString::to_string).as_deref(),
                Some("Passenger 2: last name is required")
            );
        })
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}

#[test]
fn carrier_ticket_limit_is_enforced() {
    let trip = fixtures::trip("trip-1", 850, 15);
    let passengers = (0..5)
        .map(|i| form("Passenger", &i.to_string(), "911000000"))
        .collect();

    ReducerTest::new(CheckoutReducer::new())
        .with_env(test_env(MockBackend::new()))
        .given_state(CheckoutState::default())
        .when_action(CheckoutAction::book(&trip, passengers))
        .then_state(|state| {
            assert_eq!(
                state.booking.error,
                Some(ApiError::Validation(ValidationError::TooManyPassengers {
                    max: 4,
                    requested: 5
                }))
            );
        })
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}

// ============================================================================
// Payment options
// ============================================================================

#[tokio::test]
async fn options_load_and_drop_stale_selection() {
    let backend = MockBackend::new().with_payment_options(vec![
        fixtures::payment_option("opt-1", "Chapa"),
        fixtures::payment_option("opt-2", "Telebirr"),
    ]);
    let env = test_env(backend);
    let reducer = CheckoutReducer::new();
    let mut state = CheckoutState::default();
    let _ = reducer.reduce(&mut state, CheckoutAction::SelectPaymentOption("retired".to_string()), &env);

    let effects = reducer.reduce(&mut state, CheckoutAction::LoadPaymentOptions(None), &env);
    let loaded = run(effects).await;
    let _ = reducer.reduce(&mut state, loaded, &env);

    assert_eq!(state.options.options.len(), 2);
    assert!(!state.options.loading);
    assert_eq!(state.payment.selected_option, None);
}

#[test]
fn options_without_token_prompt_login() {
    let env = test_env(MockBackend::new());
    env.credentials.clear();

    ReducerTest::new(CheckoutReducer::new())
        .with_env(env)
        .given_state(CheckoutState::default())
        .when_action(CheckoutAction::LoadPaymentOptions(None))
        .then_state(|state| assert_eq!(state.options.error, Some(ApiError::Unauthenticated)))
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}

// ============================================================================
// Payment
// ============================================================================

#[tokio::test]
async fn payment_amount_comes_from_booking() {
    let detail = fixtures::booking_detail("b-1", fixtures::trip("trip-1", 850, 15), "PENDING", test_time());
    let backend = MockBackend::new()
        .with_detail(detail.clone())
        .with_checkout_url("https://checkout.example/pay/1");
    let env = test_env(backend.clone());
    let reducer = CheckoutReducer::new();
    let mut state = CheckoutState::default();

    let _ = reducer.reduce(&mut state, CheckoutAction::SelectPaymentOption("opt-1".to_string()), &env);
    let effects = reducer.reduce(
        &mut state,
        CheckoutAction::Pay {
            target: PaymentTarget::from(&detail),
            option_guid: None,
            payer: Some(fixtures::passenger()),
        },
        &env,
    );
    let initiated = run(effects).await;
    let _ = reducer.reduce(&mut state, initiated, &env);

    assert_eq!(state.payment.checkout_url(), Some("https://checkout.example/pay/1"));
    assert!(!state.payment.loading);
    assert_eq!(
        backend.call_log(),
        vec![(Endpoint::Pay, "payment-b-1:1700".to_string())]
    );
}

#[test]
fn payment_requires_profile() {
    let detail = fixtures::booking_detail("b-1", fixtures::trip("trip-1", 850, 15), "PENDING", test_time());

    ReducerTest::new(CheckoutReducer::new())
        .with_env(test_env(MockBackend::new()))
        .given_state(CheckoutState::default())
        .when_action(CheckoutAction::Pay {
            target: PaymentTarget::from(&detail),
            option_guid: Some("opt-1".to_string()),
            payer: None,
        })
        .then_state(|state| {
            assert_eq!(
                state.payment.error.as_ref().map(ToString::to_string).as_deref(),
                Some("Please login to continue")
            );
        })
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}

#[test]
fn payment_requires_option() {
    let detail = fixtures::booking_detail("b-1", fixtures::trip("trip-1", 850, 15), "PENDING", test_time());

    ReducerTest::new(CheckoutReducer::new())
        .with_env(test_env(MockBackend::new()))
        .given_state(CheckoutState::default())
        .when_action(CheckoutAction::Pay {
            target: PaymentTarget::from(&detail),
            option_guid: None,
            payer: Some(fixtures::passenger()),
        })
        .then_state(|state| {
            assert_eq!(
                state.payment.error,
                Some(ApiError::Validation(ValidationError::NoPaymentOption))
            );
        })
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}

#[test]
fn paid_booking_is_not_charged_again() {
    let detail = fixtures::booking_detail("b-1", fixtures::trip("trip-1", 850, 15), "PAID", test_time());

    ReducerTest::new(CheckoutReducer::new())
        .with_env(test_env(MockBackend::new()))
        .given_state(CheckoutState::default())
        .when_action(CheckoutAction::Pay {
            target: PaymentTarget::from(&detail),
            option_guid: Some("opt-1".to_string()),
            payer: Some(fixtures::passenger()),
        })
        .then_state(|state| {
            assert_eq!(
                state.payment.error,
                Some(ApiError::Validation(ValidationError::AlreadyPaid))
            );
        })
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}

#[test]
fn summary_without_tickets_is_not_charged() {
    let detail = fixtures::booking_detail("b-1", fixtures::trip("trip-1", 850, 15), "PENDING", test_time());
    let mut summary = fixtures::summary_of(&detail);
    summary.tickets.clear();
    let backend = MockBackend::new().with_checkout_url("https://checkout.example/pay/1");

    ReducerTest::new(CheckoutReducer::new())
        .with_env(test_env(backend.clone()))
        .given_state(CheckoutState::default())
        .when_action(CheckoutAction::Pay {
            target: PaymentTarget::from(&summary),
            option_guid: Some("opt-1".to_string()),
            payer: Some(fixtures::passenger()),
        })
        .then_state(|state| {
            assert_eq!(
                state.payment.error,
                Some(ApiError::Validation(ValidationError::NothingDue))
            );
            assert!(!state.payment.loading);
        })
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();

    assert_eq!(backend.total_calls(), 0);
}

#[test]
fn pnr_group_totals_every_ticket() {
    let detail = fixtures::booking_detail("b-1", fixtures::trip("trip-1", 850, 15), "PENDING", test_time());
    let summary = fixtures::summary_of(&detail);
    let tickets: Vec<LegacyTicket> = detail
        .tickets
        .iter()
        .map(|ticket| LegacyTicket {
            ticket_guid: ticket.ticket_guid.clone(),
            full_name: ticket.full_name.clone(),
            phone_number: ticket.phone_number.clone(),
            email: ticket.email.clone(),
            ticket_number: ticket.ticket_number.clone(),
            status: ticket.status.clone(),
            booking: summary.clone(),
        })
        .collect();

    let groups = group_by_pnr(&tickets);
    let target = PaymentTarget::from(&groups[0]);

    assert_eq!(target.amount(), Decimal::from(1700));
    assert_eq!(target.payment_guid(), "payment-b-1");
    assert_eq!(target, PaymentTarget::from(&summary));
}

#[tokio::test]
async fn gateway_failure_is_reported() {
    let detail = fixtures::booking_detail("b-1", fixtures::trip("trip-1", 850, 15), "PENDING", test_time());
    let backend = MockBackend::new().with_detail(detail.clone());
    backend.fail_next(
        Endpoint::Pay,
        ApiError::Backend {
            status: 502,
            message: "Payment gateway unavailable".to_string(),
        },
    );
    let env = test_env(backend);
    let reducer = CheckoutReducer::new();
    let mut state = CheckoutState::default();

    let effects = reducer.reduce(
        &mut state,
        CheckoutAction::Pay {
            target: PaymentTarget::from(&detail),
            option_guid: Some("opt-1".to_string()),
            payer: Some(fixtures::passenger()),
        },
        &env,
    );
    let failed = run(effects).await;
    let _ = reducer.reduce(&mut state, failed, &env);

    assert!(!state.payment.loading);
    assert_eq!(
        state.payment.error.map(|e| e.to_string()).as_deref(),
        Some("Payment gateway unavailable")
    );
    assert!(state.payment.initiation.is_none());
}
