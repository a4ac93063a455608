//! Tickets reducer.
//!
//! # Response ordering
//!
//! Every request bumps its slice's `seq` and carries it in the response
//! action. A response whose `seq` is no longer the latest, or whose booking
//! or trip is no longer the one on screen, is dropped. The latest request
//! wins regardless of arrival order.
//!
//! # Countdown
//!
//! The countdown runs as a loop of cancellable one-tick delays registered
//! under [`COUNTDOWN_EFFECT`]. It starts when an unpaid booking with a known
//! payment window is committed and stops when the booking is seen paid, the
//! window is over, or the view is left.

use crate::api::{BackendApi, BookingQuery};
use crate::countdown::{self, Countdown};
use crate::environment::ClientEnvironment;
use crate::error::{ApiError, ValidationError};
use crate::seats;
use crate::tickets::types::{
    BookingDetailState, ConfirmedSeat, CountdownState, SeatError, SeatMapState,
    SeatSelectionState, COUNTDOWN_EFFECT,
};
use crate::tickets::{TicketAction, TicketState, View};
use crate::types::PageRequest;
use busline_core::{async_effect, cancellable, delay};
use busline_core::effect::{Effect, EffectId};
use busline_core::reducer::Reducer;
use smallvec::{smallvec, SmallVec};
use std::marker::PhantomData;

/// Reducer for the booking list, PNR search, booking detail, seat gate and
/// payment countdown
#[derive(Debug, Clone)]
pub struct TicketReducer<B> {
    _backend: PhantomData<B>,
}

impl<B> TicketReducer<B> {
    /// Create a new tickets reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B> Default for TicketReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

type Effects = SmallVec<[Effect<TicketAction>; 4]>;

/// Drop no-op effects; an empty result becomes a single `Effect::None`
fn collect(effects: impl IntoIterator<Item = Effect<TicketAction>>) -> Effects {
    let effects: Effects = effects.into_iter().filter(|e| !e.is_none()).collect();
    if effects.is_empty() {
        smallvec![Effect::None]
    } else {
        effects
    }
}

fn countdown_id() -> EffectId {
    EffectId::new(COUNTDOWN_EFFECT)
}

// ============================================================================
// Request effects
// ============================================================================

fn fetch_bookings<B: BackendApi>(env: &ClientEnvironment<B>, token: String, seq: u64, query: BookingQuery) -> Effect<TicketAction> {
    let backend = env.backend.clone();
    async_effect! {
        Some(match backend.bookings(&token, &query).await {
            Ok(page) => TicketAction::BookingsLoaded { seq, page },
            Err(error) => TicketAction::BookingsFailed { seq, error },
        })
    }
}

fn fetch_search<B: BackendApi>(env: &ClientEnvironment<B>, seq: u64, locator: String, page: PageRequest) -> Effect<TicketAction> {
    let backend = env.backend.clone();
    async_effect! {
        Some(match backend.search_bookings(&locator, page).await {
            Ok(page) => TicketAction::SearchCompleted { seq, page },
            Err(error) => TicketAction::SearchFailed { seq, error },
        })
    }
}

fn fetch_detail<B: BackendApi>(env: &ClientEnvironment<B>, token: String, seq: u64, booking_guid: String) -> Effect<TicketAction> {
    let backend = env.backend.clone();
    async_effect! {
        Some(match backend.booking_detail(&token, &booking_guid).await {
            Ok(detail) => TicketAction::DetailLoaded { seq, booking_guid, detail: Box::new(detail) },
            Err(error) => TicketAction::DetailFailed { seq, booking_guid, error },
        })
    }
}

fn fetch_seat_map<B: BackendApi>(env: &ClientEnvironment<B>, seq: u64, trip_guid: String) -> Effect<TicketAction> {
    let backend = env.backend.clone();
    async_effect! {
        Some(match backend.trip_detail(&trip_guid).await {
            Ok(trip) => TicketAction::SeatMapLoaded { seq, trip_guid, trip: Box::new(trip) },
            Err(error) => TicketAction::SeatMapFailed { seq, trip_guid, error },
        })
    }
}

fn schedule_tick<B: BackendApi>(env: &ClientEnvironment<B>, generation: u64) -> Effect<TicketAction> {
    cancellable! {
        id: COUNTDOWN_EFFECT,
        effect: delay! {
            duration: env.countdown_tick,
            action: TicketAction::CountdownTick { generation }
        }
    }
}

// ============================================================================
// State transitions shared by several actions
// ============================================================================

/// Issue a detail request for the active booking
fn begin_detail<B: BackendApi>(state: &mut TicketState, env: &ClientEnvironment<B>) -> Effect<TicketAction> {
    let Some(booking_guid) = state.detail.booking_guid.clone() else {
        return Effect::None;
    };
    let Some(token) = env.credentials.token() else {
        state.detail.loading = false;
        state.detail.error = Some(ApiError::Unauthenticated);
        return Effect::None;
    };

    state.detail.seq += 1;
    state.detail.loading = true;
    state.detail.error = None;
    fetch_detail(env, token, state.detail.seq, booking_guid)
}

/// Issue a seat inventory request for `trip_guid`
fn begin_seat_map<B: BackendApi>(state: &mut TicketState, env: &ClientEnvironment<B>, trip_guid: String) -> Effect<TicketAction> {
    if state.seat_map.trip_guid.as_deref() != Some(trip_guid.as_str()) {
        state.seat_map.trip = None;
    }
    state.seat_map.trip_guid = Some(trip_guid.clone());
    state.seat_map.seq += 1;
    state.seat_map.loading = true;
    state.seat_map.error = None;
    fetch_seat_map(env, state.seat_map.seq, trip_guid)
}

/// Forget the open booking; sequence numbers keep counting so late
/// responses for it can never match again
fn clear_detail(state: &mut TicketState) {
    state.detail = BookingDetailState {
        seq: state.detail.seq,
        ..BookingDetailState::default()
    };
    state.seat_map = SeatMapState {
        seq: state.seat_map.seq,
        ..SeatMapState::default()
    };
    state.seat = SeatSelectionState {
        seq: state.seat.seq,
        ..SeatSelectionState::default()
    };
    state.countdown = CountdownState {
        generation: state.countdown.generation,
        ..CountdownState::default()
    };
}

fn derive_countdown<B: BackendApi>(state: &TicketState, env: &ClientEnvironment<B>) -> Option<Countdown> {
    let booking = state.booking().filter(|booking| !booking.is_paid())?;
    let booked_at = booking.booking_date?;
    let max_minutes = state.max_payment_minutes()?;
    Some(countdown::derive(booked_at, max_minutes, env.clock.now()))
}

/// Re-derive the countdown after the booking or trip changed, starting or
/// stopping the tick loop as needed
fn sync_countdown<B: BackendApi>(state: &mut TicketState, env: &ClientEnvironment<B>) -> Effect<TicketAction> {
    let current = derive_countdown(state, env);
    let payable = current.as_ref().is_some_and(Countdown::is_payable);
    state.countdown.current = current;

    match (payable, state.countdown.running) {
        (true, false) => {
            state.countdown.generation += 1;
            state.countdown.running = true;
            tracing::debug!(generation = state.countdown.generation, "Starting payment countdown");
            schedule_tick(env, state.countdown.generation)
        },
        (false, true) => {
            state.countdown.running = false;
            tracing::debug!("Stopping payment countdown");
            Effect::Cancel(countdown_id())
        },
        _ => Effect::None,
    }
}

fn validate_confirmation(state: &TicketState, ticket_guid: Option<&str>) -> Result<(String, String, String), ValidationError> {
    let seat = state
        .seat
        .selected
        .clone()
        .filter(|seat| !seat.trim().is_empty())
        .ok_or(ValidationError::NoSeatSelected)?;
    let booking = state.booking().ok_or(ValidationError::NoBookingLoaded)?;
    if !seats::selection_allowed(booking) {
        return Err(ValidationError::NotPaid);
    }
    let ticket = seats::resolve_ticket(booking, ticket_guid)?;
    Ok((booking.booking_guid.clone(), ticket, seat))
}

impl<B: BackendApi> Reducer for TicketReducer<B> {
    type State = TicketState;
    type Action = TicketAction;
    type Environment = ClientEnvironment<B>;

    #[allow(clippy::too_many_lines)] // one arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Lifecycle
            // ═══════════════════════════════════════════════════════════════
            TicketAction::ViewEntered(View::MyTickets) => {
                let query = state
                    .list
                    .query
                    .clone()
                    .unwrap_or_else(|| BookingQuery::first(env.paging.bookings));
                self.reduce(state, TicketAction::LoadBookings(query), env)
            },

            TicketAction::ViewExited(View::MyTickets) => smallvec![Effect::None],

            TicketAction::ViewEntered(View::BookingDetail(booking_guid)) => {
                let was_running = state.countdown.running;
                clear_detail(state);
                state.detail.booking_guid = Some(booking_guid);

                let cancel = if was_running {
                    Effect::Cancel(countdown_id())
                } else {
                    Effect::None
                };
                collect([cancel, begin_detail(state, env)])
            },

            TicketAction::ViewExited(View::BookingDetail(booking_guid)) => {
                if state.detail.booking_guid.as_deref() != Some(booking_guid.as_str()) {
                    tracing::debug!(%booking_guid, "Ignoring exit of a view that is no longer active");
                    return smallvec![Effect::None];
                }
                clear_detail(state);
                smallvec![Effect::Cancel(countdown_id())]
            },

            // ═══════════════════════════════════════════════════════════════
            // Booking list
            // ═══════════════════════════════════════════════════════════════
            TicketAction::LoadBookings(query) => {
                let Some(token) = env.credentials.token() else {
                    state.list.loading = false;
                    state.list.error = Some(ApiError::Unauthenticated);
                    return smallvec![Effect::None];
                };

                state.list.seq += 1;
                state.list.loading = true;
                state.list.error = None;
                state.list.query = Some(query.clone());
                smallvec![fetch_bookings(env, token, state.list.seq, query)]
            },

            TicketAction::BookingsLoaded { seq, page } => {
                if seq != state.list.seq {
                    tracing::debug!(seq, latest = state.list.seq, "Dropping stale booking page");
                    return smallvec![Effect::None];
                }
                state.list.bookings = page.items;
                state.list.pagination = page.pagination;
                state.list.loading = false;
                state.list.error = None;
                smallvec![Effect::None]
            },

            TicketAction::BookingsFailed { seq, error } => {
                if seq != state.list.seq {
                    return smallvec![Effect::None];
                }
                tracing::debug!(%error, "Booking list request failed");
                state.list.loading = false;
                state.list.error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // PNR search
            // ═══════════════════════════════════════════════════════════════
            TicketAction::SearchByLocator { locator, page } => {
                let locator = locator.trim().to_string();
                state.search.seq += 1;

                if locator.is_empty() {
                    state.search.locator = String::new();
                    state.search.results.clear();
                    state.search.pagination = None;
                    state.search.loading = false;
                    state.search.error = Some(ValidationError::EmptyLocator.into());
                    return smallvec![Effect::None];
                }

                state.search.locator = locator.clone();
                state.search.loading = true;
                state.search.error = None;
                let page = page.unwrap_or_else(|| PageRequest::first(env.paging.search));
                smallvec![fetch_search(env, state.search.seq, locator, page)]
            },

            TicketAction::SearchCompleted { seq, page } => {
                if seq != state.search.seq {
                    tracing::debug!(seq, latest = state.search.seq, "Dropping stale search results");
                    return smallvec![Effect::None];
                }
                state.search.results = page.items;
                state.search.pagination = page.pagination;
                state.search.loading = false;
                state.search.error = None;
                smallvec![Effect::None]
            },

            TicketAction::SearchFailed { seq, error } => {
                if seq != state.search.seq {
                    return smallvec![Effect::None];
                }
                state.search.loading = false;
                state.search.error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Booking detail
            // ═══════════════════════════════════════════════════════════════
            TicketAction::LoadBookingDetail(booking_guid) => {
                let mut effects = Effects::new();
                if state.detail.booking_guid.as_deref() != Some(booking_guid.as_str()) {
                    if state.countdown.running {
                        effects.push(Effect::Cancel(countdown_id()));
                    }
                    clear_detail(state);
                    state.detail.booking_guid = Some(booking_guid);
                }
                effects.push(begin_detail(state, env));
                collect(effects)
            },

            TicketAction::DetailLoaded {
                seq,
                booking_guid,
                detail,
            } => {
                if seq != state.detail.seq
                    || state.detail.booking_guid.as_deref() != Some(booking_guid.as_str())
                {
                    tracing::debug!(%booking_guid, seq, "Dropping stale booking detail");
                    return smallvec![Effect::None];
                }

                let trip_guid = detail.trip.trip_guid.clone();
                state.detail.booking = Some(*detail);
                state.detail.loading = false;
                state.detail.error = None;

                let seat_map = if state.seat_map.trip_guid.as_deref() == Some(trip_guid.as_str()) {
                    Effect::None
                } else {
                    begin_seat_map(state, env, trip_guid)
                };
                let countdown = sync_countdown(state, env);
                collect([seat_map, countdown])
            },

            TicketAction::DetailFailed {
                seq,
                booking_guid,
                error,
            } => {
                if seq != state.detail.seq
                    || state.detail.booking_guid.as_deref() != Some(booking_guid.as_str())
                {
                    return smallvec![Effect::None];
                }
                tracing::debug!(%booking_guid, %error, "Booking detail request failed");
                state.detail.loading = false;
                state.detail.error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Seat map
            // ═══════════════════════════════════════════════════════════════
            TicketAction::LoadSeatMap(trip_guid) => smallvec![begin_seat_map(state, env, trip_guid)],

            TicketAction::SeatMapLoaded {
                seq,
                trip_guid,
                trip,
            } => {
                if seq != state.seat_map.seq
                    || state.seat_map.trip_guid.as_deref() != Some(trip_guid.as_str())
                {
                    tracing::debug!(%trip_guid, seq, "Dropping stale seat map");
                    return smallvec![Effect::None];
                }

                // The backend decides races for a seat; a picked seat that is
                // now taken is no longer a valid selection
                let taken = state.seat.selected.as_deref().is_some_and(|selected| {
                    !trip
                        .seats()
                        .iter()
                        .any(|seat| seat.trip_seat_guid == selected && seat.is_available())
                });
                if taken {
                    tracing::info!(seat = ?state.seat.selected, "Selected seat was taken");
                    state.seat.selected = None;
                }

                state.seat_map.trip = Some(*trip);
                state.seat_map.loading = false;
                state.seat_map.error = None;
                collect([sync_countdown(state, env)])
            },

            TicketAction::SeatMapFailed {
                seq,
                trip_guid,
                error,
            } => {
                if seq != state.seat_map.seq
                    || state.seat_map.trip_guid.as_deref() != Some(trip_guid.as_str())
                {
                    return smallvec![Effect::None];
                }
                state.seat_map.loading = false;
                state.seat_map.error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Seat selection
            // ═══════════════════════════════════════════════════════════════
            TicketAction::SelectSeat(trip_seat_guid) => {
                let checked = state
                    .booking()
                    .ok_or(ValidationError::NoBookingLoaded)
                    .and_then(|booking| {
                        seats::check_selectable(booking, state.seat_map.trip.as_ref(), &trip_seat_guid)
                    });

                match checked {
                    Ok(()) => {
                        state.seat.selected = Some(trip_seat_guid);
                        state.seat.error = None;
                    },
                    Err(error) => state.seat.error = Some(error.into()),
                }
                smallvec![Effect::None]
            },

            TicketAction::ClearSeatSelection => {
                state.seat.selected = None;
                state.seat.error = None;
                smallvec![Effect::None]
            },

            TicketAction::ConfirmSeat { ticket_guid } => {
                if state.seat.confirming {
                    tracing::debug!("Seat confirmation already in flight");
                    return smallvec![Effect::None];
                }

                let (booking_guid, ticket_guid, trip_seat_guid) =
                    match validate_confirmation(state, ticket_guid.as_deref()) {
                        Ok(request) => request,
                        Err(error) => {
                            state.seat.error = Some(error.into());
                            return smallvec![Effect::None];
                        },
                    };

                let Some(token) = env.credentials.token() else {
                    state.seat.error = Some(SeatError::ConfirmFailed(ApiError::Unauthenticated));
                    return smallvec![Effect::None];
                };

                state.seat.seq += 1;
                state.seat.confirming = true;
                state.seat.error = None;

                let seq = state.seat.seq;
                let backend = env.backend.clone();
                smallvec![async_effect! {
                    Some(match backend.confirm_seat(&token, &ticket_guid, &trip_seat_guid).await {
                        Ok(()) => TicketAction::SeatConfirmed { seq, booking_guid, ticket_guid, trip_seat_guid },
                        Err(error) => TicketAction::SeatConfirmFailed { seq, booking_guid, error },
                    })
                }]
            },

            TicketAction::SeatConfirmed {
                seq,
                booking_guid,
                ticket_guid,
                trip_seat_guid,
            } => {
                if seq != state.seat.seq || state.detail.booking_guid.as_deref() != Some(booking_guid.as_str()) {
                    tracing::debug!(seq, %booking_guid, "Dropping stale seat confirmation");
                    return smallvec![Effect::None];
                }
                state.seat.confirming = false;

                tracing::info!(%booking_guid, %ticket_guid, %trip_seat_guid, "Seat confirmed");
                state.seat.selected = None;
                state.seat.error = None;
                state.seat.last_confirmed = Some(ConfirmedSeat {
                    ticket_guid,
                    trip_seat_guid,
                });

                // Booking and trip inventory are separate read models; refresh both
                let trip_guid = state
                    .seat_map
                    .trip_guid
                    .clone()
                    .or_else(|| state.booking().map(|b| b.trip.trip_guid.clone()));
                let mut refresh = vec![begin_detail(state, env)];
                if let Some(trip_guid) = trip_guid {
                    refresh.push(begin_seat_map(state, env, trip_guid));
                }
                smallvec![Effect::Parallel(refresh)]
            },

            TicketAction::SeatConfirmFailed { seq, booking_guid, error } => {
                if seq != state.seat.seq || state.detail.booking_guid.as_deref() != Some(booking_guid.as_str()) {
                    return smallvec![Effect::None];
                }
                state.seat.confirming = false;
                tracing::warn!(%booking_guid, %error, "Seat confirmation failed");
                state.seat.error = Some(SeatError::ConfirmFailed(error));
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Countdown
            // ═══════════════════════════════════════════════════════════════
            TicketAction::CountdownTick { generation } => {
                if !state.countdown.running || generation != state.countdown.generation {
                    return smallvec![Effect::None];
                }

                let current = derive_countdown(state, env);
                let payable = current.as_ref().is_some_and(Countdown::is_payable);
                state.countdown.current = current;

                if payable {
                    smallvec![schedule_tick(env, generation)]
                } else {
                    tracing::debug!("Payment countdown finished");
                    state.countdown.running = false;
                    smallvec![Effect::None]
                }
            },

            TicketAction::DismissErrors => {
                state.list.error = None;
                state.search.error = None;
                state.detail.error = None;
                state.seat_map.error = None;
                state.seat.error = None;
                smallvec![Effect::None]
            },
        }
    }
}
