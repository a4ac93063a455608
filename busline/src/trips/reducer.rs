//! Trips reducer.

use crate::api::BackendApi;
use crate::environment::ClientEnvironment;
use crate::error::ValidationError;
use crate::trips::types::TripDetailState;
use crate::trips::{TripAction, TripState};
use crate::types::{PageRequest, TripQuery};
use busline_core::async_effect;
use busline_core::{effect::Effect, reducer::Reducer};
use smallvec::{smallvec, SmallVec};
use std::marker::PhantomData;

/// Reducer for trip search and trip detail
#[derive(Debug, Clone)]
pub struct TripReducer<B> {
    _backend: PhantomData<B>,
}

impl<B> TripReducer<B> {
    /// Create a new trips reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B> Default for TripReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_query(mut query: TripQuery) -> Result<TripQuery, ValidationError> {
    for (value, field) in [
        (&mut query.origin_guid, "Origin"),
        (&mut query.destination_guid, "Destination"),
        (&mut query.travel_date, "Travel date"),
    ] {
        *value = value.trim().to_string();
        if value.is_empty() {
            return Err(ValidationError::MissingField(field));
        }
    }
    query.bus_carrier_guid = query
        .bus_carrier_guid
        .map(|guid| guid.trim().to_string())
        .filter(|guid| !guid.is_empty());
    Ok(query)
}

impl<B: BackendApi> Reducer for TripReducer<B> {
    type State = TripState;
    type Action = TripAction;
    type Environment = ClientEnvironment<B>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TripAction::SearchTrips { query, page } => {
                state.search.seq += 1;
                let query = match normalize_query(query) {
                    Ok(query) => query,
                    Err(error) => {
                        state.search.loading = false;
                        state.search.error = Some(error.into());
                        return smallvec![Effect::None];
                    },
                };

                state.search.query = Some(query.clone());
                state.search.loading = true;
                state.search.error = None;

                let seq = state.search.seq;
                let page = page.unwrap_or_else(|| PageRequest::first(env.paging.trips));
                let backend = env.backend.clone();
                smallvec![async_effect! {
                    Some(match backend.search_trips(&query, page).await {
                        Ok(page) => TripAction::TripsLoaded { seq, page },
                        Err(error) => TripAction::TripsFailed { seq, error },
                    })
                }]
            },

            TripAction::TripsLoaded { seq, page } => {
                if seq != state.search.seq {
                    tracing::debug!(seq, latest = state.search.seq, "Dropping stale trip results");
                    return smallvec![Effect::None];
                }
                tracing::debug!(count = page.items.len(), "Trips loaded");
                state.search.trips = page.items;
                state.search.pagination = page.pagination;
                state.search.loading = false;
                smallvec![Effect::None]
            },

            TripAction::TripsFailed { seq, error } => {
                if seq != state.search.seq {
                    return smallvec![Effect::None];
                }
                state.search.loading = false;
                state.search.error = Some(error);
                smallvec![Effect::None]
            },

            TripAction::LoadTripDetails(trip_guid) => {
                if state.detail.trip_guid.as_deref() != Some(trip_guid.as_str()) {
                    state.detail.trip = None;
                }
                state.detail.seq += 1;
                state.detail.trip_guid = Some(trip_guid.clone());
                state.detail.loading = true;
                state.detail.error = None;

                let seq = state.detail.seq;
                let backend = env.backend.clone();
                smallvec![async_effect! {
                    Some(match backend.trip_detail(&trip_guid).await {
                        Ok(trip) => TripAction::TripDetailsLoaded { seq, trip: Box::new(trip) },
                        Err(error) => TripAction::TripDetailsFailed { seq, error },
                    })
                }]
            },

            TripAction::TripDetailsLoaded { seq, trip } => {
                if seq != state.detail.seq {
                    tracing::debug!(trip = %trip.trip_guid, "Dropping stale trip detail");
                    return smallvec![Effect::None];
                }
                state.detail.trip = Some(*trip);
                state.detail.loading = false;
                smallvec![Effect::None]
            },

            TripAction::TripDetailsFailed { seq, error } => {
                if seq != state.detail.seq {
                    return smallvec![Effect::None];
                }
                state.detail.loading = false;
                state.detail.error = Some(error);
                smallvec![Effect::None]
            },

            TripAction::ClearTripDetails => {
                state.detail = TripDetailState {
                    seq: state.detail.seq,
                    ..TripDetailState::default()
                };
                smallvec![Effect::None]
            },
        }
    }
}
