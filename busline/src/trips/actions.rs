//! Actions for the trips feature

use crate::error::ApiError;
use crate::types::{Page, PageRequest, Trip, TripQuery};

/// Inputs to [`super::TripReducer`]
#[derive(Debug, Clone)]
pub enum TripAction {
    /// Search trips between two places on a date
    SearchTrips {
        /// Route and date
        query: TripQuery,
        /// Page to fetch; the configured trip page size when `None`
        page: Option<PageRequest>,
    },
    /// Search results arrived
    TripsLoaded {
        /// Request sequence
        seq: u64,
        /// The page
        page: Page<Trip>,
    },
    /// Search failed
    TripsFailed {
        /// Request sequence
        seq: u64,
        /// Cause
        error: ApiError,
    },

    /// Fetch one trip with its seats
    LoadTripDetails(String),
    /// Trip detail arrived
    TripDetailsLoaded {
        /// Request sequence
        seq: u64,
        /// The trip
        trip: Box<Trip>,
    },
    /// Trip detail request failed
    TripDetailsFailed {
        /// Request sequence
        seq: u64,
        /// Cause
        error: ApiError,
    },
    /// Forget the selected trip
    ClearTripDetails,
}
