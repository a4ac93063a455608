//! Trip state

use crate::error::ApiError;
use crate::types::{Pagination, Trip, TripQuery};

/// Trip search results
#[derive(Debug, Clone, Default)]
pub struct TripSearchState {
    /// Query of the latest search
    pub query: Option<TripQuery>,
    /// Matching trips
    pub trips: Vec<Trip>,
    /// Pagination of the results
    pub pagination: Option<Pagination>,
    /// Request in flight
    pub loading: bool,
    /// Last failure
    pub error: Option<ApiError>,
    /// Sequence number of the latest request
    pub seq: u64,
}

/// One trip with its seat inventory
#[derive(Debug, Clone, Default)]
pub struct TripDetailState {
    /// Trip requested
    pub trip_guid: Option<String>,
    /// Latest detail for `trip_guid`
    pub trip: Option<Trip>,
    /// Request in flight
    pub loading: bool,
    /// Last failure
    pub error: Option<ApiError>,
    /// Sequence number of the latest request
    pub seq: u64,
}

/// Everything the trip views show
#[derive(Debug, Clone, Default)]
pub struct TripState {
    /// Search
    pub search: TripSearchState,
    /// Selected trip
    pub detail: TripDetailState,
}
