//! Ticket state.
//!
//! Each slice tracks its own loading flag, error and request sequence so
//! unrelated requests never touch each other's status.

use crate::api::BookingQuery;
use crate::countdown::Countdown;
use crate::error::{ApiError, ValidationError};
use crate::seats::SeatMap;
use crate::types::{BookingDetail, BookingSummary, Pagination, Trip};
use thiserror::Error;

/// Effect id of the countdown tick loop
pub const COUNTDOWN_EFFECT: &str = "countdown";

/// Views with lifecycle hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// The passenger's booking list
    MyTickets,
    /// One booking, by guid
    BookingDetail(String),
}

/// The passenger's bookings, one page at a time
#[derive(Debug, Clone, Default)]
pub struct BookingListState {
    /// Bookings on the current page
    pub bookings: Vec<BookingSummary>,
    /// Pagination of the current page
    pub pagination: Option<Pagination>,
    /// Query of the latest request
    pub query: Option<BookingQuery>,
    /// Request in flight
    pub loading: bool,
    /// Last failure; the previous page stays visible
    pub error: Option<ApiError>,
    /// Sequence number of the latest request
    pub seq: u64,
}

/// Public PNR lookup
#[derive(Debug, Clone, Default)]
pub struct LocatorSearchState {
    /// Trimmed code of the latest search
    pub locator: String,
    /// Matching bookings
    pub results: Vec<BookingSummary>,
    /// Pagination of the results
    pub pagination: Option<Pagination>,
    /// Request in flight
    pub loading: bool,
    /// Last failure
    pub error: Option<ApiError>,
    /// Sequence number of the latest request
    pub seq: u64,
}

/// The booking open in the detail view
#[derive(Debug, Clone, Default)]
pub struct BookingDetailState {
    /// Booking the view is showing; responses for any other id are dropped
    pub booking_guid: Option<String>,
    /// Latest detail for `booking_guid`
    pub booking: Option<BookingDetail>,
    /// Request in flight
    pub loading: bool,
    /// Last failure
    pub error: Option<ApiError>,
    /// Sequence number of the latest request
    pub seq: u64,
}

/// Seat inventory of the open booking's trip
#[derive(Debug, Clone, Default)]
pub struct SeatMapState {
    /// Trip the inventory belongs to
    pub trip_guid: Option<String>,
    /// Trip detail including seat availability
    pub trip: Option<Trip>,
    /// Request in flight
    pub loading: bool,
    /// Last failure
    pub error: Option<ApiError>,
    /// Sequence number of the latest request
    pub seq: u64,
}

impl SeatMapState {
    /// Seats laid out as a grid
    #[must_use]
    pub fn layout(&self) -> SeatMap {
        self.trip.as_ref().map(SeatMap::from_trip).unwrap_or_default()
    }
}

/// A seat bound to a ticket by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedSeat {
    /// Ticket the seat was bound to
    pub ticket_guid: String,
    /// The seat
    pub trip_seat_guid: String,
}

/// Why a seat could not be picked or confirmed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatError {
    /// Rejected locally
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The confirmation request failed; the cause is kept for logs
    #[error("Failed to confirm seat")]
    ConfirmFailed(#[source] ApiError),
}

impl SeatError {
    /// Returns `true` when the passenger has to log in again
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::ConfirmFailed(ApiError::Unauthenticated))
    }
}

/// Seat selection for the open booking
#[derive(Debug, Clone, Default)]
pub struct SeatSelectionState {
    /// Seat picked but not yet confirmed; kept when confirmation fails
    pub selected: Option<String>,
    /// Confirmation in flight
    pub confirming: bool,
    /// Last selection or confirmation failure
    pub error: Option<SeatError>,
    /// Last successful confirmation
    pub last_confirmed: Option<ConfirmedSeat>,
    /// Sequence number of the latest confirmation
    pub seq: u64,
}

/// Payment countdown of the open booking
#[derive(Debug, Clone, Default)]
pub struct CountdownState {
    /// Latest derived value; `None` for paid bookings or unknown windows
    pub current: Option<Countdown>,
    /// A tick is scheduled
    pub running: bool,
    /// Tick loop generation; ticks from earlier loops are ignored
    pub generation: u64,
}

/// Everything the tickets views show
#[derive(Debug, Clone, Default)]
pub struct TicketState {
    /// My bookings
    pub list: BookingListState,
    /// PNR search
    pub search: LocatorSearchState,
    /// Open booking
    pub detail: BookingDetailState,
    /// Open booking's seat inventory
    pub seat_map: SeatMapState,
    /// Seat selection
    pub seat: SeatSelectionState,
    /// Payment countdown
    pub countdown: CountdownState,
}

impl TicketState {
    /// The open booking, once loaded
    #[must_use]
    pub const fn booking(&self) -> Option<&BookingDetail> {
        self.detail.booking.as_ref()
    }

    /// The carrier's payment window, from the booking or the trip detail
    #[must_use]
    pub fn max_payment_minutes(&self) -> Option<u32> {
        self.booking()
            .and_then(|booking| booking.trip.max_payment_minutes())
            .or_else(|| self.seat_map.trip.as_ref()?.max_payment_minutes())
    }

    /// Returns `true` if seat selection is offered for the open booking
    #[must_use]
    pub fn seat_selection_allowed(&self) -> bool {
        self.booking().is_some_and(crate::seats::selection_allowed)
    }
}
