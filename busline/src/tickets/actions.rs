//! Actions for the tickets feature.
//!
//! Responses carry the sequence number of the request that produced them.
//! The reducer only commits a response whose sequence is still the latest
//! for its slice.

use crate::api::BookingQuery;
use crate::error::ApiError;
use crate::tickets::types::View;
use crate::types::{BookingDetail, BookingSummary, Page, PageRequest, Trip};

/// Inputs to [`super::TicketReducer`]
#[derive(Debug, Clone)]
pub enum TicketAction {
    // Lifecycle
    /// A view became active
    ViewEntered(View),
    /// A view was torn down
    ViewExited(View),

    // Booking list
    /// Fetch a page of the passenger's bookings
    LoadBookings(BookingQuery),
    /// Booking page arrived
    BookingsLoaded {
        /// Request sequence
        seq: u64,
        /// The page
        page: Page<BookingSummary>,
    },
    /// Booking page request failed
    BookingsFailed {
        /// Request sequence
        seq: u64,
        /// Cause
        error: ApiError,
    },

    // PNR search
    /// Look up bookings by PNR; a blank code clears the results
    SearchByLocator {
        /// PNR code or fragment
        locator: String,
        /// Page to fetch; the configured search page size when `None`
        page: Option<PageRequest>,
    },
    /// Search results arrived
    SearchCompleted {
        /// Request sequence
        seq: u64,
        /// The page
        page: Page<BookingSummary>,
    },
    /// Search failed
    SearchFailed {
        /// Request sequence
        seq: u64,
        /// Cause
        error: ApiError,
    },

    // Booking detail
    /// Fetch or refresh one booking
    LoadBookingDetail(String),
    /// Booking detail arrived
    DetailLoaded {
        /// Request sequence
        seq: u64,
        /// Booking requested
        booking_guid: String,
        /// The detail
        detail: Box<BookingDetail>,
    },
    /// Booking detail request failed
    DetailFailed {
        /// Request sequence
        seq: u64,
        /// Booking requested
        booking_guid: String,
        /// Cause
        error: ApiError,
    },

    // Seat map
    /// Fetch the seat inventory of a trip
    LoadSeatMap(String),
    /// Trip detail arrived
    SeatMapLoaded {
        /// Request sequence
        seq: u64,
        /// Trip requested
        trip_guid: String,
        /// The trip with its seats
        trip: Box<Trip>,
    },
    /// Trip detail request failed
    SeatMapFailed {
        /// Request sequence
        seq: u64,
        /// Trip requested
        trip_guid: String,
        /// Cause
        error: ApiError,
    },

    // Seat selection
    /// Pick a seat for the open booking
    SelectSeat(String),
    /// Drop the picked seat
    ClearSeatSelection,
    /// Bind the picked seat to a ticket; the first ticket when `None`
    ConfirmSeat {
        /// Ticket to bind
        ticket_guid: Option<String>,
    },
    /// The backend bound the seat
    SeatConfirmed {
        /// Request sequence
        seq: u64,
        /// Booking the ticket belongs to
        booking_guid: String,
        /// Ticket bound
        ticket_guid: String,
        /// Seat bound
        trip_seat_guid: String,
    },
    /// The backend refused or the request failed
    SeatConfirmFailed {
        /// Request sequence
        seq: u64,
        /// Booking the ticket belongs to
        booking_guid: String,
        /// Cause
        error: ApiError,
    },

    // Countdown
    /// Recompute the payment countdown
    CountdownTick {
        /// Loop generation that scheduled this tick
        generation: u64,
    },

    /// Dismiss every slice's error
    DismissErrors,
}
