//! Error types for the booking client

use thiserror::Error;

/// Errors produced by backend calls
///
/// Every variant is `Clone` so a failure can travel inside a `*Failed`
/// action and end up in a slice's `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS)
    #[error("Request failed: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status
    ///
    /// The message is the backend's own text and is shown verbatim.
    #[error("{message}")]
    Backend {
        /// HTTP status code
        status: u16,
        /// Error message from the backend
        message: String,
    },

    /// Missing, expired or rejected bearer token
    #[error("Please log in to continue")]
    Unauthenticated,

    /// The response did not match the expected contract
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Rejected locally before any request was made
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ApiError {
    /// Returns `true` when the user should be prompted to log in again
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }
}

/// Local validation failures
///
/// These never reach the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Seat confirmation without a selected seat
    #[error("Please select a seat")]
    NoSeatSelected,

    /// Seat picked that is not in the trip's seat map or not available
    #[error("Seat {0} is not available")]
    SeatUnavailable(String),

    /// Seat selection attempted on an unpaid booking
    #[error("Seats can only be chosen once the booking is paid")]
    NotPaid,

    /// No booking detail loaded to act on
    #[error("No booking is loaded")]
    NoBookingLoaded,

    /// Ticket named for confirmation does not belong to the booking
    #[error("Ticket {0} does not belong to this booking")]
    TicketNotInBooking(String),

    /// A required form field was blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// PNR search with a blank code
    #[error("Please enter a PNR code")]
    EmptyLocator,

    /// Booking request without passengers
    #[error("At least one passenger is required")]
    NoPassengers,

    /// Passenger form with a blank required field
    #[error("Passenger {index}: {field} is required")]
    IncompletePassenger {
        /// One-based passenger position
        index: usize,
        /// The blank field
        field: &'static str,
    },

    /// More passengers than the carrier allows per user
    #[error("At most {max} tickets can be booked at once ({requested} requested)")]
    TooManyPassengers {
        /// Carrier limit
        max: u32,
        /// Passengers submitted
        requested: usize,
    },

    /// Payment without a selected option
    #[error("Please select a payment method")]
    NoPaymentOption,

    /// Payment without a loaded passenger profile
    #[error("Please login to continue")]
    ProfileRequired,

    /// Payment for a booking that is already settled
    #[error("This booking is already paid")]
    AlreadyPaid,

    /// Payment target with nothing to charge
    #[error("This booking has no amount due")]
    NothingDue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_is_shown_verbatim() {
        let error = ApiError::Backend {
            status: 409,
            message: "Seat already taken".to_string(),
        };
        assert_eq!(error.to_string(), "Seat already taken");
    }

    #[test]
    fn validation_errors_convert() {
        let error: ApiError = ValidationError::NoSeatSelected.into();
        assert_eq!(error.to_string(), "Please select a seat");
        assert!(!error.requires_login());
        assert!(ApiError::Unauthenticated.requires_login());
    }
}
