//! Actions for the checkout feature

use crate::checkout::types::PaymentTarget;
use crate::error::ApiError;
use crate::types::{
    BookingConfirmation, Page, PageRequest, Passenger, PassengerForm, PaymentInitiation,
    PaymentOption, Trip,
};

/// Inputs to [`super::CheckoutReducer`]
#[derive(Debug, Clone)]
pub enum CheckoutAction {
    // Booking
    /// Book one ticket per passenger on a trip
    BookTickets {
        /// Trip to book on
        trip_guid: String,
        /// One form per passenger
        passengers: Vec<PassengerForm>,
        /// Carrier limit, if the trip carries one
        max_tickets_per_user: Option<u32>,
    },
    /// Tickets were issued
    TicketsBooked(BookingConfirmation),
    /// Booking request failed
    BookingFailed(ApiError),

    // Payment options
    /// Fetch active payment options; the configured page size when `None`
    LoadPaymentOptions(Option<PageRequest>),
    /// Options arrived
    PaymentOptionsLoaded {
        /// Request sequence
        seq: u64,
        /// The page
        page: Page<PaymentOption>,
    },
    /// Options request failed
    PaymentOptionsFailed {
        /// Request sequence
        seq: u64,
        /// Cause
        error: ApiError,
    },
    /// Remember the option the passenger picked
    SelectPaymentOption(String),

    // Payment
    /// Initiate payment of a booking
    Pay {
        /// Booking to settle
        target: PaymentTarget,
        /// Option to pay with; the selected option when `None`
        option_guid: Option<String>,
        /// Logged-in passenger's profile
        payer: Option<Passenger>,
    },
    /// The gateway accepted the payment request
    PaymentInitiated(PaymentInitiation),
    /// Payment request failed
    PaymentFailed(ApiError),

    /// Forget form results and payment state; options stay
    ResetCheckout,
}

impl CheckoutAction {
    /// Booking request for `trip`, carrying the carrier's ticket limit
    #[must_use]
    pub fn book(trip: &Trip, passengers: Vec<PassengerForm>) -> Self {
        Self::BookTickets {
            trip_guid: trip.trip_guid.clone(),
            passengers,
            max_tickets_per_user: trip.max_tickets_per_user(),
        }
    }
}
