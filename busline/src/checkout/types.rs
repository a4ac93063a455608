//! Checkout state

use crate::error::ApiError;
use crate::grouping::PnrGroup;
use crate::types::{
    BookingConfirmation, BookingDetail, BookingSummary, Pagination, PaymentInitiation,
    PaymentOption,
};
use rust_decimal::Decimal;

/// A booking's payment, with the amount due
///
/// Built from a booking view only, so the amount can never be typed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTarget {
    pnr: String,
    payment_guid: String,
    amount: Decimal,
    paid: bool,
}

impl PaymentTarget {
    /// Booking locator
    #[must_use]
    pub fn pnr(&self) -> &str {
        &self.pnr
    }

    /// Payment to settle
    #[must_use]
    pub fn payment_guid(&self) -> &str {
        &self.payment_guid
    }

    /// Seat price times ticket count
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns `true` if the booking is already settled
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        self.paid
    }
}

impl From<&BookingDetail> for PaymentTarget {
    fn from(booking: &BookingDetail) -> Self {
        Self {
            pnr: booking.pnr.clone(),
            payment_guid: booking.payment.payment_guid.clone(),
            amount: booking.total_amount(),
            paid: booking.is_paid(),
        }
    }
}

impl From<&BookingSummary> for PaymentTarget {
    fn from(booking: &BookingSummary) -> Self {
        Self {
            pnr: booking.pnr.clone(),
            payment_guid: booking.payment.payment_guid.clone(),
            amount: booking.total_amount(),
            paid: booking.payment.is_paid(),
        }
    }
}

impl From<&PnrGroup> for PaymentTarget {
    fn from(group: &PnrGroup) -> Self {
        Self {
            pnr: group.pnr.clone(),
            payment_guid: group
                .primary()
                .map(|ticket| ticket.booking.payment.payment_guid.clone())
                .unwrap_or_default(),
            amount: group.total_amount,
            paid: group.is_paid(),
        }
    }
}

/// Booking form submission
#[derive(Debug, Clone, Default)]
pub struct BookingFormState {
    /// Request in flight
    pub loading: bool,
    /// Last failure
    pub error: Option<ApiError>,
    /// Booking created by the last successful submission
    pub confirmation: Option<BookingConfirmation>,
}

/// Active payment options
#[derive(Debug, Clone, Default)]
pub struct PaymentOptionsState {
    /// Options on the current page
    pub options: Vec<PaymentOption>,
    /// Pagination of the current page
    pub pagination: Option<Pagination>,
    /// Request in flight
    pub loading: bool,
    /// Last failure
    pub error: Option<ApiError>,
    /// Sequence number of the latest request
    pub seq: u64,
}

/// Payment initiation
#[derive(Debug, Clone, Default)]
pub struct PaymentState {
    /// Option picked by the passenger
    pub selected_option: Option<String>,
    /// Request in flight
    pub loading: bool,
    /// Last failure
    pub error: Option<ApiError>,
    /// Gateway answer of the last successful initiation
    pub initiation: Option<PaymentInitiation>,
}

impl PaymentState {
    /// Gateway page to send the passenger to
    #[must_use]
    pub fn checkout_url(&self) -> Option<&str> {
        self.initiation.as_ref()?.checkout_url.as_deref()
    }
}

/// Everything the checkout views show
#[derive(Debug, Clone, Default)]
pub struct CheckoutState {
    /// Booking form
    pub booking: BookingFormState,
    /// Payment options
    pub options: PaymentOptionsState,
    /// Payment
    pub payment: PaymentState,
}
