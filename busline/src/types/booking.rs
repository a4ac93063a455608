//! Bookings, tickets and payments

use super::{timestamp, Trip, Validate};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment attached to a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Id used to initiate the payment
    pub payment_guid: String,
    /// Billing reference printed as the ticket barcode
    #[serde(default)]
    pub billing_id: String,
    /// Free-text status; only `paid` (any case) has meaning here
    pub status: String,
}

impl Payment {
    /// Returns `true` if the status is `paid`, ignoring case
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("paid")
    }
}

/// One passenger's ticket inside a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    /// Id used when confirming a seat
    pub ticket_guid: String,
    /// Passenger name; list responses call this `name`
    #[serde(alias = "name")]
    pub full_name: String,
    #[serde(default)]
    #[allow(missing_docs)]
    pub phone_number: String,
    #[serde(default)]
    #[allow(missing_docs)]
    pub email: String,
    #[serde(default)]
    #[allow(missing_docs)]
    pub ticket_number: String,
    /// Ticket status, e.g. `CONFIRMED`
    #[serde(default)]
    pub status: String,
}

/// Booking as returned by the list and PNR search endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    /// Backend id; legacy ticket payloads omit it
    #[serde(default)]
    pub booking_guid: Option<String>,
    /// Locator code
    pub pnr: String,
    /// Opaque backend status (`BOOKED`, `EXPIRED`, ...)
    #[serde(default)]
    pub status: String,
    /// When the booking was created
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_opt",
        serialize_with = "timestamp::serialize_opt"
    )]
    pub booking_date: Option<DateTime<Utc>>,
    /// Payment state
    pub payment: Payment,
    /// Trip booked
    pub trip: Trip,
    /// One entry per passenger
    #[serde(default)]
    pub tickets: Vec<TicketSummary>,
}

impl BookingSummary {
    /// Total due: seat price times passenger count
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.trip.travel_price * Decimal::from(self.tickets.len())
    }
}

impl Validate for BookingSummary {
    fn validate(&self) -> Result<(), String> {
        if self.pnr.trim().is_empty() {
            return Err("booking without pnr".to_string());
        }
        self.trip.validate()
    }
}

/// Full booking as returned by the detail endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    /// Backend id
    pub booking_guid: String,
    /// Locator code
    pub pnr: String,
    /// Opaque backend status
    #[serde(default)]
    pub status: String,
    /// When the booking was created; drives the payment countdown
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_opt",
        serialize_with = "timestamp::serialize_opt"
    )]
    pub booking_date: Option<DateTime<Utc>>,
    /// Last backend change
    #[serde(default)]
    pub last_modified: Option<String>,
    /// Payment state
    pub payment: Payment,
    /// Trip booked
    pub trip: Trip,
    /// One entry per passenger, never empty
    pub tickets: Vec<TicketSummary>,
}

impl BookingDetail {
    /// Returns `true` if the booking's payment is settled
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment.is_paid()
    }

    /// Look up one of this booking's tickets
    #[must_use]
    pub fn ticket(&self, ticket_guid: &str) -> Option<&TicketSummary> {
        self.tickets.iter().find(|t| t.ticket_guid == ticket_guid)
    }

    /// Total due: seat price times passenger count
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.trip.travel_price * Decimal::from(self.tickets.len())
    }
}

impl Validate for BookingDetail {
    fn validate(&self) -> Result<(), String> {
        if self.tickets.is_empty() {
            return Err(format!("booking {} has no tickets", self.booking_guid));
        }
        self.trip.validate()
    }
}

/// Ticket in the older ticket-centric list shape
///
/// Each ticket embeds its booking; several tickets share one PNR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTicket {
    #[allow(missing_docs)]
    pub ticket_guid: String,
    #[allow(missing_docs)]
    pub full_name: String,
    #[serde(default)]
    #[allow(missing_docs)]
    pub phone_number: String,
    #[serde(default)]
    #[allow(missing_docs)]
    pub email: String,
    #[serde(default)]
    #[allow(missing_docs)]
    pub ticket_number: String,
    #[serde(default)]
    #[allow(missing_docs)]
    pub status: String,
    /// The booking this ticket belongs to
    pub booking: BookingSummary,
}

/// One passenger on the booking form
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct PassengerForm {
    pub first_name: String,
    pub last_name: String,
    pub country_code: String,
    pub mobile_number: String,
    #[serde(default)]
    pub email: String,
}

/// Body of `POST /passenger/trip/ticket/book`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookTicketsRequest {
    /// Trip to book on
    pub trip_guid: String,
    /// One entry per passenger
    pub tickets: Vec<PassengerForm>,
}

/// Payment reference returned with a new booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRef {
    /// Id to pass to the pay endpoint
    pub payment_guid: String,
}

/// Booking created by `POST /passenger/trip/ticket/book`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    /// New booking id
    pub booking_guid: String,
    /// Locator code
    pub pnr: String,
    /// Payment to settle
    pub payment: PaymentRef,
    /// Issued tickets
    #[serde(default)]
    pub tickets: Vec<TicketSummary>,
}

impl Validate for BookingConfirmation {
    fn validate(&self) -> Result<(), String> {
        if self.pnr.trim().is_empty() {
            return Err(format!("booking {} has no pnr", self.booking_guid));
        }
        Ok(())
    }
}
