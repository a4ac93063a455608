//! Presentation helpers shared by the CLI and any other front end.

use crate::countdown::Countdown;
use crate::types::{BookingDetail, Payment, TicketSummary};
use chrono::NaiveDate;

/// Parse a departure date as the backend formats it
///
/// Accepts `"Tuesday, October 28, 2025"`, `"October 28, 2025"` and ISO
/// `"2025-10-28"`. The weekday, when present, is ignored.
#[must_use]
pub fn parse_departure_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let parse = |text: &str| {
        NaiveDate::parse_from_str(text, "%B %d, %Y")
            .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
            .ok()
    };

    parse(raw).or_else(|| {
        raw.split_once(", ")
            .and_then(|(_weekday, rest)| parse(rest.trim()))
    })
}

/// Returns `true` if the pay-now action should be offered
///
/// The booking must be unpaid, depart today or later, and still be inside
/// its payment window when it has one. An unparseable departure date hides
/// the action.
#[must_use]
pub fn pay_now_available(
    payment: &Payment,
    departure_date: &str,
    countdown: Option<&Countdown>,
    today: NaiveDate,
) -> bool {
    !payment.is_paid()
        && countdown.map_or(true, Countdown::is_payable)
        && parse_departure_date(departure_date).is_some_and(|date| date >= today)
}

/// QR payload identifying a whole booking
#[must_use]
pub fn booking_qr_payload(booking: &BookingDetail) -> String {
    format!(
        "PNR:{}|BOOKING:{}|TRIP:{}|DATE:{}",
        booking.pnr, booking.booking_guid, booking.trip.code, booking.trip.departure_date
    )
}

/// QR payload for one passenger's ticket
#[must_use]
pub fn ticket_qr_payload(booking: &BookingDetail, ticket: &TicketSummary) -> String {
    format!(
        "PNR:{}|TICKET:{}|PASSENGER:{}|TRIP:{}|DATE:{}",
        booking.pnr,
        ticket.ticket_guid,
        ticket.full_name,
        booking.trip.code,
        booking.trip.departure_date
    )
}
