//! Trips, carriers and seats

use super::{count, Validate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A scheduled departure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    /// Backend id
    pub trip_guid: String,
    /// Short trip code printed on tickets
    #[serde(default)]
    pub code: String,
    /// Currency the price is quoted in
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Price of one seat
    pub travel_price: Decimal,
    /// Departure date as sent by the backend, e.g. `"Tuesday, October 28, 2025"`
    pub departure_date: String,
    /// Departure time as sent by the backend
    #[serde(default)]
    pub departure_time: String,
    /// Operating carrier with its policy settings
    #[serde(default)]
    pub bus_carrier: Option<BusCarrier>,
    /// Origin, destination and drops
    #[serde(default)]
    pub trip_route: Option<TripRoute>,
    /// Vehicle
    #[serde(default)]
    pub bus: Option<Bus>,
    /// Seat inventory; only trip detail responses carry it
    #[serde(default)]
    pub seat_availability: Option<SeatAvailability>,
}

impl Trip {
    /// The carrier's payment window, if the response carried the carrier settings
    #[must_use]
    pub fn max_payment_minutes(&self) -> Option<u32> {
        self.bus_carrier
            .as_ref()?
            .setting
            .as_ref()?
            .finance
            .as_ref()
            .map(|finance| finance.max_payment_minutes)
    }

    /// The carrier's per-user ticket limit, if set
    #[must_use]
    pub fn max_tickets_per_user(&self) -> Option<u32> {
        self.bus_carrier
            .as_ref()?
            .setting
            .as_ref()?
            .trip_and_ticket
            .as_ref()
            .map(|limits| limits.max_tickets_per_user)
            .filter(|max| *max > 0)
    }

    /// Seats from the availability summary, empty if none was sent
    #[must_use]
    pub fn seats(&self) -> &[Seat] {
        self.seat_availability
            .as_ref()
            .map_or(&[], |availability| availability.seats.as_slice())
    }

    /// "Origin → Destination" when the route is known
    #[must_use]
    pub fn route_label(&self) -> Option<String> {
        self.trip_route
            .as_ref()
            .map(|route| format!("{} → {}", route.origin.name, route.destination.name))
    }
}

impl Validate for Trip {
    fn validate(&self) -> Result<(), String> {
        if self.trip_guid.trim().is_empty() {
            return Err("trip without tripGuid".to_string());
        }
        if self.travel_price.is_sign_negative() {
            return Err(format!("trip {} has a negative price", self.trip_guid));
        }
        self.seats().iter().try_for_each(Validate::validate)
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Currency {
    #[serde(default)]
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub symbol: String,
}

/// Bus operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusCarrier {
    /// Backend id, absent on embedded carriers
    #[serde(default)]
    pub bus_carrier_guid: Option<String>,
    /// Name shown to passengers
    pub display_name: String,
    /// Logo location
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Policy settings
    #[serde(default)]
    pub setting: Option<CarrierSetting>,
}

/// Carrier-configured policy bag
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierSetting {
    /// Currency the carrier sells in
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Payment and cancellation policy
    #[serde(default)]
    pub finance: Option<Finance>,
    /// Booking limits
    #[serde(default)]
    pub trip_and_ticket: Option<TripAndTicket>,
}

/// Payment and cancellation policy
///
/// Only `max_payment_minutes` drives behavior; the rest is display data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finance {
    /// Minutes after booking during which an unpaid booking can be paid.
    /// Negative values fail to decode.
    pub max_payment_minutes: u32,
    #[serde(default)]
    #[allow(missing_docs)]
    pub allow_refunds: bool,
    #[serde(default)]
    #[allow(missing_docs)]
    pub allow_ticket_cancellation: bool,
    #[serde(default)]
    #[allow(missing_docs)]
    pub allow_cancellation_after_payment: bool,
    #[serde(default)]
    #[allow(missing_docs)]
    pub refund_window_hours: u32,
    #[serde(default)]
    #[allow(missing_docs)]
    pub free_cancellation_minutes: u32,
    #[serde(default)]
    #[allow(missing_docs)]
    pub cancellation_fee_percent: Decimal,
    #[serde(default)]
    #[allow(missing_docs)]
    pub last_cancellation_hours: u32,
}

/// Booking limits
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripAndTicket {
    /// Maximum tickets per booking request; 0 means no limit
    #[serde(default)]
    pub max_tickets_per_user: u32,
    /// Carrier assigns seats itself
    #[serde(default)]
    pub enable_auto_seat_assignment: bool,
    /// How far ahead trips can be booked
    #[serde(default)]
    pub advance_booking_days: u32,
}

/// Origin, destination and intermediate drops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRoute {
    /// Departure station
    pub origin: Station,
    /// Arrival station
    pub destination: Station,
    /// Human-readable duration, e.g. `"9h 30m"`
    #[serde(default)]
    pub estimated_travel_time: String,
    /// Intermediate drop-off stations
    #[serde(default)]
    pub drops: Vec<DropPoint>,
}

/// Drop-off point on a route
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPoint {
    pub station: Station,
}

/// Bus station
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub region: Option<Named>,
    #[serde(default)]
    pub city: Option<Named>,
}

/// `{ "name": ... }` wrapper used for regions and cities
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Named {
    pub name: String,
}

/// Vehicle
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bus {
    pub plate_number: String,
    #[serde(default)]
    pub amenities: Amenities,
}

/// On-board amenities
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amenities {
    #[serde(default)]
    pub has_wifi: bool,
    #[serde(default, rename = "hasAC")]
    pub has_ac: bool,
    #[serde(default)]
    pub has_restroom: bool,
    #[serde(default)]
    pub has_refreshment: bool,
}

/// Seat inventory for one trip
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAvailability {
    /// Every seat slot on the bus
    #[serde(default)]
    pub seats: Vec<Seat>,
    /// Seats already claimed
    #[serde(default, deserialize_with = "count::deserialize_opt")]
    pub booked_seats: Option<u32>,
    /// Seats still free
    #[serde(default, deserialize_with = "count::deserialize_opt")]
    pub available_seats: Option<u32>,
}

/// One physical seat slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    /// Id used when confirming the seat
    pub trip_seat_guid: String,
    /// One-based grid row
    pub row_number: u32,
    /// One-based grid column
    pub column_number: u32,
    /// Number painted on the seat
    pub seat_number: u32,
    /// Window, aisle, ...
    #[serde(default)]
    pub seat_type: Option<String>,
    /// Availability
    pub status: SeatStatus,
}

impl Seat {
    /// Returns `true` if the seat can still be chosen
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.status, SeatStatus::Available)
    }
}

impl Validate for Seat {
    fn validate(&self) -> Result<(), String> {
        if self.row_number < 1 || self.column_number < 1 {
            return Err(format!(
                "seat {} has position {}x{}; rows and columns start at 1",
                self.trip_seat_guid, self.row_number, self.column_number
            ));
        }
        Ok(())
    }
}

/// Seat availability as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SeatStatus {
    /// Free to choose
    Available,
    /// Any other backend status (booked, reserved, blocked, ...)
    Taken(String),
}

impl From<String> for SeatStatus {
    fn from(status: String) -> Self {
        if status.eq_ignore_ascii_case("available") {
            Self::Available
        } else {
            Self::Taken(status)
        }
    }
}

impl From<SeatStatus> for String {
    fn from(status: SeatStatus) -> Self {
        match status {
            SeatStatus::Available => "Available".to_string(),
            SeatStatus::Taken(status) => status,
        }
    }
}

/// Trip search parameters for `GET /public/trip/search`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripQuery {
    /// Origin station/city id
    pub origin_guid: String,
    /// Destination station/city id
    pub destination_guid: String,
    /// Travel date, `YYYY-MM-DD`
    pub travel_date: String,
    /// Restrict to one carrier
    pub bus_carrier_guid: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn seat_json(row: i64, column: i64) -> serde_json::Value {
        serde_json::json!({
            "tripSeatGuid": "s-1",
            "rowNumber": row,
            "columnNumber": column,
            "seatNumber": 1,
            "status": "Available"
        })
    }

    #[test]
    fn seat_rows_and_columns_start_at_one() {
        let seat: Seat = serde_json::from_value(seat_json(1, 1)).unwrap();
        assert!(seat.validate().is_ok());

        let seat: Seat = serde_json::from_value(seat_json(0, 2)).unwrap();
        assert!(seat.validate().is_err());

        assert!(serde_json::from_value::<Seat>(seat_json(-1, 2)).is_err());
    }

    #[test]
    fn seat_status_keeps_taken_variant_text() {
        let mut json = seat_json(1, 1);
        json["status"] = serde_json::json!("Booked");
        let seat: Seat = serde_json::from_value(json).unwrap();
        assert_eq!(seat.status, SeatStatus::Taken("Booked".to_string()));
        assert!(!seat.is_available());
    }

    #[test]
    fn negative_payment_window_is_rejected() {
        let result = serde_json::from_value::<Finance>(serde_json::json!({
            "maxPaymentMinutes": -5
        }));
        assert!(result.is_err());
    }

    #[test]
    fn seat_counts_accept_numbers_and_strings() {
        let availability: SeatAvailability = serde_json::from_value(serde_json::json!({
            "seats": [],
            "bookedSeats": "12",
            "availableSeats": 37
        }))
        .unwrap();
        assert_eq!(availability.booked_seats, Some(12));
        assert_eq!(availability.available_seats, Some(37));
    }
}
