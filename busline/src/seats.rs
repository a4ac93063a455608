//! Seat grid and seat selection rules.

use crate::error::ValidationError;
use crate::types::{BookingDetail, Seat, Trip};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRow {
    /// One-based row number
    pub row_number: u32,
    /// Seats ordered by column
    pub seats: Vec<Seat>,
}

/// Seats laid out as a grid
///
/// Rows ascend by `rowNumber`, seats within a row by `columnNumber`.
/// Missing positions are simply absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeatMap {
    /// Rows in ascending order
    pub rows: Vec<SeatRow>,
}

impl SeatMap {
    /// Lay out a sparse seat list
    #[must_use]
    pub fn from_seats(seats: &[Seat]) -> Self {
        let mut by_row: BTreeMap<u32, Vec<Seat>> = BTreeMap::new();
        for seat in seats {
            by_row.entry(seat.row_number).or_default().push(seat.clone());
        }

        let rows = by_row
            .into_iter()
            .map(|(row_number, mut seats)| {
                seats.sort_by_key(|seat| seat.column_number);
                SeatRow { row_number, seats }
            })
            .collect();

        Self { rows }
    }

    /// Lay out a trip's seat availability
    #[must_use]
    pub fn from_trip(trip: &Trip) -> Self {
        Self::from_seats(trip.seats())
    }

    /// Widest row, for rendering a fixed-width grid
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.rows
            .iter()
            .flat_map(|row| row.seats.iter().map(|seat| seat.column_number))
            .max()
            .unwrap_or(0)
    }

    /// Look up a seat by id
    #[must_use]
    pub fn seat(&self, trip_seat_guid: &str) -> Option<&Seat> {
        self.rows
            .iter()
            .flat_map(|row| row.seats.iter())
            .find(|seat| seat.trip_seat_guid == trip_seat_guid)
    }

    /// Seats still free
    #[must_use]
    pub fn available(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.seats.iter())
            .filter(|seat| seat.is_available())
            .count()
    }
}

/// Returns `true` if seats may be chosen for the booking at all
#[must_use]
pub fn selection_allowed(booking: &BookingDetail) -> bool {
    booking.is_paid()
}

/// Check that `trip_seat_guid` can be picked for `booking`
///
/// # Errors
///
/// - [`ValidationError::NoSeatSelected`] for a blank id
/// - [`ValidationError::NotPaid`] when the booking is unpaid
/// - [`ValidationError::SeatUnavailable`] when the seat is unknown or taken
pub fn check_selectable(
    booking: &BookingDetail,
    seat_map: Option<&Trip>,
    trip_seat_guid: &str,
) -> Result<(), ValidationError> {
    if trip_seat_guid.trim().is_empty() {
        return Err(ValidationError::NoSeatSelected);
    }
    if !selection_allowed(booking) {
        return Err(ValidationError::NotPaid);
    }

    let seat = seat_map
        .into_iter()
        .flat_map(Trip::seats)
        .find(|seat| seat.trip_seat_guid == trip_seat_guid);

    match seat {
        Some(seat) if seat.is_available() => Ok(()),
        _ => Err(ValidationError::SeatUnavailable(trip_seat_guid.to_string())),
    }
}

/// Pick the ticket a seat confirmation binds
///
/// Defaults to the booking's first ticket when none is named.
///
/// # Errors
///
/// - [`ValidationError::TicketNotInBooking`] for a foreign ticket id
/// - [`ValidationError::NoBookingLoaded`] for a booking without tickets
pub fn resolve_ticket(booking: &BookingDetail, ticket_guid: Option<&str>) -> Result<String, ValidationError> {
    match ticket_guid.map(str::trim).filter(|guid| !guid.is_empty()) {
        Some(guid) => booking
            .ticket(guid)
            .map(|ticket| ticket.ticket_guid.clone())
            .ok_or_else(|| ValidationError::TicketNotInBooking(guid.to_string())),
        None => booking
            .tickets
            .first()
            .map(|ticket| ticket.ticket_guid.clone())
            .ok_or(ValidationError::NoBookingLoaded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeatStatus;

    fn seat(guid: &str, row: u32, column: u32, available: bool) -> Seat {
        Seat {
            trip_seat_guid: guid.to_string(),
            row_number: row,
            column_number: column,
            seat_number: row * 10 + column,
            seat_type: None,
            status: if available {
                SeatStatus::Available
            } else {
                SeatStatus::Taken("Booked".to_string())
            },
        }
    }

    #[test]
    fn rows_and_columns_are_sorted() {
        let map = SeatMap::from_seats(&[
            seat("c", 2, 2, true),
            seat("a", 1, 3, true),
            seat("b", 1, 1, false),
            seat("d", 2, 1, true),
        ]);

        let layout: Vec<(u32, Vec<&str>)> = map
            .rows
            .iter()
            .map(|row| {
                (
                    row.row_number,
                    row.seats.iter().map(|s| s.trip_seat_guid.as_str()).collect(),
                )
            })
            .collect();

        assert_eq!(layout, vec![(1, vec!["b", "a"]), (2, vec!["d", "c"])]);
        assert_eq!(map.columns(), 3);
        assert_eq!(map.available(), 3);
        assert!(map.seat("b").is_some_and(|s| !s.is_available()));
        assert!(map.seat("zzz").is_none());
    }

    #[test]
    fn empty_seat_list_is_empty_grid() {
        let map = SeatMap::from_seats(&[]);
        assert!(map.rows.is_empty());
        assert_eq!(map.columns(), 0);
    }
}
