//! My tickets.
//!
//! Booking list, public PNR search, booking detail with seat selection, and
//! the payment countdown of an unpaid booking.
//!
//! # Booking detail flow
//!
//! ```text
//! ViewEntered(BookingDetail) ──► booking_detail ──► DetailLoaded ──► trip_detail ──► SeatMapLoaded
//!                                                        │
//!                                                        └──► CountdownTick ──► CountdownTick ──► ...
//!                                                             (unpaid only; cancelled on exit or payment)
//!
//! ConfirmSeat ──► confirm_seat ──► SeatConfirmed ──► booking_detail ║ trip_detail
//! ```

pub mod actions;
pub mod reducer;
pub mod types;

pub use actions::TicketAction;
pub use reducer::TicketReducer;
pub use types::{SeatError, TicketState, View, COUNTDOWN_EFFECT};
