//! Booking and payment.
//!
//! The booking form issues tickets on a trip; payment settles a booking
//! through a gateway chosen from the active payment options. The amount is
//! always derived from the booking (seat price times ticket count), never
//! entered by the passenger.

pub mod actions;
pub mod reducer;
#[cfg(test)]
mod tests;
pub mod types;

pub use actions::CheckoutAction;
pub use reducer::CheckoutReducer;
pub use types::{CheckoutState, PaymentTarget};
