//! Trip search and trip detail.
//!
//! Both endpoints are public. A search the backend answers with 404 shows
//! as an empty result.

pub mod actions;
pub mod reducer;
#[cfg(test)]
mod tests;
pub mod types;

pub use actions::TripAction;
pub use reducer::TripReducer;
pub use types::TripState;
