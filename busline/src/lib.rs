//! Busline - a bus ticket booking client
//!
//! Passengers search trips, book tickets, pay through a gateway, look up
//! bookings by PNR and pick seats once a booking is paid. Everything the
//! backend sends is decoded into typed contracts and checked before any
//! reducer sees it.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐
//!   actions ────► │   Auth   │ │ Tickets  │ │  Trips   │ │ Checkout │   reducers
//!                 └────┬─────┘ └────┬─────┘ └────┬─────┘ └────┬─────┘
//!                      └────────────┴─────┬──────┴────────────┘
//!                                         │ effects
//!                                         ▼
//!                              ┌────────────────────┐
//!                              │ ClientEnvironment  │
//!                              │ backend · session  │
//!                              │ clock · credentials│
//!                              └─────────┬──────────┘
//!                                        ▼
//!                          HttpBackend (reqwest) / MockBackend
//! ```
//!
//! Each feature runs in its own `busline_runtime::Store`. Features share
//! one [`session::Credentials`] slot, so a login in the auth store is seen by
//! the tickets and checkout stores.
//!
//! # Key Behaviors
//!
//! ## Payment countdown
//!
//! An unpaid booking can be paid for the carrier's `maxPaymentMinutes`
//! after it was made. [`countdown::derive`] computes what is left; the
//! tickets reducer recomputes it on a cancellable one-second tick that stops
//! when the booking is paid, the window closes, or the view goes away.
//!
//! ## Seat gate
//!
//! Seats can be picked only on paid bookings and only when free. A
//! confirmation issues one request; success refreshes booking and seat
//! inventory together, failure keeps the picked seat.
//!
//! ## Latest request wins
//!
//! Every list and detail slice numbers its requests. Responses from
//! superseded requests, or for a booking that is no longer on screen, are
//! dropped.

pub mod api;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod countdown;
pub mod display;
pub mod environment;
pub mod error;
pub mod grouping;
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;
pub mod seats;
pub mod session;
pub mod tickets;
pub mod trips;
pub mod types;

pub use api::{BackendApi, BookingQuery, HttpBackend};
pub use config::Config;
pub use environment::ClientEnvironment;
pub use error::{ApiError, ValidationError};
