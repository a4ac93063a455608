//! Backend API.
//!
//! [`BackendApi`] has one method per REST endpoint. Reducers depend on the
//! trait; the binary plugs in [`HttpBackend`] and tests plug in
//! `mocks::MockBackend`.
//!
//! Endpoints marked bearer take the token explicitly. The token lives in
//! [`crate::session::Credentials`] and is read by the reducer when it builds
//! the request effect.

use crate::error::ApiError;
use crate::types::{
    BookTicketsRequest, BookingConfirmation, BookingDetail, BookingSummary, LoginRequest, Page,
    PageRequest, Passenger, PaymentInitiation, PaymentOption, PaymentRequest, RegisterRequest,
    Trip, TripQuery,
};
use serde::{Deserialize, Serialize};
use std::future::Future;

pub mod envelope;
pub mod http;

pub use http::HttpBackend;

/// Filters for the my-bookings list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingQuery {
    /// Page to fetch
    pub page: PageRequest,
    /// Backend status filter; `None` lists every status
    pub status: Option<String>,
    /// Free-text keyword
    pub keyword: Option<String>,
}

impl BookingQuery {
    /// First page, no filters
    #[must_use]
    pub fn first(page_size: u32) -> Self {
        Self {
            page: PageRequest::first(page_size),
            status: None,
            keyword: None,
        }
    }
}

/// The booking backend
///
/// # Errors
///
/// Every method fails with [`ApiError`]: `Network` when no response arrived,
/// `Unauthenticated` for 401/403, `Backend` for other non-2xx answers and
/// `Decode` when the payload breaks the contract.
pub trait BackendApi: Clone + Send + Sync + 'static {
    /// `POST /auth/passenger/login`, returns the bearer token
    fn login(&self, request: LoginRequest) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// `POST /auth/passenger/register`
    fn register(
        &self,
        request: RegisterRequest,
    ) -> impl Future<Output = Result<Passenger, ApiError>> + Send;

    /// `GET /passenger/profile/details` (bearer)
    fn profile(&self, token: &str) -> impl Future<Output = Result<Passenger, ApiError>> + Send;

    /// `GET /passenger/trip/booking/list` (bearer)
    fn bookings(
        &self,
        token: &str,
        query: &BookingQuery,
    ) -> impl Future<Output = Result<Page<BookingSummary>, ApiError>> + Send;

    /// `GET /public/trip/ticket/search`
    fn search_bookings(
        &self,
        locator: &str,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<BookingSummary>, ApiError>> + Send;

    /// `GET /passenger/trip/booking/ticket/list?id=` (bearer)
    fn booking_detail(
        &self,
        token: &str,
        booking_guid: &str,
    ) -> impl Future<Output = Result<BookingDetail, ApiError>> + Send;

    /// `POST /passenger/trip/ticket/seat/confirm` (bearer)
    fn confirm_seat(
        &self,
        token: &str,
        ticket_guid: &str,
        trip_seat_guid: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `POST /passenger/trip/ticket/book` (bearer)
    fn book_tickets(
        &self,
        token: &str,
        request: &BookTicketsRequest,
    ) -> impl Future<Output = Result<BookingConfirmation, ApiError>> + Send;

    /// `GET /payment-option/list?status=Active` (bearer)
    fn payment_options(
        &self,
        token: &str,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<PaymentOption>, ApiError>> + Send;

    /// `POST /passenger/ticket/payment/pay` (bearer)
    fn pay(
        &self,
        token: &str,
        request: &PaymentRequest,
    ) -> impl Future<Output = Result<PaymentInitiation, ApiError>> + Send;

    /// `GET /public/trip/search`; a 404 is an empty page
    fn search_trips(
        &self,
        query: &TripQuery,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Trip>, ApiError>> + Send;

    /// `GET /public/trip/details?id=`
    fn trip_detail(&self, trip_guid: &str) -> impl Future<Output = Result<Trip, ApiError>> + Send;
}
