//! reqwest implementation of [`BackendApi`]

use super::envelope;
use super::{BackendApi, BookingQuery};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::types::{
    BookTicketsRequest, BookingConfirmation, BookingDetail, BookingSummary, LoginRequest, Page,
    PageRequest, Passenger, PaymentInitiation, PaymentOption, PaymentRequest, RegisterRequest,
    Trip, TripQuery,
};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

/// HTTP client for the booking backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the TLS backend cannot be initialised.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self::with_client(client, &config.base_url))
    }

    /// Create a backend over an existing client
    #[must_use]
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL every path is appended to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let result = envelope::into_data(status, &body);
        if let Err(error) = &result {
            tracing::debug!(status = status.as_u16(), %error, "Backend rejected request");
        }
        result
    }
}

impl BackendApi for HttpBackend {
    #[tracing::instrument(skip_all, fields(mobile = %request.mobile_number))]
    async fn login(&self, request: LoginRequest) -> Result<String, ApiError> {
        let data = self
            .execute(self.post("/auth/passenger/login").json(&request))
            .await?;
        envelope::field(&data, "token")
    }

    #[tracing::instrument(skip_all, fields(mobile = %request.mobile_number))]
    async fn register(&self, request: RegisterRequest) -> Result<Passenger, ApiError> {
        let data = self
            .execute(self.post("/auth/passenger/register").json(&request))
            .await?;
        envelope::field(&data, "passenger")
    }

    #[tracing::instrument(skip_all)]
    async fn profile(&self, token: &str) -> Result<Passenger, ApiError> {
        let data = self
            .execute(self.get("/passenger/profile/details").bearer_auth(token))
            .await?;
        envelope::field(&data, "passenger")
    }

    #[tracing::instrument(skip(self, token), fields(page = query.page.page))]
    async fn bookings(&self, token: &str, query: &BookingQuery) -> Result<Page<BookingSummary>, ApiError> {
        let mut params: Vec<(&str, String)> = query.page.query().into();
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            params.push(("status", status.to_string()));
        }
        if let Some(keyword) = query.keyword.as_deref().filter(|k| !k.is_empty()) {
            params.push(("searchKeyword", keyword.to_string()));
        }

        let data = self
            .execute(
                self.get("/passenger/trip/booking/list")
                    .query(&params)
                    .bearer_auth(token),
            )
            .await?;
        envelope::checked_page(&data, "bookings")
    }

    #[tracing::instrument(skip(self))]
    async fn search_bookings(&self, locator: &str, page: PageRequest) -> Result<Page<BookingSummary>, ApiError> {
        let mut params: Vec<(&str, String)> = page.query().into();
        params.push(("searchQuery", locator.to_string()));

        let data = self
            .execute(self.get("/public/trip/ticket/search").query(&params))
            .await?;
        envelope::checked_page(&data, "bookings")
    }

    #[tracing::instrument(skip(self, token))]
    async fn booking_detail(&self, token: &str, booking_guid: &str) -> Result<BookingDetail, ApiError> {
        let data = self
            .execute(
                self.get("/passenger/trip/booking/ticket/list")
                    .query(&[("id", booking_guid)])
                    .bearer_auth(token),
            )
            .await?;
        envelope::checked_field(&data, "booking")
    }

    #[tracing::instrument(skip(self, token))]
    async fn confirm_seat(&self, token: &str, ticket_guid: &str, trip_seat_guid: &str) -> Result<(), ApiError> {
        self.execute(
            self.post("/passenger/trip/ticket/seat/confirm")
                .bearer_auth(token)
                .json(&json!({ "ticketGuid": ticket_guid, "tripSeatGuid": trip_seat_guid })),
        )
        .await
        .map(|_| ())
    }

    #[tracing::instrument(skip_all, fields(trip = %request.trip_guid, passengers = request.tickets.len()))]
    async fn book_tickets(&self, token: &str, request: &BookTicketsRequest) -> Result<BookingConfirmation, ApiError> {
        let data = self
            .execute(
                self.post("/passenger/trip/ticket/book")
                    .bearer_auth(token)
                    .json(request),
            )
            .await?;
        envelope::checked_field(&data, "booking")
    }

    #[tracing::instrument(skip(self, token))]
    async fn payment_options(&self, token: &str, page: PageRequest) -> Result<Page<PaymentOption>, ApiError> {
        let mut params: Vec<(&str, String)> = page.query().into();
        params.push(("status", "Active".to_string()));

        let data = self
            .execute(
                self.get("/payment-option/list")
                    .query(&params)
                    .bearer_auth(token),
            )
            .await?;
        envelope::page(&data, "paymentOptions")
    }

    #[tracing::instrument(skip_all, fields(payment = %request.payment_guid, amount = %request.payment_amount))]
    async fn pay(&self, token: &str, request: &PaymentRequest) -> Result<PaymentInitiation, ApiError> {
        let data = self
            .execute(
                self.post("/passenger/ticket/payment/pay")
                    .bearer_auth(token)
                    .json(request),
            )
            .await?;
        Ok(PaymentInitiation::from_data(data))
    }

    #[tracing::instrument(skip(self))]
    async fn search_trips(&self, query: &TripQuery, page: PageRequest) -> Result<Page<Trip>, ApiError> {
        let mut params = vec![
            ("originGuid", query.origin_guid.clone()),
            ("destinationGuid", query.destination_guid.clone()),
            ("travelDate", query.travel_date.clone()),
        ];
        params.extend(page.query());
        if let Some(carrier) = query.bus_carrier_guid.as_deref().filter(|c| !c.is_empty()) {
            params.push(("busCarrierGuid", carrier.to_string()));
        }

        match self
            .execute(self.get("/public/trip/search").query(&params))
            .await
        {
            Ok(data) => envelope::checked_page(&data, "trips"),
            Err(ApiError::Backend { status: 404, .. }) => {
                tracing::debug!("No trips found");
                Ok(Page::empty())
            },
            Err(error) => Err(error),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn trip_detail(&self, trip_guid: &str) -> Result<Trip, ApiError> {
        let data = self
            .execute(self.get("/public/trip/details").query(&[("id", trip_guid)]))
            .await?;
        envelope::checked_field(&data, "trip")
    }
}
