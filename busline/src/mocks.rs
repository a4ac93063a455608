//! In-memory backend for tests and offline demos.
//!
//! [`MockBackend`] keeps scripted data behind a mutex, records every call,
//! and can be told to fail or stall individual endpoints. Clones share
//! state, so a test keeps one handle and passes another into the
//! environment.

use crate::api::{BackendApi, BookingQuery};
use crate::error::ApiError;
use crate::types::{
    BookTicketsRequest, BookingConfirmation, BookingDetail, BookingSummary, LoginRequest, Page,
    PageRequest, Pagination, Passenger, Payment, PaymentInitiation, PaymentOption, PaymentRef,
    PaymentRequest, RegisterRequest, SeatStatus, TicketSummary, Trip, TripQuery,
};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Backend endpoints, for call counting and failure injection
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Register,
    Profile,
    Bookings,
    SearchBookings,
    BookingDetail,
    ConfirmSeat,
    BookTickets,
    PaymentOptions,
    Pay,
    SearchTrips,
    TripDetail,
}

#[derive(Debug, Default)]
struct MockData {
    token: String,
    accounts: HashMap<String, String>,
    passenger: Option<Passenger>,
    bookings: Vec<BookingSummary>,
    details: HashMap<String, BookingDetail>,
    trips: HashMap<String, Trip>,
    search_results: Vec<Trip>,
    payment_options: Vec<PaymentOption>,
    checkout_url: Option<String>,
    failures: HashMap<Endpoint, VecDeque<ApiError>>,
    latency: HashMap<Endpoint, Duration>,
    calls: Vec<(Endpoint, String)>,
    issued: u32,
}

/// Scriptable in-memory [`BackendApi`]
#[derive(Debug, Clone)]
pub struct MockBackend {
    data: Arc<Mutex<MockData>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Empty backend accepting the token `mock-token`
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(MockData {
                token: "mock-token".to_string(),
                ..MockData::default()
            })),
        }
    }

    fn with_data<T>(&self, f: impl FnOnce(&mut MockData) -> T) -> T {
        let mut data = match self.data.lock() {
            Ok(data) => data,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut data)
    }

    /// Register a login and the profile it resolves to
    #[must_use]
    pub fn with_account(self, password: &str, passenger: Passenger) -> Self {
        self.with_data(|data| {
            data.accounts
                .insert(passenger.mobile_number.clone(), password.to_string());
            data.passenger = Some(passenger);
        });
        self
    }

    /// Token handed out by login and required by bearer endpoints
    #[must_use]
    pub fn with_token(self, token: &str) -> Self {
        self.with_data(|data| data.token = token.to_string());
        self
    }

    /// Add a booking to the list and PNR search endpoints
    #[must_use]
    pub fn with_booking(self, booking: BookingSummary) -> Self {
        self.with_data(|data| data.bookings.push(booking));
        self
    }

    /// Serve `detail` from the detail endpoint
    #[must_use]
    pub fn with_detail(self, detail: BookingDetail) -> Self {
        self.with_data(|data| {
            data.details.insert(detail.booking_guid.clone(), detail);
        });
        self
    }

    /// Serve `trip` from the trip detail endpoint and use its seats for confirmation
    #[must_use]
    pub fn with_trip(self, trip: Trip) -> Self {
        self.with_data(|data| {
            data.trips.insert(trip.trip_guid.clone(), trip);
        });
        self
    }

    /// Trips returned by every trip search; none behaves like a 404
    #[must_use]
    pub fn with_search_results(self, trips: Vec<Trip>) -> Self {
        self.with_data(|data| data.search_results = trips);
        self
    }

    /// Payment options returned by the options endpoint
    #[must_use]
    pub fn with_payment_options(self, options: Vec<PaymentOption>) -> Self {
        self.with_data(|data| data.payment_options = options);
        self
    }

    /// Checkout URL returned by the pay endpoint
    #[must_use]
    pub fn with_checkout_url(self, url: &str) -> Self {
        self.with_data(|data| data.checkout_url = Some(url.to_string()));
        self
    }

    /// Delay every response from `endpoint`
    #[must_use]
    pub fn with_latency(self, endpoint: Endpoint, latency: Duration) -> Self {
        self.with_data(|data| {
            data.latency.insert(endpoint, latency);
        });
        self
    }

    /// Make the next call to `endpoint` fail with `error`
    pub fn fail_next(&self, endpoint: Endpoint, error: ApiError) {
        self.with_data(|data| data.failures.entry(endpoint).or_default().push_back(error));
    }

    /// Change a booking's payment status, as the gateway callback would
    pub fn set_payment_status(&self, booking_guid: &str, status: &str) {
        self.with_data(|data| {
            if let Some(detail) = data.details.get_mut(booking_guid) {
                detail.payment.status = status.to_string();
            }
            for booking in &mut data.bookings {
                if booking.booking_guid.as_deref() == Some(booking_guid) {
                    booking.payment.status = status.to_string();
                }
            }
        });
    }

    /// Number of calls made to `endpoint`
    #[must_use]
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.with_data(|data| data.calls.iter().filter(|(e, _)| *e == endpoint).count())
    }

    /// Total calls across endpoints
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.with_data(|data| data.calls.len())
    }

    /// Calls in order, with a short description of each request
    #[must_use]
    pub fn call_log(&self) -> Vec<(Endpoint, String)> {
        self.with_data(|data| data.calls.clone())
    }

    /// Current copy of a trip, including seat changes from confirmations
    #[must_use]
    pub fn trip(&self, trip_guid: &str) -> Option<Trip> {
        self.with_data(|data| data.trips.get(trip_guid).cloned())
    }

    async fn enter(&self, endpoint: Endpoint, request: String) -> Result<(), ApiError> {
        let (latency, failure) = self.with_data(|data| {
            data.calls.push((endpoint, request));
            (
                data.latency.get(&endpoint).copied(),
                data.failures.get_mut(&endpoint).and_then(VecDeque::pop_front),
            )
        });

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        failure.map_or(Ok(()), Err)
    }

    fn authorize(&self, token: &str) -> Result<(), ApiError> {
        self.with_data(|data| {
            if token == data.token {
                Ok(())
            } else {
                Err(ApiError::Unauthenticated)
            }
        })
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Backend {
        status: 404,
        message: format!("{what} not found"),
    }
}

fn paginate<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
    let size = page.page_size as usize;
    let start = (page.page as usize - 1) * size;
    let total = items.len();

    Page {
        items: items.iter().skip(start).take(size).cloned().collect(),
        pagination: Some(Pagination {
            current_page: page.page,
            item_page_size: page.page_size,
            total_records: total as u64,
            total_pages: u32::try_from(total.div_ceil(size)).unwrap_or(u32::MAX),
        }),
    }
}

impl BackendApi for MockBackend {
    async fn login(&self, request: LoginRequest) -> Result<String, ApiError> {
        self.enter(Endpoint::Login, request.mobile_number.clone()).await?;
        self.with_data(|data| {
            match data.accounts.get(&request.mobile_number) {
                Some(password) if *password == request.password => Ok(data.token.clone()),
                _ => Err(ApiError::Backend {
                    status: 400,
                    message: "Invalid mobile number or password".to_string(),
                }),
            }
        })
    }

    async fn register(&self, request: RegisterRequest) -> Result<Passenger, ApiError> {
        self.enter(Endpoint::Register, request.mobile_number.clone()).await?;
        self.with_data(|data| {
            if data.accounts.contains_key(&request.mobile_number) {
                return Err(ApiError::Backend {
                    status: 409,
                    message: "Mobile number already registered".to_string(),
                });
            }
            data.issued += 1;
            data.accounts
                .insert(request.mobile_number.clone(), request.password.clone());
            Ok(Passenger {
                passenger_guid: format!("passenger-{}", data.issued),
                first_name: request.first_name,
                last_name: request.last_name,
                gender: request.gender,
                country_code: request.country_code,
                mobile_number: request.mobile_number,
                email: request.email,
                status: "Active".to_string(),
                last_modified: None,
            })
        })
    }

    async fn profile(&self, token: &str) -> Result<Passenger, ApiError> {
        self.enter(Endpoint::Profile, String::new()).await?;
        self.authorize(token)?;
        self.with_data(|data| data.passenger.clone().ok_or_else(|| not_found("Passenger")))
    }

    async fn bookings(&self, token: &str, query: &BookingQuery) -> Result<Page<BookingSummary>, ApiError> {
        self.enter(Endpoint::Bookings, format!("page={}", query.page.page)).await?;
        self.authorize(token)?;
        self.with_data(|data| {
            let matching: Vec<BookingSummary> = data
                .bookings
                .iter()
                .filter(|b| {
                    query
                        .status
                        .as_deref()
                        .is_none_or(|status| b.status.eq_ignore_ascii_case(status))
                })
                .filter(|b| {
                    query
                        .keyword
                        .as_deref()
                        .is_none_or(|keyword| b.pnr.to_lowercase().contains(&keyword.to_lowercase()))
                })
                .cloned()
                .collect();
            Ok(paginate(&matching, query.page))
        })
    }

    async fn search_bookings(&self, locator: &str, page: PageRequest) -> Result<Page<BookingSummary>, ApiError> {
        self.enter(Endpoint::SearchBookings, locator.to_string()).await?;
        self.with_data(|data| {
            let needle = locator.to_lowercase();
            let matching: Vec<BookingSummary> = data
                .bookings
                .iter()
                .filter(|b| b.pnr.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            Ok(paginate(&matching, page))
        })
    }

    async fn booking_detail(&self, token: &str, booking_guid: &str) -> Result<BookingDetail, ApiError> {
        self.enter(Endpoint::BookingDetail, booking_guid.to_string()).await?;
        self.authorize(token)?;
        self.with_data(|data| {
            data.details
                .get(booking_guid)
                .cloned()
                .ok_or_else(|| not_found("Booking"))
        })
    }

    async fn confirm_seat(&self, token: &str, ticket_guid: &str, trip_seat_guid: &str) -> Result<(), ApiError> {
        self.enter(Endpoint::ConfirmSeat, format!("{ticket_guid}:{trip_seat_guid}"))
            .await?;
        self.authorize(token)?;
        self.with_data(|data| {
            let trip_guid = data
                .details
                .values()
                .find(|d| d.ticket(ticket_guid).is_some())
                .map(|d| d.trip.trip_guid.clone())
                .ok_or_else(|| not_found("Ticket"))?;

            let seat = data
                .trips
                .get_mut(&trip_guid)
                .and_then(|trip| trip.seat_availability.as_mut())
                .and_then(|availability| {
                    availability
                        .seats
                        .iter_mut()
                        .find(|seat| seat.trip_seat_guid == trip_seat_guid)
                })
                .ok_or_else(|| not_found("Seat"))?;

            if !seat.is_available() {
                return Err(ApiError::Backend {
                    status: 409,
                    message: "Seat already taken".to_string(),
                });
            }
            seat.status = SeatStatus::Taken("Booked".to_string());
            Ok(())
        })
    }

    async fn book_tickets(&self, token: &str, request: &BookTicketsRequest) -> Result<BookingConfirmation, ApiError> {
        self.enter(Endpoint::BookTickets, request.trip_guid.clone()).await?;
        self.authorize(token)?;
        self.with_data(|data| {
            let trip = data
                .trips
                .get(&request.trip_guid)
                .or_else(|| data.search_results.iter().find(|t| t.trip_guid == request.trip_guid))
                .cloned()
                .ok_or_else(|| not_found("Trip"))?;

            data.issued += 1;
            let n = data.issued;
            let tickets: Vec<TicketSummary> = request
                .tickets
                .iter()
                .enumerate()
                .map(|(i, form)| TicketSummary {
                    ticket_guid: format!("ticket-{n}-{}", i + 1),
                    full_name: format!("{} {}", form.first_name, form.last_name),
                    phone_number: format!("{}{}", form.country_code, form.mobile_number),
                    email: form.email.clone(),
                    ticket_number: format!("T{n:04}{}", i + 1),
                    status: "PENDING".to_string(),
                })
                .collect();

            let booking_guid = format!("booking-{n}");
            let pnr = format!("PNR{n:04}");
            let payment = Payment {
                payment_guid: format!("payment-{n}"),
                billing_id: format!("BILL-{n:04}"),
                status: "PENDING".to_string(),
            };

            data.details.insert(
                booking_guid.clone(),
                BookingDetail {
                    booking_guid: booking_guid.clone(),
                    pnr: pnr.clone(),
                    status: "BOOKED".to_string(),
                    booking_date: Some(chrono::Utc::now()),
                    last_modified: None,
                    payment: payment.clone(),
                    trip: trip.clone(),
                    tickets: tickets.clone(),
                },
            );
            data.bookings.push(BookingSummary {
                booking_guid: Some(booking_guid.clone()),
                pnr: pnr.clone(),
                status: "BOOKED".to_string(),
                booking_date: Some(chrono::Utc::now()),
                payment: payment.clone(),
                trip,
                tickets: tickets.clone(),
            });

            Ok(BookingConfirmation {
                booking_guid,
                pnr,
                payment: PaymentRef {
                    payment_guid: payment.payment_guid,
                },
                tickets,
            })
        })
    }

    async fn payment_options(&self, token: &str, page: PageRequest) -> Result<Page<PaymentOption>, ApiError> {
        self.enter(Endpoint::PaymentOptions, format!("page={}", page.page)).await?;
        self.authorize(token)?;
        self.with_data(|data| Ok(paginate(&data.payment_options, page)))
    }

    async fn pay(&self, token: &str, request: &PaymentRequest) -> Result<PaymentInitiation, ApiError> {
        self.enter(
            Endpoint::Pay,
            format!("{}:{}", request.payment_guid, request.payment_amount),
        )
        .await?;
        self.authorize(token)?;
        self.with_data(|data| {
            let known = data
                .details
                .values()
                .map(|d| &d.payment)
                .chain(data.bookings.iter().map(|b| &b.payment))
                .any(|p| p.payment_guid == request.payment_guid);
            if !known {
                return Err(not_found("Payment"));
            }

            let raw = match &data.checkout_url {
                Some(url) => json!({ "checkoutUrl": url, "paymentGuid": request.payment_guid }),
                None => json!({ "status": "initiated", "paymentGuid": request.payment_guid }),
            };
            Ok(PaymentInitiation::from_data(raw))
        })
    }

    async fn search_trips(&self, query: &TripQuery, page: PageRequest) -> Result<Page<Trip>, ApiError> {
        self.enter(
            Endpoint::SearchTrips,
            format!("{}->{}@{}", query.origin_guid, query.destination_guid, query.travel_date),
        )
        .await?;
        self.with_data(|data| {
            if data.search_results.is_empty() {
                Ok(Page::empty())
            } else {
                Ok(paginate(&data.search_results, page))
            }
        })
    }

    async fn trip_detail(&self, trip_guid: &str) -> Result<Trip, ApiError> {
        self.enter(Endpoint::TripDetail, trip_guid.to_string()).await?;
        self.with_data(|data| data.trips.get(trip_guid).cloned().ok_or_else(|| not_found("Trip")))
    }
}

/// Ready-made payloads for tests
pub mod fixtures {
    use crate::types::{
        BookingDetail, BookingSummary, BusCarrier, CarrierSetting, Finance, Passenger, Payment,
        PaymentOption, Seat, SeatAvailability, SeatStatus, TicketSummary, Trip, TripAndTicket,
    };
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    /// A registered passenger with mobile `911000000`
    #[must_use]
    pub fn passenger() -> Passenger {
        Passenger {
            passenger_guid: "passenger-1".to_string(),
            first_name: "Abebe".to_string(),
            last_name: "Kebede".to_string(),
            gender: "Male".to_string(),
            country_code: "+251".to_string(),
            mobile_number: "911000000".to_string(),
            email: "abebe@example.com".to_string(),
            status: "Active".to_string(),
            last_modified: None,
        }
    }

    /// A seat at `row`/`column`
    #[must_use]
    pub fn seat(guid: &str, row: u32, column: u32, available: bool) -> Seat {
        Seat {
            trip_seat_guid: guid.to_string(),
            row_number: row,
            column_number: column,
            seat_number: (row - 1) * 4 + column,
            seat_type: None,
            status: if available {
                SeatStatus::Available
            } else {
                SeatStatus::Taken("Booked".to_string())
            },
        }
    }

    /// A trip priced at `price` with a `max_payment_minutes` window and a
    /// two-row, two-column bus whose first seat is taken
    #[must_use]
    pub fn trip(guid: &str, price: i64, max_payment_minutes: u32) -> Trip {
        Trip {
            trip_guid: guid.to_string(),
            code: format!("{}-CODE", guid.to_uppercase()),
            currency: None,
            travel_price: Decimal::from(price),
            departure_date: "Tuesday, October 28, 2025".to_string(),
            departure_time: "06:00 AM".to_string(),
            bus_carrier: Some(BusCarrier {
                bus_carrier_guid: Some("carrier-1".to_string()),
                display_name: "Selam Bus".to_string(),
                logo_url: None,
                setting: Some(CarrierSetting {
                    currency: None,
                    finance: Some(Finance {
                        max_payment_minutes,
                        ..Finance::default()
                    }),
                    trip_and_ticket: Some(TripAndTicket {
                        max_tickets_per_user: 4,
                        ..TripAndTicket::default()
                    }),
                }),
            }),
            trip_route: None,
            bus: None,
            seat_availability: Some(SeatAvailability {
                seats: vec![
                    seat("seat-1a", 1, 1, false),
                    seat("seat-1b", 1, 2, true),
                    seat("seat-2a", 2, 1, true),
                    seat("seat-2b", 2, 2, true),
                ],
                booked_seats: Some(1),
                available_seats: Some(3),
            }),
        }
    }

    /// A ticket for passenger `name`
    #[must_use]
    pub fn ticket(guid: &str, name: &str) -> TicketSummary {
        TicketSummary {
            ticket_guid: guid.to_string(),
            full_name: name.to_string(),
            phone_number: "+251911000000".to_string(),
            email: String::new(),
            ticket_number: format!("T-{guid}"),
            status: "CONFIRMED".to_string(),
        }
    }

    /// A two-ticket booking on `trip` with payment `status`
    #[must_use]
    pub fn booking_detail(guid: &str, trip: Trip, payment_status: &str, booked_at: DateTime<Utc>) -> BookingDetail {
        BookingDetail {
            booking_guid: guid.to_string(),
            pnr: format!("PNR-{}", guid.to_uppercase()),
            status: "BOOKED".to_string(),
            booking_date: Some(booked_at),
            last_modified: None,
            payment: Payment {
                payment_guid: format!("payment-{guid}"),
                billing_id: format!("BILL-{guid}"),
                status: payment_status.to_string(),
            },
            trip,
            tickets: vec![
                ticket(&format!("{guid}-t1"), "Abebe Kebede"),
                ticket(&format!("{guid}-t2"), "Sara Tesfaye"),
            ],
        }
    }

    /// The list-endpoint view of a detail
    #[must_use]
    pub fn summary_of(detail: &BookingDetail) -> BookingSummary {
        BookingSummary {
            booking_guid: Some(detail.booking_guid.clone()),
            pnr: detail.pnr.clone(),
            status: detail.status.clone(),
            booking_date: detail.booking_date,
            payment: detail.payment.clone(),
            trip: detail.trip.clone(),
            tickets: detail.tickets.clone(),
        }
    }

    /// An active payment option
    #[must_use]
    pub fn payment_option(guid: &str, name: &str) -> PaymentOption {
        PaymentOption {
            payment_option_guid: guid.to_string(),
            name: name.to_string(),
            code: name.to_uppercase(),
            description: String::new(),
            status: "Active".to_string(),
            last_modified: None,
            parameters: Vec::new(),
        }
    }
}
