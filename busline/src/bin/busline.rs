//! Busline command line client.
//!
//! Drives the same feature stores a UI would, against the backend named by
//! `BUSLINE_API_BASE_URL`. The session is kept in `BUSLINE_SESSION_FILE`
//! between invocations.
//!
//! # Usage
//!
//! ```bash
//! busline login 911000000 --password secret
//! busline bookings --status BOOKED
//! busline search PNR0001
//! busline booking <booking-guid> --watch 60
//! busline confirm-seat <booking-guid> <trip-seat-guid>
//! busline trips --origin <station> --destination <station> --date 2025-10-28
//! busline pay-options
//! busline pay <booking-guid> <payment-option-guid>
//! busline logout
//! ```

use anyhow::{bail, Context};
use busline::auth::{AuthAction, AuthReducer, AuthState};
use busline::checkout::{CheckoutAction, CheckoutReducer, CheckoutState, PaymentTarget};
use busline::config::Config;
use busline::countdown::Countdown;
use busline::display;
use busline::session::{FileSessionStorage, SessionStorage};
use busline::tickets::{TicketAction, TicketReducer, TicketState, View};
use busline::trips::{TripAction, TripReducer, TripState};
use busline::types::{BookingDetail, BookingSummary, LoginRequest, PageRequest, TripQuery};
use busline::{BookingQuery, ClientEnvironment, HttpBackend};
use busline_core::environment::{Clock, SystemClock};
use busline_core::reducer::Reducer;
use busline_runtime::{Store, StoreError};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Env = ClientEnvironment<HttpBackend>;

#[derive(Parser)]
#[command(name = "busline")]
#[command(version)]
#[command(about = "Search trips, manage bookings, choose seats and pay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL
    #[arg(long, global = true, env = "BUSLINE_API_BASE_URL")]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        /// Mobile number without country code
        mobile_number: String,

        /// Account password
        #[arg(long, env = "BUSLINE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Country code; the configured default when omitted
        #[arg(long)]
        country_code: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in passenger
    Profile,

    /// List my bookings
    Bookings {
        /// One-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Bookings per page; the configured size when omitted
        #[arg(long)]
        page_size: Option<u32>,

        /// Backend status filter, e.g. BOOKED
        #[arg(long)]
        status: Option<String>,
    },

    /// Look up bookings by PNR
    Search {
        /// PNR code or fragment
        pnr: String,
    },

    /// Show one booking with its seats and payment countdown
    Booking {
        /// Booking id
        booking_guid: String,

        /// Keep printing the payment countdown for this many seconds
        #[arg(long)]
        watch: Option<u64>,
    },

    /// Bind a seat to a ticket of a paid booking
    ConfirmSeat {
        /// Booking id
        booking_guid: String,

        /// Seat id from the seat map
        trip_seat_guid: String,

        /// Ticket to bind; the booking's first ticket when omitted
        #[arg(long)]
        ticket: Option<String>,
    },

    /// Search trips
    Trips {
        /// Origin id
        #[arg(long)]
        origin: String,

        /// Destination id
        #[arg(long)]
        destination: String,

        /// Travel date, YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Restrict to one carrier
        #[arg(long)]
        carrier: Option<String>,
    },

    /// List active payment options
    PayOptions,

    /// Start paying for a booking
    Pay {
        /// Booking id
        booking_guid: String,

        /// Payment option id
        payment_option_guid: String,
    },
}

/// Send `action` and wait for the first effect-produced action matching
/// `done`
///
/// Returns `None` when the reducer started no work, which happens when it
/// rejected the action locally.
async fn dispatch<S, A, R>(
    store: &Store<S, A, Env, R>,
    action: A,
    done: impl Fn(&A) -> bool,
    timeout: Duration,
) -> Result<Option<A>, StoreError>
where
    R: Reducer<State = S, Action = A, Environment = Env> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
{
    let mut actions = store.subscribe_actions();
    let handle = store.send(action).await?;
    if handle.pending() == 0 && actions.is_empty() {
        return Ok(None);
    }

    tokio::time::timeout(timeout, async {
        loop {
            match actions.recv().await {
                Ok(action) if done(&action) => return Ok(Some(action)),
                Ok(_) | Err(RecvError::Lagged(_)) => {},
                Err(RecvError::Closed) => return Err(StoreError::ChannelClosed),
            }
        }
    })
    .await
    .map_err(|_| StoreError::Timeout)?
}

struct App {
    auth: Store<AuthState, AuthAction, Env, AuthReducer<HttpBackend>>,
    tickets: Store<TicketState, TicketAction, Env, TicketReducer<HttpBackend>>,
    trips: Store<TripState, TripAction, Env, TripReducer<HttpBackend>>,
    checkout: Store<CheckoutState, CheckoutAction, Env, CheckoutReducer<HttpBackend>>,
    timeout: Duration,
}

impl App {
    fn new(env: &Env, timeout: Duration) -> Self {
        Self {
            auth: Store::new(AuthState::default(), AuthReducer::new(), env.clone()),
            tickets: Store::new(TicketState::default(), TicketReducer::new(), env.clone()),
            trips: Store::new(TripState::default(), TripReducer::new(), env.clone()),
            checkout: Store::new(CheckoutState::default(), CheckoutReducer::new(), env.clone()),
            timeout,
        }
    }

    async fn restore_session(&self) -> anyhow::Result<()> {
        dispatch(
            &self.auth,
            AuthAction::RestoreSession,
            |a| matches!(a, AuthAction::SessionRestored(_)),
            self.timeout,
        )
        .await?;
        if !self.auth.state(AuthState::is_logged_in).await {
            bail!("Not logged in; run `busline login` first");
        }
        Ok(())
    }

    async fn login(&self, request: LoginRequest) -> anyhow::Result<()> {
        dispatch(
            &self.auth,
            AuthAction::Login(request),
            |a| {
                matches!(
                    a,
                    AuthAction::ProfileLoaded(_) | AuthAction::ProfileFailed(_) | AuthAction::LoginFailed(_)
                )
            },
            self.timeout,
        )
        .await?;

        let (user, error) = self.auth.state(|s| (s.user.clone(), s.error.clone())).await;
        match (user, error) {
            (_, Some(error)) => bail!("{error}"),
            (Some(user), None) => println!("Logged in as {}", user.full_name()),
            (None, None) => println!("Logged in"),
        }
        Ok(())
    }

    async fn logout(&self) -> anyhow::Result<()> {
        let mut handle = self.auth.send(AuthAction::Logout).await?;
        handle.wait_with_timeout(self.timeout).await?;
        println!("Logged out");
        Ok(())
    }

    async fn profile(&self) -> anyhow::Result<()> {
        self.restore_session().await?;
        dispatch(
            &self.auth,
            AuthAction::LoadProfile,
            |a| matches!(a, AuthAction::ProfileLoaded(_) | AuthAction::ProfileFailed(_)),
            self.timeout,
        )
        .await?;

        let (user, error) = self.auth.state(|s| (s.user.clone(), s.error.clone())).await;
        if let Some(error) = error {
            bail!("{error}");
        }
        let user = user.context("No profile returned")?;
        println!("{}", user.full_name());
        println!("  mobile  {}{}", user.country_code, user.mobile_number);
        if !user.email.is_empty() {
            println!("  email   {}", user.email);
        }
        Ok(())
    }

    async fn bookings(&self, query: BookingQuery) -> anyhow::Result<()> {
        self.restore_session().await?;
        dispatch(
            &self.tickets,
            TicketAction::LoadBookings(query),
            |a| matches!(a, TicketAction::BookingsLoaded { .. } | TicketAction::BookingsFailed { .. }),
            self.timeout,
        )
        .await?;

        let (bookings, pagination, error) = self
            .tickets
            .state(|s| (s.list.bookings.clone(), s.list.pagination, s.list.error.clone()))
            .await;
        if let Some(error) = error {
            bail!("{error}");
        }
        print_summaries(&bookings);
        if let Some(p) = pagination {
            println!("Page {} of {} ({} bookings)", p.current_page, p.total_pages, p.total_records);
        }
        Ok(())
    }

    async fn search(&self, pnr: String) -> anyhow::Result<()> {
        dispatch(
            &self.tickets,
            TicketAction::SearchByLocator { locator: pnr, page: None },
            |a| matches!(a, TicketAction::SearchCompleted { .. } | TicketAction::SearchFailed { .. }),
            self.timeout,
        )
        .await?;

        let (results, error) = self
            .tickets
            .state(|s| (s.search.results.clone(), s.search.error.clone()))
            .await;
        if let Some(error) = error {
            bail!("{error}");
        }
        if results.is_empty() {
            println!("No bookings found");
        }
        print_summaries(&results);
        Ok(())
    }

    /// Enter the booking view and wait for the booking and its seat map
    async fn open_booking(&self, booking_guid: &str) -> anyhow::Result<BookingDetail> {
        dispatch(
            &self.tickets,
            TicketAction::ViewEntered(View::BookingDetail(booking_guid.to_string())),
            |a| matches!(a, TicketAction::SeatMapLoaded { .. } | TicketAction::SeatMapFailed { .. } | TicketAction::DetailFailed { .. }),
            self.timeout,
        )
        .await?;

        let (booking, error) = self
            .tickets
            .state(|s| (s.detail.booking.clone(), s.detail.error.clone()))
            .await;
        if let Some(error) = error {
            bail!("{error}");
        }
        booking.context("Booking did not load")
    }

    async fn close_booking(&self, booking_guid: &str) -> anyhow::Result<()> {
        self.tickets
            .send(TicketAction::ViewExited(View::BookingDetail(booking_guid.to_string())))
            .await?;
        Ok(())
    }

    async fn booking(&self, booking_guid: &str, watch: Option<Duration>, clock: &dyn Clock) -> anyhow::Result<()> {
        self.restore_session().await?;
        let booking = self.open_booking(booking_guid).await?;

        let (layout, countdown) = self
            .tickets
            .state(|s| (s.seat_map.layout(), s.countdown.current.clone()))
            .await;
        print_detail(&booking, countdown.as_ref(), clock);
        if !layout.rows.is_empty() {
            println!("Seats (xx = taken):");
            for row in &layout.rows {
                let seats: Vec<String> = row
                    .seats
                    .iter()
                    .map(|seat| {
                        if seat.is_available() {
                            format!("{:>2}", seat.seat_number)
                        } else {
                            "xx".to_string()
                        }
                    })
                    .collect();
                println!("  {:>2} | {}", row.row_number, seats.join(" "));
            }
        }
        if let Some(countdown) = countdown {
            println!("Time left to pay: {countdown}");
        }

        if let Some(watch) = watch {
            self.watch_countdown(watch).await?;
        }
        self.close_booking(booking_guid).await
    }

    async fn watch_countdown(&self, watch: Duration) -> anyhow::Result<()> {
        let mut actions = self.tickets.subscribe_actions();
        let deadline = tokio::time::Instant::now() + watch;

        while self.tickets.state(|s| s.countdown.running).await {
            let next = tokio::time::timeout_at(deadline, actions.recv()).await;
            match next {
                Err(_) => break,
                Ok(Ok(TicketAction::CountdownTick { .. })) => {
                    if let Some(countdown) = self.tickets.state(|s| s.countdown.current.clone()).await {
                        println!("Time left to pay: {countdown}");
                    }
                },
                Ok(Ok(_) | Err(RecvError::Lagged(_))) => {},
                Ok(Err(RecvError::Closed)) => break,
            }
        }
        Ok(())
    }

    async fn confirm_seat(&self, booking_guid: &str, trip_seat_guid: String, ticket: Option<String>) -> anyhow::Result<()> {
        self.restore_session().await?;
        self.open_booking(booking_guid).await?;

        self.tickets.send(TicketAction::SelectSeat(trip_seat_guid)).await?;
        if let Some(error) = self.tickets.state(|s| s.seat.error.clone()).await {
            self.close_booking(booking_guid).await?;
            bail!("{error}");
        }

        dispatch(
            &self.tickets,
            TicketAction::ConfirmSeat { ticket_guid: ticket },
            |a| matches!(a, TicketAction::SeatConfirmed { .. } | TicketAction::SeatConfirmFailed { .. }),
            self.timeout,
        )
        .await?;

        let (confirmed, error) = self
            .tickets
            .state(|s| (s.seat.last_confirmed.clone(), s.seat.error.clone()))
            .await;
        self.close_booking(booking_guid).await?;

        if let Some(error) = error {
            tracing::debug!(cause = ?std::error::Error::source(&error), "Seat confirmation failed");
            bail!("{error}");
        }
        if let Some(seat) = confirmed {
            println!("Seat {} confirmed for ticket {}", seat.trip_seat_guid, seat.ticket_guid);
        }
        Ok(())
    }

    async fn trips(&self, query: TripQuery) -> anyhow::Result<()> {
        dispatch(
            &self.trips,
            TripAction::SearchTrips { query, page: None },
            |a| matches!(a, TripAction::TripsLoaded { .. } | TripAction::TripsFailed { .. }),
            self.timeout,
        )
        .await?;

        let (trips, error) = self
            .trips
            .state(|s| (s.search.trips.clone(), s.search.error.clone()))
            .await;
        if let Some(error) = error {
            bail!("{error}");
        }
        if trips.is_empty() {
            println!("No trips found");
        }
        for trip in &trips {
            let carrier = trip.bus_carrier.as_ref().map_or("", |c| c.display_name.as_str());
            println!(
                "{}  {} {}  {}  {}  {}",
                trip.trip_guid,
                trip.departure_date,
                trip.departure_time,
                trip.route_label().unwrap_or_default(),
                carrier,
                trip.travel_price
            );
        }
        Ok(())
    }

    async fn pay_options(&self) -> anyhow::Result<()> {
        self.restore_session().await?;
        dispatch(
            &self.checkout,
            CheckoutAction::LoadPaymentOptions(None),
            |a| matches!(a, CheckoutAction::PaymentOptionsLoaded { .. } | CheckoutAction::PaymentOptionsFailed { .. }),
            self.timeout,
        )
        .await?;

        let (options, error) = self
            .checkout
            .state(|s| (s.options.options.clone(), s.options.error.clone()))
            .await;
        if let Some(error) = error {
            bail!("{error}");
        }
        for option in &options {
            println!("{}  {} ({})", option.payment_option_guid, option.name, option.code);
        }
        Ok(())
    }

    async fn pay(&self, booking_guid: &str, payment_option_guid: String) -> anyhow::Result<()> {
        self.restore_session().await?;
        let booking = self.open_booking(booking_guid).await?;
        self.close_booking(booking_guid).await?;
        let payer = self.auth.state(|s| s.user.clone()).await;

        dispatch(
            &self.checkout,
            CheckoutAction::Pay {
                target: PaymentTarget::from(&booking),
                option_guid: Some(payment_option_guid),
                payer,
            },
            |a| matches!(a, CheckoutAction::PaymentInitiated(_) | CheckoutAction::PaymentFailed(_)),
            self.timeout,
        )
        .await?;

        let payment = self.checkout.state(|s| s.payment.clone()).await;
        if let Some(error) = payment.error {
            bail!("{error}");
        }
        println!("Amount due: {}", booking.total_amount());
        match payment.checkout_url() {
            Some(url) => println!("Complete the payment at {url}"),
            None => println!("Payment initiated"),
        }
        Ok(())
    }

    async fn shutdown(&self) {
        let grace = Duration::from_secs(2);
        let (auth, tickets, trips, checkout) = futures::join!(
            self.auth.shutdown(grace),
            self.tickets.shutdown(grace),
            self.trips.shutdown(grace),
            self.checkout.shutdown(grace),
        );
        for result in [auth, tickets, trips, checkout] {
            if let Err(error) = result {
                tracing::debug!(%error, "Store did not drain");
            }
        }
    }
}

fn print_summaries(bookings: &[BookingSummary]) {
    for booking in bookings {
        let paid = if booking.payment.is_paid() { "paid" } else { "unpaid" };
        println!(
            "{}  {}  {}  {}  {}  {} ({})",
            booking.pnr,
            booking.booking_guid.as_deref().unwrap_or("-"),
            booking.trip.departure_date,
            booking.trip.route_label().unwrap_or_default(),
            booking.total_amount(),
            booking.status,
            paid
        );
    }
}

fn print_detail(booking: &BookingDetail, countdown: Option<&Countdown>, clock: &dyn Clock) {
    println!("PNR {}  ({})", booking.pnr, booking.status);
    println!(
        "  {}  {} {}",
        booking.trip.route_label().unwrap_or_else(|| booking.trip.code.clone()),
        booking.trip.departure_date,
        booking.trip.departure_time
    );
    println!("  total {}  payment {}", booking.total_amount(), booking.payment.status);
    if display::pay_now_available(
        &booking.payment,
        &booking.trip.departure_date,
        countdown,
        clock.now().date_naive(),
    ) {
        println!("  payment still open");
    }
    println!("  qr {}", display::booking_qr_payload(booking));
    for ticket in &booking.tickets {
        println!("  - {}  {}", ticket.full_name, ticket.ticket_guid);
        println!("    qr {}", display::ticket_qr_payload(booking, ticket));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "busline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }
    tracing::debug!(base_url = %config.api.base_url, session = %config.session.file.display(), "Configuration loaded");

    let backend = HttpBackend::new(&config.api)?;
    let session: Arc<dyn SessionStorage> = Arc::new(FileSessionStorage::new(config.session.file.clone()));
    let clock = Arc::new(SystemClock);
    let env = ClientEnvironment::from_config(&config, backend, session, clock.clone());
    let app = App::new(&env, config.api.request_timeout + Duration::from_secs(5));

    let result = match cli.command {
        Commands::Login {
            mobile_number,
            password,
            country_code,
        } => {
            app.login(LoginRequest {
                country_code: country_code.unwrap_or_default(),
                mobile_number,
                password,
            })
            .await
        },
        Commands::Logout => app.logout().await,
        Commands::Profile => app.profile().await,
        Commands::Bookings {
            page,
            page_size,
            status,
        } => {
            let query = BookingQuery {
                page: PageRequest::new(page, page_size.unwrap_or(config.paging.bookings)),
                status,
                keyword: None,
            };
            app.bookings(query).await
        },
        Commands::Search { pnr } => app.search(pnr).await,
        Commands::Booking {
            booking_guid,
            watch,
        } => {
            app.booking(&booking_guid, watch.map(Duration::from_secs), clock.as_ref())
                .await
        },
        Commands::ConfirmSeat {
            booking_guid,
            trip_seat_guid,
            ticket,
        } => app.confirm_seat(&booking_guid, trip_seat_guid, ticket).await,
        Commands::Trips {
            origin,
            destination,
            date,
            carrier,
        } => {
            app.trips(TripQuery {
                origin_guid: origin,
                destination_guid: destination,
                travel_date: date,
                bus_carrier_guid: carrier,
            })
            .await
        },
        Commands::PayOptions => app.pay_options().await,
        Commands::Pay {
            booking_guid,
            payment_option_guid,
        } => app.pay(&booking_guid, payment_option_guid).await,
    };

    app.shutdown().await;
    result
}
