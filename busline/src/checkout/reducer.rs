//! Checkout reducer.

use crate::api::BackendApi;
use crate::checkout::{CheckoutAction, CheckoutState, PaymentTarget};
use crate::checkout::types::{BookingFormState, PaymentState};
use crate::environment::ClientEnvironment;
use crate::error::{ApiError, ValidationError};
use crate::types::{BookTicketsRequest, PageRequest, Passenger, PassengerForm, PaymentRequest};
use busline_core::async_effect;
use busline_core::{effect::Effect, reducer::Reducer};
use rust_decimal::Decimal;
use smallvec::{smallvec, SmallVec};
use std::marker::PhantomData;

/// Reducer for booking, payment options and payment
#[derive(Debug, Clone)]
pub struct CheckoutReducer<B> {
    _backend: PhantomData<B>,
}

impl<B> CheckoutReducer<B> {
    /// Create a new checkout reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B> Default for CheckoutReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Check and trim the passenger forms
fn normalize_passengers(
    passengers: Vec<PassengerForm>,
    max_tickets_per_user: Option<u32>,
    default_country_code: &str,
) -> Result<Vec<PassengerForm>, ValidationError> {
    if passengers.is_empty() {
        return Err(ValidationError::NoPassengers);
    }
    if let Some(max) = max_tickets_per_user.filter(|max| *max > 0) {
        if passengers.len() > max as usize {
            return Err(ValidationError::TooManyPassengers {
                max,
                requested: passengers.len(),
            });
        }
    }

    passengers
        .into_iter()
        .enumerate()
        .map(|(i, mut form)| {
            let index = i + 1;
            for (value, field) in [
                (&mut form.first_name, "first name"),
                (&mut form.last_name, "last name"),
                (&mut form.mobile_number, "mobile number"),
            ] {
                *value = value.trim().to_string();
                if value.is_empty() {
                    return Err(ValidationError::IncompletePassenger { index, field });
                }
            }
            form.email = form.email.trim().to_string();
            form.country_code = form.country_code.trim().to_string();
            if form.country_code.is_empty() {
                form.country_code = default_country_code.to_string();
            }
            Ok(form)
        })
        .collect()
}

fn payment_request(
    target: &PaymentTarget,
    option_guid: Option<String>,
    payer: Option<&Passenger>,
) -> Result<PaymentRequest, ValidationError> {
    if target.payment_guid().trim().is_empty() {
        return Err(ValidationError::NoBookingLoaded);
    }
    if target.is_paid() {
        return Err(ValidationError::AlreadyPaid);
    }
    if target.amount() <= Decimal::ZERO {
        return Err(ValidationError::NothingDue);
    }
    let payment_option_guid = option_guid
        .filter(|guid| !guid.trim().is_empty())
        .ok_or(ValidationError::NoPaymentOption)?;
    let payer = payer.ok_or(ValidationError::ProfileRequired)?;

    Ok(PaymentRequest {
        payment_guid: target.payment_guid().to_string(),
        payment_option_guid,
        payment_amount: target.amount(),
        email: payer.email.clone(),
        first_name: payer.first_name.clone(),
        last_name: payer.last_name.clone(),
    })
}

impl<B: BackendApi> Reducer for CheckoutReducer<B> {
    type State = CheckoutState;
    type Action = CheckoutAction;
    type Environment = ClientEnvironment<B>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Booking
            // ═══════════════════════════════════════════════════════════════
            CheckoutAction::BookTickets {
                trip_guid,
                passengers,
                max_tickets_per_user,
            } => {
                if state.booking.loading {
                    return smallvec![Effect::None];
                }
                let tickets = match normalize_passengers(
                    passengers,
                    max_tickets_per_user,
                    &env.default_country_code,
                ) {
                    Ok(tickets) => tickets,
                    Err(error) => {
                        state.booking.error = Some(error.into());
                        return smallvec![Effect::None];
                    },
                };
                let Some(token) = env.credentials.token() else {
                    state.booking.error = Some(ApiError::Unauthenticated);
                    return smallvec![Effect::None];
                };

                state.booking.loading = true;
                state.booking.error = None;
                state.booking.confirmation = None;

                let request = BookTicketsRequest { trip_guid, tickets };
                let backend = env.backend.clone();
                smallvec![async_effect! {
                    Some(match backend.book_tickets(&token, &request).await {
                        Ok(confirmation) => CheckoutAction::TicketsBooked(confirmation),
                        Err(error) => CheckoutAction::BookingFailed(error),
                    })
                }]
            },

            CheckoutAction::TicketsBooked(confirmation) => {
                tracing::info!(
                    pnr = %confirmation.pnr,
                    booking = %confirmation.booking_guid,
                    tickets = confirmation.tickets.len(),
                    "Tickets booked"
                );
                state.booking.loading = false;
                state.booking.confirmation = Some(confirmation);
                smallvec![Effect::None]
            },

            CheckoutAction::BookingFailed(error) => {
                tracing::debug!(%error, "Booking failed");
                state.booking.loading = false;
                state.booking.error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Payment options
            // ═══════════════════════════════════════════════════════════════
            CheckoutAction::LoadPaymentOptions(page) => {
                let Some(token) = env.credentials.token() else {
                    state.options.error = Some(ApiError::Unauthenticated);
                    return smallvec![Effect::None];
                };

                state.options.seq += 1;
                state.options.loading = true;
                state.options.error = None;

                let seq = state.options.seq;
                let page = page.unwrap_or_else(|| PageRequest::first(env.paging.payment_options));
                let backend = env.backend.clone();
                smallvec![async_effect! {
                    Some(match backend.payment_options(&token, page).await {
                        Ok(page) => CheckoutAction::PaymentOptionsLoaded { seq, page },
                        Err(error) => CheckoutAction::PaymentOptionsFailed { seq, error },
                    })
                }]
            },

            CheckoutAction::PaymentOptionsLoaded { seq, page } => {
                if seq != state.options.seq {
                    return smallvec![Effect::None];
                }
                state.options.options = page.items;
                state.options.pagination = page.pagination;
                state.options.loading = false;

                let still_offered = state.payment.selected_option.as_deref().is_none_or(|selected| {
                    state
                        .options
                        .options
                        .iter()
                        .any(|option| option.payment_option_guid == selected)
                });
                if !still_offered {
                    state.payment.selected_option = None;
                }
                smallvec![Effect::None]
            },

            CheckoutAction::PaymentOptionsFailed { seq, error } => {
                if seq != state.options.seq {
                    return smallvec![Effect::None];
                }
                state.options.loading = false;
                state.options.error = Some(error);
                smallvec![Effect::None]
            },

            CheckoutAction::SelectPaymentOption(option_guid) => {
                state.payment.selected_option = Some(option_guid);
                state.payment.error = None;
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Payment
            // ═══════════════════════════════════════════════════════════════
            CheckoutAction::Pay {
                target,
                option_guid,
                payer,
            } => {
                if state.payment.loading {
                    return smallvec![Effect::None];
                }
                let option_guid = option_guid.or_else(|| state.payment.selected_option.clone());
                let request = match payment_request(&target, option_guid, payer.as_ref()) {
                    Ok(request) => request,
                    Err(error) => {
                        state.payment.error = Some(error.into());
                        return smallvec![Effect::None];
                    },
                };
                let Some(token) = env.credentials.token() else {
                    state.payment.error = Some(ApiError::Unauthenticated);
                    return smallvec![Effect::None];
                };

                tracing::info!(
                    pnr = target.pnr(),
                    amount = %request.payment_amount,
                    option = %request.payment_option_guid,
                    "Initiating payment"
                );
                state.payment.loading = true;
                state.payment.error = None;
                state.payment.initiation = None;

                let backend = env.backend.clone();
                smallvec![async_effect! {
                    Some(match backend.pay(&token, &request).await {
                        Ok(initiation) => CheckoutAction::PaymentInitiated(initiation),
                        Err(error) => CheckoutAction::PaymentFailed(error),
                    })
                }]
            },

            CheckoutAction::PaymentInitiated(initiation) => {
                if initiation.checkout_url.is_none() {
                    tracing::warn!("Payment initiated without a checkout URL");
                }
                state.payment.loading = false;
                state.payment.initiation = Some(initiation);
                smallvec![Effect::None]
            },

            CheckoutAction::PaymentFailed(error) => {
                tracing::warn!(%error, "Payment failed");
                state.payment.loading = false;
                state.payment.error = Some(error);
                smallvec![Effect::None]
            },

            CheckoutAction::ResetCheckout => {
                state.booking = BookingFormState::default();
                state.payment = PaymentState::default();
                smallvec![Effect::None]
            },
        }
    }
}
