//! Group legacy ticket lists by PNR.
//!
//! The ticket-centric list endpoint returns one entry per passenger, each
//! carrying its booking. Tickets sharing a PNR are one booking on screen.

use crate::types::LegacyTicket;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tickets sharing one PNR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnrGroup {
    /// Shared locator
    pub pnr: String,
    /// Tickets in input order; never empty
    pub tickets: Vec<LegacyTicket>,
    /// Seat price of the primary ticket's trip times group size
    pub total_amount: Decimal,
}

impl PnrGroup {
    /// First ticket seen for this PNR; its booking supplies trip, carrier and payment
    #[must_use]
    pub fn primary(&self) -> Option<&LegacyTicket> {
        self.tickets.first()
    }

    /// Passengers in the group
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// Always `false` for groups built by [`group_by_pnr`]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Returns `true` if the primary booking's payment is settled
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.primary().is_some_and(|t| t.booking.payment.is_paid())
    }
}

/// Group tickets by PNR
///
/// Groups appear in order of each PNR's first ticket; tickets keep input
/// order within a group. The result depends only on `tickets`.
#[must_use]
pub fn group_by_pnr(tickets: &[LegacyTicket]) -> Vec<PnrGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<PnrGroup> = Vec::new();

    for ticket in tickets {
        let pnr = ticket.booking.pnr.as_str();
        if let Some(&at) = index.get(pnr) {
            groups[at].tickets.push(ticket.clone());
        } else {
            index.insert(pnr, groups.len());
            groups.push(PnrGroup {
                pnr: pnr.to_string(),
                tickets: vec![ticket.clone()],
                total_amount: Decimal::ZERO,
            });
        }
    }

    for group in &mut groups {
        let price = group
            .primary()
            .map_or(Decimal::ZERO, |t| t.booking.trip.travel_price);
        group.total_amount = price * Decimal::from(group.tickets.len());
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BookingSummary, Payment, Trip};
    use proptest::prelude::*;

    fn ticket(guid: &str, pnr: &str, price: i64) -> LegacyTicket {
        LegacyTicket {
            ticket_guid: guid.to_string(),
            full_name: format!("Passenger {guid}"),
            phone_number: String::new(),
            email: String::new(),
            ticket_number: String::new(),
            status: "CONFIRMED".to_string(),
            booking: BookingSummary {
                booking_guid: None,
                pnr: pnr.to_string(),
                status: "BOOKED".to_string(),
                booking_date: None,
                payment: Payment {
                    payment_guid: format!("pay-{pnr}"),
                    billing_id: String::new(),
                    status: "PENDING".to_string(),
                },
                trip: Trip {
                    trip_guid: format!("trip-{pnr}"),
                    code: "ADD-BJR".to_string(),
                    currency: None,
                    travel_price: Decimal::from(price),
                    departure_date: "Tuesday, October 28, 2025".to_string(),
                    departure_time: "06:00".to_string(),
                    bus_carrier: None,
                    trip_route: None,
                    bus: None,
                    seat_availability: None,
                },
                tickets: Vec::new(),
            },
        }
    }

    #[test]
    fn groups_in_first_seen_order() {
        let tickets = vec![
            ticket("k1", "BBB", 500),
            ticket("k2", "AAA", 300),
            ticket("k3", "BBB", 500),
        ];

        let groups = group_by_pnr(&tickets);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].pnr, "BBB");
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0].primary().map(|t| t.ticket_guid.as_str()), Some("k1"));
        assert_eq!(groups[0].total_amount, Decimal::from(1000));
        assert_eq!(groups[1].pnr, "AAA");
        assert_eq!(groups[1].total_amount, Decimal::from(300));
        assert!(!groups[1].is_paid());
    }

    #[test]
    fn empty_input_has_no_groups() {
        assert!(group_by_pnr(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn grouping_is_idempotent_and_complete(
            entries in proptest::collection::vec((0usize..5, 1i64..2_000), 0..40)
        ) {
            let tickets: Vec<LegacyTicket> = entries
                .iter()
                .enumerate()
                .map(|(i, (pnr, price))| ticket(&format!("k{i}"), &format!("PNR{pnr}"), *price))
                .collect();

            let first = group_by_pnr(&tickets);
            let second = group_by_pnr(&tickets);
            prop_assert_eq!(&first, &second);

            let grouped: usize = first.iter().map(PnrGroup::len).sum();
            prop_assert_eq!(grouped, tickets.len());
            for group in &first {
                prop_assert!(!group.is_empty());
                prop_assert!(group.tickets.iter().all(|t| t.booking.pnr == group.pnr));
            }
        }
    }
}
