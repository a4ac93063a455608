//! Typed backend contracts.
//!
//! Every payload the backend sends or receives has a struct here. Field
//! names follow the backend's camelCase JSON. Responses are checked with
//! [`Validate`] right after decoding, so reducers only ever see data that
//! satisfies the contract.

pub mod auth;
pub mod booking;
pub mod page;
pub mod payment;
pub mod trip;

pub use auth::{LoginRequest, Passenger, RegisterRequest};
pub use booking::{
    BookTicketsRequest, BookingConfirmation, BookingDetail, BookingSummary, LegacyTicket,
    PassengerForm, Payment, PaymentRef, TicketSummary,
};
pub use page::{Page, PageRequest, Pagination};
pub use payment::{PaymentInitiation, PaymentOption, PaymentOptionParameter, PaymentRequest};
pub use trip::{
    Amenities, Bus, BusCarrier, CarrierSetting, Currency, Finance, Seat, SeatAvailability,
    SeatStatus, Station, Trip, TripAndTicket, TripQuery, TripRoute,
};

/// Contract checks serde cannot express
pub trait Validate {
    /// Describe the first violation, if any
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the violated rule.
    fn validate(&self) -> Result<(), String>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        self.iter().try_for_each(Validate::validate)
    }
}

/// Lenient timestamp handling
///
/// The backend sends RFC 3339 timestamps, sometimes without an offset.
/// Offset-less values are taken as UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub(crate) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub(crate) fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse(raw.trim())
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp `{raw}`"))),
        }
    }

    #[allow(clippy::ref_option)]
    pub(crate) fn serialize_opt<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&time.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }
}

/// Counts the backend sends either as numbers or numeric strings
pub(crate) mod count {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    pub(crate) fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Number(n)) => Some(n),
            Some(Raw::Text(text)) => text.trim().parse().ok(),
            None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::timestamp;
    use chrono::{TimeZone, Utc};

    #[test]
    fn timestamps_without_offset_are_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 10, 28, 9, 0, 0).single();
        assert_eq!(timestamp::parse("2025-10-28T09:00:00"), expected);
        assert_eq!(timestamp::parse("2025-10-28T09:00:00.000"), expected);
        assert_eq!(timestamp::parse("2025-10-28T09:00:00Z"), expected);
        assert_eq!(timestamp::parse("2025-10-28T12:00:00+03:00"), expected);
        assert_eq!(timestamp::parse("yesterday"), None);
    }
}
