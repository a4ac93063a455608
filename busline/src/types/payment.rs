//! Payment options and payment initiation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A payment method offered by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOption {
    /// Id passed to the pay endpoint
    pub payment_option_guid: String,
    /// Display name
    pub name: String,
    /// Gateway code, e.g. `CHAPA`
    pub code: String,
    #[serde(default)]
    #[allow(missing_docs)]
    pub description: String,
    /// Only `Active` options are requested
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    #[allow(missing_docs)]
    pub last_modified: Option<String>,
    /// Gateway-specific key/value pairs
    #[serde(default)]
    pub parameters: Vec<PaymentOptionParameter>,
}

/// Gateway-specific setting on a payment option
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOptionParameter {
    #[serde(default)]
    pub payment_option_parameter_guid: String,
    pub key: String,
    pub value: String,
}

/// Body of `POST /passenger/ticket/payment/pay`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Booking payment to settle
    pub payment_guid: String,
    /// Chosen method
    pub payment_option_guid: String,
    /// Seat price times ticket count; sent as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub payment_amount: Decimal,
    /// Payer details from the profile
    pub email: String,
    #[allow(missing_docs)]
    pub first_name: String,
    #[allow(missing_docs)]
    pub last_name: String,
}

/// Result of initiating a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInitiation {
    /// Gateway page the passenger must visit, if the gateway uses one
    pub checkout_url: Option<String>,
    /// Raw `data` payload from the backend
    pub raw: serde_json::Value,
}

impl PaymentInitiation {
    /// Extract the checkout URL from `checkoutUrl`, `checkout_url` or
    /// `data.checkout_url`, in that order
    #[must_use]
    pub fn from_data(raw: serde_json::Value) -> Self {
        let checkout_url = ["checkoutUrl", "checkout_url"]
            .iter()
            .find_map(|key| raw.get(*key))
            .or_else(|| raw.get("data").and_then(|data| data.get("checkout_url")))
            .and_then(serde_json::Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        Self { checkout_url, raw }
    }
}
