//! Passenger accounts

use serde::{Deserialize, Serialize};

/// The authenticated passenger's profile
#[allow(missing_docs)] // fields mirror the backend JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    pub passenger_guid: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub country_code: String,
    pub mobile_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub last_modified: Option<String>,
}

impl Passenger {
    /// "First Last"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Body of `POST /auth/passenger/login`
#[allow(missing_docs)]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub country_code: String,
    pub mobile_number: String,
    pub password: String,
}

// Keeps the password out of logs
impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("country_code", &self.country_code)
            .field("mobile_number", &self.mobile_number)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /auth/passenger/register`
#[allow(missing_docs)]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub country_code: String,
    pub mobile_number: String,
    pub email: String,
    pub password: String,
    pub gender: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("mobile_number", &self.mobile_number)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
