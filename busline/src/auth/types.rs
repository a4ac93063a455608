//! Auth state.

use crate::error::ApiError;
use crate::types::Passenger;

/// What the client knows about the logged-in passenger
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    /// Profile of the logged-in passenger
    pub user: Option<Passenger>,
    /// A token is held
    pub authenticated: bool,
    /// Login, registration or profile request in flight
    pub loading: bool,
    /// Last failure, shown verbatim
    pub error: Option<ApiError>,
    /// Account created by the last registration
    pub registered: Option<Passenger>,
    /// The persisted session has been checked
    pub restored: bool,
}

impl AuthState {
    /// Returns `true` once both token and profile are present
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.authenticated && self.user.is_some()
    }
}
