//! Actions for the auth feature.

use crate::error::ApiError;
use crate::types::{LoginRequest, Passenger, RegisterRequest};

/// Inputs to [`super::AuthReducer`]
#[derive(Debug, Clone)]
pub enum AuthAction {
    /// Load the persisted session, if any
    RestoreSession,

    /// Persisted session was read; `None` when either key was missing
    SessionRestored(Option<Passenger>),

    /// Log in with mobile number and password
    Login(LoginRequest),

    /// Token received and stored
    LoginSucceeded,

    /// Login rejected or failed
    LoginFailed(ApiError),

    /// Create an account
    Register(RegisterRequest),

    /// Account created
    Registered(Passenger),

    /// Registration rejected or failed
    RegisterFailed(ApiError),

    /// Fetch the profile for the current token
    LoadProfile,

    /// Profile fetched and stored
    ProfileLoaded(Passenger),

    /// Profile fetch failed; an auth failure also drops the token
    ProfileFailed(ApiError),

    /// Forget the token and profile
    Logout,

    /// Dismiss the current error
    ClearError,
}
