//! Passenger authentication.
//!
//! Login stores the bearer token in [`crate::session::Credentials`] and the
//! session storage, then loads the profile. Logout removes both. Nothing
//! else writes the token.
//!
//! # Flow
//!
//! ```text
//! Login ──► backend.login ──► LoginSucceeded ──► backend.profile ──► ProfileLoaded
//!              │                  (token saved)                        (user saved)
//!              └──► LoginFailed
//! ```

pub mod actions;
pub mod reducer;
#[cfg(test)]
mod tests;
pub mod types;

pub use actions::AuthAction;
pub use reducer::AuthReducer;
pub use types::AuthState;
