//! Configuration for the booking client.
//!
//! Loads configuration from `BUSLINE_*` environment variables with defaults.
//! The binary loads a `.env` file first, so values there apply too.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    pub api: ApiConfig,
    /// Where the auth token and profile are persisted
    pub session: SessionConfig,
    /// Page sizes used for list requests
    pub paging: PagingConfig,
    /// Interval between payment countdown recomputations
    pub countdown_tick: Duration,
    /// Country code attached to login and booking forms when none is given
    pub default_country_code: String,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

/// Session persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// JSON file holding the `token` and `user` keys
    pub file: PathBuf,
}

/// Default page sizes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PagingConfig {
    /// My-bookings list
    pub bookings: u32,
    /// PNR search results
    pub search: u32,
    /// Trip search results
    pub trips: u32,
    /// Payment options
    pub payment_options: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            bookings: 10,
            search: 10,
            trips: 10,
            payment_options: 10,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `BUSLINE_API_BASE_URL` | `http://localhost:5000/api` |
    /// | `BUSLINE_REQUEST_TIMEOUT_SECS` | `30` |
    /// | `BUSLINE_SESSION_FILE` | `.busline-session.json` |
    /// | `BUSLINE_BOOKINGS_PAGE_SIZE` | `10` |
    /// | `BUSLINE_SEARCH_PAGE_SIZE` | `10` |
    /// | `BUSLINE_TRIPS_PAGE_SIZE` | `10` |
    /// | `BUSLINE_PAYMENT_OPTIONS_PAGE_SIZE` | `10` |
    /// | `BUSLINE_COUNTDOWN_TICK_MS` | `1000` |
    /// | `BUSLINE_DEFAULT_COUNTRY_CODE` | `+251` |
    #[must_use]
    pub fn from_env() -> Self {
        let paging = PagingConfig::default();

        Self {
            api: ApiConfig {
                base_url: env::var("BUSLINE_API_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:5000/api".to_string()),
                request_timeout: Duration::from_secs(
                    env::var("BUSLINE_REQUEST_TIMEOUT_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(30),
                ),
            },
            session: SessionConfig {
                file: env::var("BUSLINE_SESSION_FILE")
                    .map_or_else(|_| PathBuf::from(".busline-session.json"), PathBuf::from),
            },
            paging: PagingConfig {
                bookings: env::var("BUSLINE_BOOKINGS_PAGE_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(paging.bookings),
                search: env::var("BUSLINE_SEARCH_PAGE_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(paging.search),
                trips: env::var("BUSLINE_TRIPS_PAGE_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(paging.trips),
                payment_options: env::var("BUSLINE_PAYMENT_OPTIONS_PAGE_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(paging.payment_options),
            },
            countdown_tick: Duration::from_millis(
                env::var("BUSLINE_COUNTDOWN_TICK_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|ms| *ms > 0)
                    .unwrap_or(1000),
            ),
            default_country_code: env::var("BUSLINE_DEFAULT_COUNTRY_CODE")
                .unwrap_or_else(|_| "+251".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_match_list_views() {
        let paging = PagingConfig::default();
        assert_eq!(paging.bookings, 10);
        assert_eq!(paging.search, 10);
    }
}
