//! Client environment.
//!
//! Every feature reducer gets the same injected dependencies.

use crate::api::BackendApi;
use crate::config::{Config, PagingConfig};
use crate::session::{Credentials, SessionStorage};
use busline_core::environment::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Dependencies shared by the feature reducers
///
/// # Type Parameters
///
/// - `B`: Backend implementation (`HttpBackend`, or `MockBackend` in tests)
#[derive(Clone)]
pub struct ClientEnvironment<B: BackendApi> {
    /// Backend client
    pub backend: B,

    /// Durable token/profile storage
    pub session: Arc<dyn SessionStorage>,

    /// Source of "now" for the payment countdown
    pub clock: Arc<dyn Clock>,

    /// In-memory bearer token read by authenticated requests
    pub credentials: Credentials,

    /// Interval between countdown recomputations
    pub countdown_tick: Duration,

    /// Default page sizes
    pub paging: PagingConfig,

    /// Country code used when a form leaves it blank
    pub default_country_code: String,
}

impl<B: BackendApi> ClientEnvironment<B> {
    /// Environment with default tick, paging and country code
    #[must_use]
    pub fn new(backend: B, session: Arc<dyn SessionStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            session,
            clock,
            credentials: Credentials::new(),
            countdown_tick: Duration::from_secs(1),
            paging: PagingConfig::default(),
            default_country_code: "+251".to_string(),
        }
    }

    /// Environment configured from [`Config`]
    #[must_use]
    pub fn from_config(
        config: &Config,
        backend: B,
        session: Arc<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            countdown_tick: config.countdown_tick,
            paging: config.paging,
            default_country_code: config.default_country_code.clone(),
            ..Self::new(backend, session, clock)
        }
    }

    /// Share the token slot with another environment
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Override the countdown tick
    #[must_use]
    pub fn with_countdown_tick(mut self, tick: Duration) -> Self {
        self.countdown_tick = tick;
        self
    }
}

impl<B: BackendApi> std::fmt::Debug for ClientEnvironment<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientEnvironment")
            .field("authenticated", &self.credentials.is_authenticated())
            .field("countdown_tick", &self.countdown_tick)
            .field("paging", &self.paging)
            .finish_non_exhaustive()
    }
}
