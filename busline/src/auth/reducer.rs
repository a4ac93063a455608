//! Auth reducer.

use crate::api::BackendApi;
use crate::auth::{AuthAction, AuthState};
use crate::environment::ClientEnvironment;
use crate::error::{ApiError, ValidationError};
use crate::types::{LoginRequest, RegisterRequest};
use busline_core::async_effect;
use busline_core::{effect::Effect, reducer::Reducer};
use smallvec::{smallvec, SmallVec};
use std::marker::PhantomData;
use std::sync::Arc;

/// Reducer for login, registration, profile and logout
#[derive(Debug, Clone)]
pub struct AuthReducer<B> {
    _backend: PhantomData<B>,
}

impl<B> AuthReducer<B> {
    /// Create a new auth reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B> Default for AuthReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

fn normalize_login(mut request: LoginRequest, default_country_code: &str) -> Result<LoginRequest, ValidationError> {
    required(&request.mobile_number, "Mobile number")?;
    required(&request.password, "Password")?;

    request.mobile_number = request.mobile_number.trim().to_string();
    if request.country_code.trim().is_empty() {
        request.country_code = default_country_code.to_string();
    }
    Ok(request)
}

fn normalize_registration(
    mut request: RegisterRequest,
    default_country_code: &str,
) -> Result<RegisterRequest, ValidationError> {
    required(&request.first_name, "First name")?;
    required(&request.last_name, "Last name")?;
    required(&request.mobile_number, "Mobile number")?;
    required(&request.password, "Password")?;

    request.first_name = request.first_name.trim().to_string();
    request.last_name = request.last_name.trim().to_string();
    request.mobile_number = request.mobile_number.trim().to_string();
    request.email = request.email.trim().to_string();
    if request.country_code.trim().is_empty() {
        request.country_code = default_country_code.to_string();
    }
    Ok(request)
}

/// Fetch the profile for `token`, persisting it on success and dropping the
/// token when the backend rejects it
fn fetch_profile<B: BackendApi>(env: &ClientEnvironment<B>, token: String) -> Effect<AuthAction> {
    let backend = env.backend.clone();
    let session = Arc::clone(&env.session);
    let credentials = env.credentials.clone();

    async_effect! {
        match backend.profile(&token).await {
            Ok(user) => {
                if let Err(error) = session.save_user(&user) {
                    tracing::warn!(%error, "Failed to persist profile");
                }
                Some(AuthAction::ProfileLoaded(user))
            },
            Err(error) => {
                if error.requires_login() {
                    credentials.clear();
                    if let Err(error) = session.clear() {
                        tracing::warn!(%error, "Failed to clear session");
                    }
                }
                Some(AuthAction::ProfileFailed(error))
            },
        }
    }
}

impl<B: BackendApi> Reducer for AuthReducer<B> {
    type State = AuthState;
    type Action = AuthAction;
    type Environment = ClientEnvironment<B>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AuthAction::RestoreSession => {
                let session = Arc::clone(&env.session);
                let credentials = env.credentials.clone();

                smallvec![async_effect! {
                    let restored = match session.load() {
                        Ok(Some(stored)) => {
                            credentials.set(stored.token);
                            Some(stored.user)
                        },
                        Ok(None) => None,
                        Err(error) => {
                            tracing::warn!(%error, "Ignoring unreadable session");
                            None
                        },
                    };
                    Some(AuthAction::SessionRestored(restored))
                }]
            },

            AuthAction::SessionRestored(user) => {
                state.restored = true;
                if let Some(user) = user {
                    tracing::debug!(passenger = %user.passenger_guid, "Session restored");
                    state.authenticated = true;
                    state.user = Some(user);
                }
                smallvec![Effect::None]
            },

            AuthAction::Login(request) => {
                let request = match normalize_login(request, &env.default_country_code) {
                    Ok(request) => request,
                    Err(error) => {
                        state.error = Some(error.into());
                        return smallvec![Effect::None];
                    },
                };

                state.loading = true;
                state.error = None;

                let backend = env.backend.clone();
                let session = Arc::clone(&env.session);
                let credentials = env.credentials.clone();

                smallvec![async_effect! {
                    match backend.login(request).await {
                        Ok(token) => {
                            if let Err(error) = session.save_token(&token) {
                                tracing::warn!(%error, "Failed to persist token");
                            }
                            credentials.set(token);
                            Some(AuthAction::LoginSucceeded)
                        },
                        Err(error) => Some(AuthAction::LoginFailed(error)),
                    }
                }]
            },

            AuthAction::LoginSucceeded => {
                state.authenticated = true;
                match env.credentials.token() {
                    Some(token) => smallvec![fetch_profile(env, token)],
                    None => {
                        state.loading = false;
                        state.authenticated = false;
                        state.error = Some(ApiError::Unauthenticated);
                        smallvec![Effect::None]
                    },
                }
            },

            AuthAction::LoginFailed(error) => {
                tracing::debug!(%error, "Login failed");
                state.loading = false;
                state.error = Some(error);
                smallvec![Effect::None]
            },

            AuthAction::Register(request) => {
                let request = match normalize_registration(request, &env.default_country_code) {
                    Ok(request) => request,
                    Err(error) => {
                        state.error = Some(error.into());
                        return smallvec![Effect::None];
                    },
                };

                state.loading = true;
                state.error = None;
                state.registered = None;

                let backend = env.backend.clone();
                smallvec![async_effect! {
                    Some(match backend.register(request).await {
                        Ok(passenger) => AuthAction::Registered(passenger),
                        Err(error) => AuthAction::RegisterFailed(error),
                    })
                }]
            },

            AuthAction::Registered(passenger) => {
                state.loading = false;
                state.registered = Some(passenger);
                smallvec![Effect::None]
            },

            AuthAction::RegisterFailed(error) => {
                state.loading = false;
                state.error = Some(error);
                smallvec![Effect::None]
            },

            AuthAction::LoadProfile => match env.credentials.token() {
                Some(token) => {
                    state.loading = true;
                    state.error = None;
                    smallvec![fetch_profile(env, token)]
                },
                None => {
                    state.error = Some(ApiError::Unauthenticated);
                    smallvec![Effect::None]
                },
            },

            AuthAction::ProfileLoaded(user) => {
                state.loading = false;
                state.authenticated = true;
                state.error = None;
                state.user = Some(user);
                smallvec![Effect::None]
            },

            AuthAction::ProfileFailed(error) => {
                state.loading = false;
                if error.requires_login() {
                    state.authenticated = false;
                    state.user = None;
                }
                state.error = Some(error);
                smallvec![Effect::None]
            },

            AuthAction::Logout => {
                *state = AuthState {
                    restored: true,
                    ..AuthState::default()
                };

                let session = Arc::clone(&env.session);
                let credentials = env.credentials.clone();

                smallvec![async_effect! {
                    credentials.clear();
                    if let Err(error) = session.clear() {
                        tracing::warn!(%error, "Failed to clear session");
                    }
                    None
                }]
            },

            AuthAction::ClearError => {
                state.error = None;
                smallvec![Effect::None]
            },
        }
    }
}
