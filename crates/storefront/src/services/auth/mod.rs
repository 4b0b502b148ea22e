//! Authentication service.
//!
//! Keeps the backend session and the local [`AuthStore`] in step: a
//! successful login or registration persists the token and profile, a
//! successful logout clears them and fires the session-cleared listeners.

mod error;

pub use error::AuthError;

use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError};
use crate::api::types::{AuthPayload, SuccessResponse, User};
use crate::forms::{AuthField, FormField, RegisterField, validate_login, validate_register};
use crate::session::AuthStore;

/// Authentication service.
pub struct AuthService<'a> {
    api: &'a ApiClient,
    auth: &'a AuthStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(api: &'a ApiClient, auth: &'a AuthStore) -> Self {
        Self { api, auth }
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Form` if a field breaks a local rule or the backend
    /// rejects it, `AuthError::Api` for any other backend failure, and
    /// `AuthError::Storage` if the session cannot be persisted.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError<AuthField>> {
        let credentials = validate_login(email, password)?;
        let response = self.api.login(&credentials).await.map_err(log_failure)?;
        self.start_session(response)
    }

    /// Create an account and sign in to it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Form` if a field breaks a local rule or the backend
    /// rejects it (e.g. the email is taken), `AuthError::Api` for any other
    /// backend failure, and `AuthError::Storage` if the session cannot be
    /// persisted.
    #[instrument(skip(self, password, confirm_password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, AuthError<RegisterField>> {
        let credentials = validate_register(email, password, confirm_password)?;
        let response = self.api.register(&credentials).await.map_err(log_failure)?;
        self.start_session(response)
    }

    /// End the session on the backend, then locally.
    ///
    /// Returns the backend's message.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Api` if the backend call fails (local state is then
    /// kept, except on a 401 which always clears it) and `AppError::Storage`
    /// if the stored session cannot be removed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> crate::error::Result<String> {
        let message = self
            .api
            .logout()
            .await
            .inspect_err(|e| warn!(error = %e, "Logout request failed"))?;
        self.auth.clear()?;
        info!("Logged out");
        Ok(message)
    }

    fn start_session<F: FormField>(
        &self,
        response: SuccessResponse<AuthPayload>,
    ) -> Result<User, AuthError<F>> {
        let AuthPayload {
            access_token, user, ..
        } = response.data;
        self.auth.sign_in(access_token, user.clone())?;
        info!(user_id = %user.id, "Signed in");
        Ok(user)
    }
}

/// Log a backend failure and convert it for the form `F`.
fn log_failure<F: FormField>(error: ApiError) -> AuthError<F> {
    if !error.is_unprocessable_entity() {
        warn!(error = %error, "Auth request failed");
    }
    AuthError::from(error)
}
