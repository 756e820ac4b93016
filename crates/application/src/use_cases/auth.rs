//! Account use cases: login, logout, profile, registration and recovery.

use std::sync::Arc;

use datacake_domain::endpoints;
use datacake_domain::{
    ApiRequest, Credentials, EmailAddress, EmailVerification, PasswordResetConfirmation,
    Registration, TokenPair, TokenPatch, UserProfile, token_preview,
};
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};

/// Account operations over an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    /// Creates the use case.
    #[must_use]
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Exchanges credentials for a token pair and stores it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::IncompleteLogin` when the response lacks either
    /// token, or whatever the request itself failed with.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<()> {
        let pair: TokenPair = self.client.post(endpoints::AUTH_TOKEN, credentials).await?;

        let (Some(access), Some(refresh)) = (
            pair.access.filter(|t| !t.is_empty()),
            pair.refresh.filter(|t| !t.is_empty()),
        ) else {
            return Err(ApiError::IncompleteLogin);
        };

        info!(
            identifier = %credentials.identifier,
            access = %token_preview(&access),
            "logged in"
        );
        self.client.set_tokens(&TokenPatch::both(access, refresh));
        Ok(())
    }

    /// Tells the backend the session ended, then drops the tokens.
    ///
    /// The tokens are cleared even if the backend call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.client.send(&ApiRequest::post(endpoints::AUTH_LOGOUT)).await {
            warn!(error = %e, "logout request failed");
        }
        self.client.clear_tokens();
        info!("logged out");
    }

    /// The profile of the logged-in user, or `None` without a session.
    ///
    /// # Errors
    ///
    /// Fails like [`ApiClient::fetch`].
    pub async fn current_user(&self) -> ApiResult<Option<UserProfile>> {
        if self.client.get_tokens().access_token.is_none() {
            return Ok(None);
        }
        self.client.get(endpoints::AUTH_ME).await.map(Some)
    }

    /// Creates an account. The backend then emails a verification code.
    ///
    /// # Errors
    ///
    /// Field validation failures come back as `ApiError::Status`; see
    /// [`ApiError::server_message`].
    pub async fn register(&self, registration: &Registration) -> ApiResult<()> {
        self.post_form(endpoints::AUTH_REGISTER, registration).await
    }

    /// Confirms an email address with the code the backend sent.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for a wrong or expired code.
    pub async fn verify_email(&self, email: &str, code: &str) -> ApiResult<()> {
        let payload = EmailVerification {
            email: email.to_string(),
            code: code.to_string(),
        };
        self.post_form(endpoints::AUTH_VERIFY, &payload).await
    }

    /// Sends a new verification code.
    ///
    /// # Errors
    ///
    /// Fails like [`ApiClient::send`].
    pub async fn resend_code(&self, email: &str) -> ApiResult<()> {
        self.post_form(endpoints::AUTH_RESEND, &email_payload(email))
            .await
    }

    /// Starts the password recovery flow.
    ///
    /// # Errors
    ///
    /// Fails like [`ApiClient::send`].
    pub async fn request_password_reset(&self, email: &str) -> ApiResult<()> {
        self.post_form(endpoints::AUTH_PASSWORD_RESET, &email_payload(email))
            .await
    }

    /// Sets a new password using the recovery code.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for a wrong code or a rejected password.
    pub async fn confirm_password_reset(
        &self,
        email: &str,
        code: &str,
        password: &str,
    ) -> ApiResult<()> {
        let payload = PasswordResetConfirmation {
            email: email.to_string(),
            code: code.to_string(),
            password: password.to_string(),
        };
        self.post_form(endpoints::AUTH_PASSWORD_CONFIRM, &payload)
            .await
    }

    async fn post_form<B: serde::Serialize + Sync>(&self, path: &str, payload: &B) -> ApiResult<()> {
        let request = ApiRequest::post(path).with_json(payload)?;
        self.client.send(&request).await.map(|_| ())
    }
}

fn email_payload(email: &str) -> EmailAddress {
    EmailAddress {
        email: email.to_string(),
    }
}
