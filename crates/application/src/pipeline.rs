//! Request pipeline
//!
//! Middleware around a plain [`HttpTransport`]. It stamps the session's
//! bearer token on every request, turns non-2xx responses into errors and
//! recovers from expired access tokens: the first request to see a 401
//! refreshes the token while every other 401 waits in a queue, and all of
//! them are replayed once the refresh settles.

use std::collections::VecDeque;
use std::sync::Arc;

use datacake_domain::endpoints::{self, is_auth_critical};
use datacake_domain::{ApiRequest, ApiResponse, RefreshRequest, RefreshResponse, TokenPatch};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::auth::AuthSession;
use crate::error::{ApiError, ApiResult};
use crate::ports::{HttpTransport, TransportRequest};
use crate::resolver::BaseUrlResolver;

type Waiter = oneshot::Sender<ApiResult<()>>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: VecDeque<Waiter>,
}

impl RefreshState {
    fn finish(&mut self) -> VecDeque<Waiter> {
        self.in_flight = false;
        std::mem::take(&mut self.waiters)
    }
}

/// Clears the in-flight flag when the driving request stops, however it
/// stops. Waiters of an abandoned refresh are rejected.
struct RefreshGuard<'a> {
    state: &'a Mutex<RefreshState>,
    armed: bool,
}

impl RefreshGuard<'_> {
    fn settle(mut self, outcome: &ApiResult<()>) {
        self.armed = false;
        let waiters = self.state.lock().finish();
        debug!(waiters = waiters.len(), "releasing queued requests");
        for waiter in waiters {
            // A waiter whose request was dropped is simply gone.
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let waiters = self.state.lock().finish();
        warn!(waiters = waiters.len(), "token refresh abandoned");
        for waiter in waiters {
            let _ = waiter.send(Err(ApiError::RefreshAbandoned));
        }
    }
}

/// Sends logical requests and recovers from expired access tokens.
pub struct RequestPipeline {
    transport: Arc<dyn HttpTransport>,
    session: Arc<AuthSession>,
    resolver: Arc<BaseUrlResolver>,
    refresh: Mutex<RefreshState>,
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.refresh.lock();
        f.debug_struct("RequestPipeline")
            .field("refresh_in_flight", &state.in_flight)
            .field("queued", &state.waiters.len())
            .finish_non_exhaustive()
    }
}

impl RequestPipeline {
    /// Creates a pipeline over `transport`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        session: Arc<AuthSession>,
        resolver: Arc<BaseUrlResolver>,
    ) -> Self {
        Self {
            transport,
            session,
            resolver,
            refresh: Mutex::new(RefreshState::default()),
        }
    }

    /// Sends a request, refreshing the access token on a 401.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for non-2xx responses, `ApiError::Transport`
    /// when no response arrives, and `ApiError::RefreshFailed` or
    /// `ApiError::RefreshAbandoned` when an expired token could not be
    /// renewed.
    pub async fn execute(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        match self.dispatch(request).await {
            Err(error) if error.is_unauthorized() => self.recover(request, error).await,
            outcome => outcome,
        }
    }

    async fn recover(&self, request: &ApiRequest, error: ApiError) -> ApiResult<ApiResponse> {
        if is_auth_critical(&request.normalized_path()) {
            debug!(path = %request.path, "401 from an auth endpoint");
            self.session.notify_unauthorized();
            return Err(error);
        }

        let queued = {
            let mut state = self.refresh.lock();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Some(rx)
            } else {
                state.in_flight = true;
                None
            }
        };

        if let Some(rx) = queued {
            debug!(path = %request.path, "waiting for token refresh");
            rx.await.unwrap_or(Err(ApiError::RefreshAbandoned))?;
        } else {
            let guard = RefreshGuard {
                state: &self.refresh,
                armed: true,
            };
            let outcome = self.refresh_tokens().await;
            guard.settle(&outcome);

            if let Err(e) = outcome {
                warn!(error = %e, "token refresh failed");
                self.session.notify_unauthorized();
                return Err(e);
            }
        }

        self.replay(request).await
    }

    async fn replay(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        debug!(path = %request.path, "replaying request with renewed token");
        let outcome = self.dispatch(request).await;
        if outcome.as_ref().is_err_and(ApiError::is_unauthorized) {
            self.session.notify_unauthorized();
        }
        outcome
    }

    async fn refresh_tokens(&self) -> ApiResult<()> {
        let Some(refresh) = self.session.refresh_token() else {
            return Err(ApiError::RefreshFailed("no refresh token".to_string()));
        };

        info!("access token rejected, refreshing");
        let request = ApiRequest::post(endpoints::AUTH_TOKEN_REFRESH).with_json(&RefreshRequest {
            refresh: refresh.clone(),
        })?;

        let response = self
            .dispatch(&request)
            .await
            .map_err(|e| ApiError::RefreshFailed(e.to_string()))?;
        let body: RefreshResponse = response
            .json()
            .map_err(|e| ApiError::RefreshFailed(e.to_string()))?;

        let access = body
            .access
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::RefreshFailed("response has no access token".to_string()))?;
        let rotated = body.refresh.filter(|token| !token.is_empty());
        if rotated.is_none() {
            debug!("refresh token not rotated, keeping the current one");
        }

        self.session
            .set_tokens(&TokenPatch::new().access(access).refresh(rotated.unwrap_or(refresh)));
        Ok(())
    }

    /// Sends one request with the current base URL and credentials.
    async fn dispatch(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let url = request.url_for(&self.resolver.base_url())?;
        let mut outgoing = TransportRequest::new(request.method, url);
        outgoing
            .headers
            .push(("Accept".to_string(), "application/json".to_string()));
        if let Some(authorization) = self.session.authorization_header() {
            outgoing
                .headers
                .push(("Authorization".to_string(), authorization));
        }
        if let Some(body) = &request.body {
            outgoing
                .headers
                .push(("Content-Type".to_string(), "application/json".to_string()));
            outgoing.body = Some(body.clone());
        }

        debug!(method = %request.method, url = %outgoing.url, "dispatching request");
        let response = self.transport.execute(outgoing).await?;

        if response.status.is_success() {
            Ok(response)
        } else {
            debug!(status = %response.status, path = %request.path, "request failed");
            Err(ApiError::Status {
                status: response.status,
                body: response.text(),
            })
        }
    }
}
