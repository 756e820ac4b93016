//! The client session object.
//!
//! [`ApiClient`] owns the auth session, the base-URL resolver and the
//! request pipeline. Build one per process; dropping it tears everything
//! down.

use std::sync::Arc;

use datacake_domain::{
    ApiRequest, ApiResponse, AuthTokens, BaseUrlMeta, HttpMethod, TokenPatch,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::{AuthSession, Subscription, TokenStore};
use crate::error::{ApiError, ApiResult};
use crate::pipeline::RequestPipeline;
use crate::ports::{EnvironmentHints, HttpTransport};
use crate::resolver::{BaseUrlResolution, BaseUrlResolver, ResolverConfig};

/// Entry point used by the presentation layer.
#[derive(Debug)]
pub struct ApiClient {
    session: Arc<AuthSession>,
    resolver: Arc<BaseUrlResolver>,
    pipeline: RequestPipeline,
}

impl ApiClient {
    /// Wires a client: hydrates tokens from `store` and resolves the
    /// initial base URL.
    #[must_use]
    pub fn new(
        config: ResolverConfig,
        store: TokenStore,
        hints: Arc<dyn EnvironmentHints>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let session = Arc::new(AuthSession::new(store));
        let resolver = Arc::new(BaseUrlResolver::new(config, hints, transport.clone()));
        let pipeline = RequestPipeline::new(transport, session.clone(), resolver.clone());

        Self {
            session,
            resolver,
            pipeline,
        }
    }

    /// Sends a logical request.
    ///
    /// # Errors
    ///
    /// See [`RequestPipeline::execute`].
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        query: &[(&str, &str)],
    ) -> ApiResult<ApiResponse> {
        let mut request = ApiRequest::new(method, path);
        request.body = body;
        for (key, value) in query {
            request = request.with_query(*key, *value);
        }
        self.send(&request).await
    }

    /// Sends a prepared request.
    ///
    /// # Errors
    ///
    /// See [`RequestPipeline::execute`].
    pub async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        self.pipeline.execute(request).await
    }

    /// Sends a prepared request and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::send`], or with `ApiError::Decode` when the body
    /// does not match `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, request: &ApiRequest) -> ApiResult<T> {
        let response = self.send(request).await?;
        response
            .json()
            .map_err(|e| ApiError::Decode(format!("{}: {e}", request.path)))
    }

    /// `GET path`, decoded.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.fetch(&ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body, decoded.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.fetch(&ApiRequest::post(path).with_json(body)?).await
    }

    /// `PATCH path` with a JSON body, decoded.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch`].
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.fetch(&ApiRequest::patch(path).with_json(body)?).await
    }

    /// `DELETE path`, ignoring any response body.
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(&ApiRequest::delete(path)).await.map(|_| ())
    }

    /// Snapshot of the current tokens.
    #[must_use]
    pub fn get_tokens(&self) -> AuthTokens {
        self.session.tokens()
    }

    /// Merges a token patch into the session.
    pub fn set_tokens(&self, patch: &TokenPatch) {
        self.session.set_tokens(patch);
    }

    /// Logs out locally: drops both tokens and the auth header.
    pub fn clear_tokens(&self) {
        self.session.clear();
    }

    /// Snapshot of the base-URL metadata.
    #[must_use]
    pub fn base_url_meta(&self) -> BaseUrlMeta {
        self.resolver.meta()
    }

    /// Probes for a reachable backend if still on the fallback address.
    pub async fn ensure_base_url_resolved(&self) -> BaseUrlResolution {
        self.resolver.ensure_resolved().await
    }

    /// Points the client at a user-supplied backend URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Domain` if the URL is not an absolute http(s) URL.
    pub fn set_manual_base_url(&self, url: &str) -> ApiResult<BaseUrlMeta> {
        Ok(self.resolver.set_manual(url)?)
    }

    /// Registers a callback for the end of the session.
    pub fn subscribe_unauthorized<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.session.subscribe_unauthorized(listener)
    }
}
