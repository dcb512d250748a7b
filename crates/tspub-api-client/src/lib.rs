//! HTTP client for the marketplace publishing API.
//!
//! Provides a minimal client with configurable auth (`Token` or `Bearer`
//! scheme), JSON:API request helpers, and the [`PublishingApi`]
//! implementation used by the publishing pipeline.

pub mod api;
pub mod jsonapi;
pub mod traits;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tspub_core::{PublishError, PublishResult, Settings};

pub use traits::PublishingApi;

/// Accept header value pinning the API version.
pub const ACCEPT: &str = "application/vnd.api+json; com.turbosquid.api.version=1";

/// Authentication strategy for the API.
#[derive(Clone)]
pub enum Auth {
    /// `Authorization: Token {token}`
    Token(String),
    /// `Authorization: Bearer {token}`
    Bearer(String),
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Token(_) => f.write_str("Token(<redacted>)"),
            Auth::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// HTTP client for the publishing API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth, timeout: Duration) -> PublishResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Create a client from operator settings, using the `Token` scheme.
    pub fn from_settings(settings: &Settings) -> PublishResult<Self> {
        Self::new(
            settings.server.clone(),
            Auth::Token(settings.token.clone()),
            settings.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_headers(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.auth {
            Auth::Token(token) => request.header("Authorization", format!("Token {}", token)),
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
        };
        request
            .header("Accept", ACCEPT)
            .header("Content-Type", "application/json")
    }

    /// Send a request and fail on transport errors or non-2xx statuses.
    async fn send(&self, request: RequestBuilder, operation: &str) -> PublishResult<Response> {
        let response = self
            .apply_headers(request)
            .send()
            .await
            .map_err(|e| PublishError::Network(format!("{}: {}", operation, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::debug!(
                operation = operation,
                status = status.as_u16(),
                body = %error_text,
                "Request rejected"
            );
            return Err(PublishError::from_status(status.as_u16(), error_text));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response, operation: &str) -> PublishResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PublishError::Network(format!("{}: {}", operation, e)))?;

        tracing::debug!(
            operation = operation,
            status = status.as_u16(),
            body = %body,
            "Response received"
        );

        serde_json::from_str(&body)
            .map_err(|e| PublishError::Decode(format!("{}: {}", operation, e)))
    }

    /// GET request. Deserializes the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, operation: &str) -> PublishResult<T> {
        let request = self.client.get(self.build_url(path));
        let response = self.send(request, operation).await?;
        Self::decode(response, operation).await
    }

    /// POST JSON body and deserialize the response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        operation: &str,
    ) -> PublishResult<T> {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self.send(request, operation).await?;
        Self::decode(response, operation).await
    }

    /// POST JSON body, only checking the status. The response body is ignored.
    pub async fn post_unit<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        operation: &str,
    ) -> PublishResult<()> {
        let request = self.client.post(self.build_url(path)).json(body);
        self.send(request, operation).await?;
        Ok(())
    }

    /// POST without a body and deserialize the response.
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        operation: &str,
    ) -> PublishResult<T> {
        let request = self.client.post(self.build_url(path));
        let response = self.send(request, operation).await?;
        Self::decode(response, operation).await
    }
}
