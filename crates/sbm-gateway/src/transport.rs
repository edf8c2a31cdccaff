//! Shared HTTP plumbing: authenticated client, endpoint joining and retry
//!
//! GET requests are idempotent and are retried on transport failures and on
//! 502/503/504. POST requests are retried only when the connection could not
//! be established, so a request the service may have seen is never resent.

use crate::config::{GatewayConfig, RetryPolicy};
use crate::error::{GatewayError, GatewayResult};
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) const NO_QUERY: &[(&str, &str)] = &[];

#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub(crate) fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let mut headers = header::HeaderMap::new();
        let token = header::HeaderValue::from_str(&format!("Token {}", config.token))
            .map_err(|error| GatewayError::Config(format!("token is not a valid header: {error}")))?;
        headers.insert(header::AUTHORIZATION, token);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| GatewayError::Config(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            retry: config.retry,
        })
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let suffix = path.trim_start_matches('/');
        format!("{base}/{suffix}")
    }

    pub(crate) async fn get<Q>(&self, url: &str, query: &Q) -> GatewayResult<Response>
    where
        Q: Serialize + ?Sized,
    {
        self.send(Method::GET, url, || self.client.get(url).query(query))
            .await
    }

    pub(crate) async fn get_json<T, Q>(&self, url: &str, query: &Q) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.get(url, query).await?;
        decode(url, response).await
    }

    pub(crate) async fn post_json<T, B>(&self, url: &str, body: &B) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .send(Method::POST, url, || self.client.post(url).json(body))
            .await?;
        decode(url, response).await
    }

    pub(crate) async fn post<B>(&self, url: &str, body: &B) -> GatewayResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, url, || self.client.post(url).json(body))
            .await
            .map(drop)
    }

    async fn send<F>(&self, method: Method, url: &str, build: F) -> GatewayResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let idempotent = method == Method::GET;
        let mut attempt = 1;

        loop {
            tracing::debug!(%method, url, attempt, "sending request");

            match build().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if idempotent && retryable_status(status) && attempt < self.retry.max_attempts {
                        tracing::warn!(%method, url, attempt, %status, "retrying after status");
                        self.pause().await;
                        attempt += 1;
                        continue;
                    }
                    let body = response.text().await.unwrap_or_default();
                    return Err(GatewayError::status(status.as_u16(), body));
                }
                Err(error) => {
                    let retryable = if idempotent {
                        transient(&error)
                    } else {
                        error.is_connect()
                    };
                    if retryable && attempt < self.retry.max_attempts {
                        tracing::warn!(%method, url, attempt, %error, "retrying after transport error");
                        self.pause().await;
                        attempt += 1;
                        continue;
                    }
                    return Err(GatewayError::Transport {
                        attempts: attempt,
                        source: error,
                    });
                }
            }
        }
    }

    async fn pause(&self) {
        if !self.retry.delay.is_zero() {
            tokio::time::sleep(self.retry.delay).await;
        }
    }
}

fn transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}

fn retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> GatewayResult<T> {
    let body = response
        .text()
        .await
        .map_err(|error| GatewayError::decode(url, error))?;
    serde_json::from_str(&body).map_err(|error| GatewayError::decode(url, error))
}
