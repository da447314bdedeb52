//! Shared HTTP client for every external collaborator
//!
//! One `ClientWithMiddleware` is built from [`HttpConfig`] and cloned into each
//! adapter: a bounded per-call timeout, a descriptive user agent and
//! exponential-backoff retries for transient failures.

use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::{Result, SkiScoutError};

/// Build the shared client from configuration
pub fn build_client(config: &HttpConfig) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds.into()))
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| SkiScoutError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Outcome of a JSON request that distinguishes "not found" from other failures
#[derive(Debug)]
pub enum Fetched<T> {
    Found(T),
    NotFound,
}

/// Send a request and decode the JSON body. 404 maps to [`Fetched::NotFound`].
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<Fetched<T>> {
    let start = Instant::now();
    let response = request.send().await?;
    let status = response.status();
    debug!(
        "{} responded {} in {:.3}s",
        what,
        status,
        start.elapsed().as_secs_f64()
    );

    if status == StatusCode::NOT_FOUND {
        return Ok(Fetched::NotFound);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("{} failed with status {}", what, status);
        return Err(SkiScoutError::api(format!(
            "{what} returned {status}: {}",
            body.chars().take(200).collect::<String>()
        )));
    }

    let value = response
        .json::<T>()
        .await
        .map_err(|e| SkiScoutError::api(format!("Failed to parse {what} response: {e}")))?;
    Ok(Fetched::Found(value))
}

/// Like [`send_json`] but treats 404 as an error
pub async fn get_json<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<T> {
    match send_json(request, what).await? {
        Fetched::Found(value) => Ok(value),
        Fetched::NotFound => Err(SkiScoutError::api(format!("{what} returned 404 Not Found"))),
    }
}
