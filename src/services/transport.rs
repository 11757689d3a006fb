use std::time::Duration;

use anyhow::Result;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, ProviderErrorKind};

/// Shared HTTP client; provider handles clone it, which only bumps a refcount.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Sends a provider request and turns non-2xx answers into classified errors.
pub async fn send(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<Response, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::from_transport(provider, &e))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::from_status(provider, status.as_u16(), body))
}

pub async fn read_json<T: DeserializeOwned>(
    provider: &'static str,
    response: Response,
) -> Result<T, ProviderError> {
    response.json().await.map_err(|e| {
        ProviderError::new(
            provider,
            ProviderErrorKind::Transient,
            format!("unreadable response: {e}"),
        )
    })
}
