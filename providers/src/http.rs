//! Shared HTTP plumbing.

use farmlink_core::ProviderError;
use reqwest::{Client, Response};
use std::time::Duration;

/// Build an HTTP client whose every request is bounded by `timeout`.
///
/// # Errors
///
/// Returns [`ProviderError::Request`] if the TLS backend cannot be initialised.
pub fn build_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("farmlink/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::Request {
            provider: "http".to_string(),
            message: e.to_string(),
        })
}

/// Classify a transport failure. The request URL is stripped from the
/// message since some providers carry credentials in the query string.
pub(crate) fn transport_error(provider: &str, e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout {
            provider: provider.to_string(),
        }
    } else {
        ProviderError::Request {
            provider: provider.to_string(),
            message: e.without_url().to_string(),
        }
    }
}

/// Fail on non-2xx, logging the upstream body without exposing it.
pub(crate) async fn ensure_success(provider: &str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(provider, status = status.as_u16(), body = %body, "Provider request rejected");
    Err(ProviderError::Http {
        provider: provider.to_string(),
        status: status.as_u16(),
    })
}

/// Decode a JSON body.
pub(crate) async fn decode<T: serde::de::DeserializeOwned>(
    provider: &str,
    response: Response,
) -> Result<T, ProviderError> {
    response.json::<T>().await.map_err(|e| ProviderError::InvalidResponse {
        provider: provider.to_string(),
        message: e.without_url().to_string(),
    })
}
