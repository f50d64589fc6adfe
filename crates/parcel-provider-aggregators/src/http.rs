//! Shared HTTP plumbing for the keyed aggregator APIs

use parcel_core::{DEFAULT_HTTP_TIMEOUT, Error, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

pub(crate) fn build_client(provider: &str) -> Result<Client> {
    Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::config(format!("{}: failed to build HTTP client: {}", provider, e)))
}

/// Send a request and decode the JSON body.
///
/// Status mapping:
/// - 401/403: the API key was rejected
/// - 404: the aggregator does not know the parcel (`None`)
/// - 429: rate limited
/// - 5xx: transient server error
pub(crate) async fn send_json(provider: &str, request: RequestBuilder) -> Result<Option<Value>> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::http(format!("{}: request failed: {}", provider, e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return match status.as_u16() {
            401 | 403 => Err(Error::provider(
                provider,
                format!("Authentication failed: API key rejected. Status: {}", status),
            )),
            404 => Ok(None),
            429 => Err(Error::provider(
                provider,
                format!("Rate limit exceeded. Status: {}", status),
            )),
            500..=599 => Err(Error::http(format!(
                "{}: server error (transient): {} - {}",
                provider, status, body
            ))),
            _ => Err(Error::provider(
                provider,
                format!("Request failed: {} - {}", status, body),
            )),
        };
    }

    response
        .json()
        .await
        .map(Some)
        .map_err(|e| Error::parse(format!("{}: invalid JSON response: {}", provider, e)))
}
