//! Shared HTTP plumbing for the carrier endpoints

use parcel_core::{DEFAULT_HTTP_TIMEOUT, Error, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

/// Build a client with the default timeout and an optional User-Agent
pub(crate) fn build_client(provider: &str, user_agent: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder().timeout(DEFAULT_HTTP_TIMEOUT);
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }
    builder
        .build()
        .map_err(|e| Error::config(format!("{}: failed to build HTTP client: {}", provider, e)))
}

/// Issue a GET and map the status line.
///
/// A 404 means the carrier does not know the parcel and yields `None`.
pub(crate) async fn get(client: &Client, provider: &str, url: &str) -> Result<Option<Response>> {
    tracing::debug!(provider, url, "GET");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::http(format!("{}: request failed: {}", provider, e)))?;

    match response.status() {
        status if status.is_success() => Ok(Some(response)),
        StatusCode::NOT_FOUND => Ok(None),
        StatusCode::TOO_MANY_REQUESTS => Err(Error::provider(provider, "Rate limited")),
        status if status.is_server_error() => {
            Err(Error::http(format!("{}: server error {}", provider, status)))
        }
        status => Err(Error::provider(provider, format!("Unexpected status {}", status))),
    }
}

/// GET a JSON document
pub(crate) async fn get_json(client: &Client, provider: &str, url: &str) -> Result<Option<Value>> {
    let Some(response) = get(client, provider, url).await? else {
        return Ok(None);
    };
    response
        .json()
        .await
        .map(Some)
        .map_err(|e| Error::parse(format!("{}: invalid JSON response: {}", provider, e)))
}
