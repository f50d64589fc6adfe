//! Tracktry multi-carrier tracking API
//!
//! Requires an API key (`TRACKTRY_API_KEY`). Without one the factory
//! refuses and the provider is left out of the chain.

use async_trait::async_trait;
use parcel_core::{
    Carrier, Error, Event, Result, TrackerConfig, TrackingNumber, TrackingProvider,
    TrackingProviderFactory, TrackingResult,
};
use parcel_core::normalize::{text, text_or};
use reqwest::Client;
use serde_json::Value;

use crate::http;

const PROVIDER: &str = "tracktry";
const API_BASE: &str = "https://api.tracktry.com/v1";
const API_KEY_HEADER: &str = "Tracktry-Api-Key";

/// Tracktry provider
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
pub struct TracktryProvider {
    /// ⚠️ NEVER log this value
    api_key: String,
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for TracktryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracktryProvider")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TracktryProvider {
    /// Create a provider against the public API
    ///
    /// Fails with a configuration error when the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, API_BASE)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("Tracktry API key cannot be empty"));
        }
        Ok(Self {
            api_key,
            client: http::build_client(PROVIDER)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl TrackingProvider for TracktryProvider {
    async fn track(
        &self,
        number: &TrackingNumber,
        hint: Option<Carrier>,
    ) -> Result<Option<TrackingResult>> {
        let url = format!("{}/trackings/{}", self.base_url.trim_end_matches('/'), number);
        tracing::debug!(provider = PROVIDER, url = %url, "GET");

        let request = self.client.get(&url).header(API_KEY_HEADER, &self.api_key);
        match http::send_json(PROVIDER, request).await? {
            Some(json) => Ok(parse_response(&json, hint)),
            None => Ok(None),
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map a Tracktry answer to a tracking result
///
/// Only `code == 200` carries data. The carrier falls back to the hint when
/// Tracktry does not name one.
pub fn parse_response(json: &Value, hint: Option<Carrier>) -> Option<TrackingResult> {
    if json["code"].as_i64() != Some(200) {
        return None;
    }
    let data = &json["data"];

    let events = data["origin_info"]["trackinfo"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| Event {
                    timestamp: text(&item["Date"]),
                    status: text(&item["StatusDescription"]),
                    location: text(&item["Details"]),
                    description: text(&item["checkpoint_status"]),
                })
                .collect()
        })
        .unwrap_or_default();

    let carrier = Some(text(&data["carrier_code"]))
        .filter(|c| !c.is_empty())
        .or_else(|| hint.map(|c| c.code().to_string()));

    Some(TrackingResult {
        carrier,
        provider: PROVIDER.to_string(),
        status: text_or(&data["status_description"], "Unknown"),
        events,
    })
}

/// Factory for the Tracktry provider
pub struct TracktryFactory;

impl TrackingProviderFactory for TracktryFactory {
    fn create(&self, config: &TrackerConfig) -> Result<Box<dyn TrackingProvider>> {
        let key = config
            .providers
            .tracktry_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config("TRACKTRY_API_KEY not set"))?;
        Ok(Box::new(TracktryProvider::new(key)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_core::testing;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "code": 200,
            "data": {
                "carrier_code": "dhl",
                "status_description": "In transit",
                "origin_info": {
                    "trackinfo": [
                        {"Date": "2024-03-02 08:00", "StatusDescription": "Arrived at hub", "Details": "Leipzig", "checkpoint_status": "transit"},
                        {"Date": "2024-03-01 17:30", "StatusDescription": "Shipment picked up", "checkpoint_status": "pickup"}
                    ]
                }
            }
        })
    }

    #[test]
    fn parses_trackinfo() {
        let result = parse_response(&sample(), None).unwrap();
        assert_eq!(result.carrier.as_deref(), Some("dhl"));
        assert_eq!(result.status, "In transit");
        assert_eq!(
            result.events[0],
            Event::new("2024-03-02 08:00", "Arrived at hub", "Leipzig", "transit")
        );
        assert_eq!(result.events[1].location, "");
    }

    #[test]
    fn carrier_falls_back_to_hint() {
        let json = json!({"code": 200, "data": {"origin_info": {"trackinfo": []}}});
        let result = parse_response(&json, Some(Carrier::Dhl)).unwrap();
        assert_eq!(result.carrier.as_deref(), Some("dhl"));
        assert_eq!(result.status, "Unknown");
        assert!(result.events.is_empty());
    }

    #[test]
    fn non_200_code_is_no_result() {
        assert!(parse_response(&json!({"code": 4031, "message": "not found"}), None).is_none());
    }

    #[test]
    fn factory_requires_key() {
        let err = TracktryFactory.create(&TrackerConfig::default()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));

        let mut config = TrackerConfig::default();
        config.providers.tracktry_api_key = Some("  ".into());
        assert!(TracktryFactory.create(&config).is_err());

        config.providers.tracktry_api_key = Some("key".into());
        assert_eq!(TracktryFactory.create(&config).unwrap().provider_name(), "tracktry");
    }

    #[test]
    fn api_key_not_exposed_in_debug() {
        let provider = TracktryProvider::new("secret_key_12345").unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("secret_key"));
        assert!(debug.contains("TracktryProvider"));
    }

    #[tokio::test]
    async fn sends_key_header() {
        let server = testing::serve("200 OK", &sample().to_string()).await;
        let provider = TracktryProvider::with_base_url("k-123", server.base_url()).unwrap();
        let number = TrackingNumber::parse("JD014600003828527351").unwrap();

        let result = provider.fetch(&number, Some(Carrier::Dhl)).await.unwrap();
        assert_eq!(result.events.len(), 2);
        let request = server.requests()[0].to_lowercase();
        assert!(request.starts_with("get /trackings/jd014600003828527351 "));
        assert!(request.contains("tracktry-api-key: k-123"));
    }
}
