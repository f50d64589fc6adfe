//! 17TRACK tracking API (v2.2)
//!
//! Requires an API key, read from `SEVENTEEN_TRACK_API_KEY` or
//! `17TRACK_API_KEY`.

use async_trait::async_trait;
use parcel_core::{
    Carrier, Error, Event, Result, TrackerConfig, TrackingNumber, TrackingProvider,
    TrackingProviderFactory, TrackingResult,
};
use parcel_core::normalize::{text, text_or};
use reqwest::Client;
use serde_json::{Value, json};

use crate::http;

const PROVIDER: &str = "17track";
const API_BASE: &str = "https://api.17track.net/track/v2.2";
const TOKEN_HEADER: &str = "17token";

/// 17TRACK provider
///
/// The Debug implementation does NOT expose the API key.
pub struct SeventeenTrackProvider {
    api_key: String,
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for SeventeenTrackProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeventeenTrackProvider")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SeventeenTrackProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, API_BASE)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("17TRACK API key cannot be empty"));
        }
        Ok(Self {
            api_key,
            client: http::build_client(PROVIDER)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl TrackingProvider for SeventeenTrackProvider {
    async fn track(
        &self,
        number: &TrackingNumber,
        hint: Option<Carrier>,
    ) -> Result<Option<TrackingResult>> {
        let url = format!("{}/gettrackinfo", self.base_url.trim_end_matches('/'));
        tracing::debug!(provider = PROVIDER, url = %url, "POST");

        let request = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, &self.api_key)
            .json(&json!({ "number": number.as_str() }));
        match http::send_json(PROVIDER, request).await? {
            Some(body) => Ok(parse_response(&body, hint)),
            None => Ok(None),
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map a 17TRACK answer to a tracking result
///
/// Only `code == 0` with a non-empty `data` array carries a parcel; events
/// are read from the first upstream provider 17TRACK reports.
pub fn parse_response(json: &Value, hint: Option<Carrier>) -> Option<TrackingResult> {
    if json["code"].as_i64() != Some(0) {
        return None;
    }
    let info = json["data"].as_array()?.first()?;
    let track_info = &info["track_info"];

    let events = track_info["tracking"]["providers"][0]["events"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| Event {
                    timestamp: text(&item["time_iso"]),
                    status: text(&item["status"]),
                    location: text(&item["location"]),
                    description: text(&item["description"]),
                })
                .collect()
        })
        .unwrap_or_default();

    let carrier = Some(text(&info["carrier"]))
        .filter(|c| !c.is_empty())
        .or_else(|| hint.map(|c| c.code().to_string()));

    Some(TrackingResult {
        carrier,
        provider: PROVIDER.to_string(),
        status: text_or(&track_info["status_description"], "Unknown"),
        events,
    })
}

pub struct SeventeenTrackFactory;

impl TrackingProviderFactory for SeventeenTrackFactory {
    fn create(&self, config: &TrackerConfig) -> Result<Box<dyn TrackingProvider>> {
        let key = config
            .providers
            .seventeen_track_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config("17TRACK_API_KEY not set"))?;
        Ok(Box::new(SeventeenTrackProvider::new(key)?))
    }
}
