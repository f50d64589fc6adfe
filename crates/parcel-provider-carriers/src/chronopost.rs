//! Chronopost tracking endpoint

use async_trait::async_trait;
use parcel_core::{
    Carrier, Error, Event, Result, TrackerConfig, TrackingNumber, TrackingProvider,
    TrackingProviderFactory, TrackingResult,
};
use parcel_core::normalize::text;
use reqwest::Client;
use serde_json::Value;

use crate::http;

const PROVIDER: &str = "chronopost";
const DEFAULT_BASE_URL: &str = "https://www.chronopost.fr";

/// Chronopost tracking provider
pub struct ChronopostProvider {
    client: Client,
    base_url: String,
}

impl ChronopostProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http::build_client(PROVIDER, None)?,
            base_url: base_url.into(),
        })
    }

    fn url(&self, number: &TrackingNumber) -> String {
        format!(
            "{}/tracking-cxf/tracking-cxf/getTrack?number={}",
            self.base_url.trim_end_matches('/'),
            number
        )
    }
}

#[async_trait]
impl TrackingProvider for ChronopostProvider {
    async fn track(
        &self,
        number: &TrackingNumber,
        _hint: Option<Carrier>,
    ) -> Result<Option<TrackingResult>> {
        match http::get_json(&self.client, PROVIDER, &self.url(number)).await? {
            Some(json) => parse_response(&json),
            None => Ok(None),
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn carrier(&self) -> Option<Carrier> {
        Some(Carrier::Chronopost)
    }
}

/// Map a Chronopost answer to a tracking result
///
/// The checkpoint list sits under `list`; a body without it is an unknown parcel.
pub fn parse_response(json: &Value) -> Result<Option<TrackingResult>> {
    let events: Vec<Event> = match json.get("list") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                let label = text(&item["label"]);
                Event {
                    timestamp: text(&item["eventDate"]),
                    status: label.clone(),
                    location: text(&item["city"]),
                    description: label,
                }
            })
            .collect(),
        Some(other) => {
            return Err(Error::parse(format!(
                "chronopost: expected a list, got {}",
                other
            )));
        }
    };

    let status = events
        .first()
        .map(|e| e.status.clone())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(Some(TrackingResult {
        carrier: Some(Carrier::Chronopost.code().to_string()),
        provider: PROVIDER.to_string(),
        status,
        events,
    }))
}

pub struct ChronopostFactory;

impl TrackingProviderFactory for ChronopostFactory {
    fn create(&self, _config: &TrackerConfig) -> Result<Box<dyn TrackingProvider>> {
        Ok(Box::new(ChronopostProvider::new()?))
    }
}
