//! Cainiao global tracking endpoint
//!
//! Covers Cainiao's own numbers and most AliExpress shipments, so it is used
//! both as a dedicated provider and in the universal chain. Checkpoint times
//! arrive as epoch milliseconds (sometimes seconds) and are rendered in UTC.

use async_trait::async_trait;
use chrono::DateTime;
use parcel_core::{
    Carrier, Event, Result, TrackerConfig, TrackingNumber, TrackingProvider,
    TrackingProviderFactory, TrackingResult,
};
use parcel_core::normalize::text;
use reqwest::Client;
use serde_json::Value;

use crate::http;

const PROVIDER: &str = "cainiao";
const DEFAULT_BASE_URL: &str = "https://global.cainiao.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.0";

// Anything above this is milliseconds.
const MILLIS_THRESHOLD: f64 = 1e12;

/// Cainiao tracking provider
pub struct CainiaoProvider {
    client: Client,
    base_url: String,
}

impl CainiaoProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http::build_client(PROVIDER, Some(USER_AGENT))?,
            base_url: base_url.into(),
        })
    }

    fn url(&self, number: &TrackingNumber) -> String {
        format!(
            "{}/global/detail.json?mailNos={}&lang=en-US",
            self.base_url.trim_end_matches('/'),
            number
        )
    }
}

#[async_trait]
impl TrackingProvider for CainiaoProvider {
    async fn track(
        &self,
        number: &TrackingNumber,
        _hint: Option<Carrier>,
    ) -> Result<Option<TrackingResult>> {
        match http::get_json(&self.client, PROVIDER, &self.url(number)).await? {
            Some(json) => Ok(parse_response(&json)),
            None => Ok(None),
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn carrier(&self) -> Option<Carrier> {
        Some(Carrier::Cainiao)
    }
}

/// Map a Cainiao answer to a tracking result
///
/// Only the first module is read; the query names a single parcel.
pub fn parse_response(json: &Value) -> Option<TrackingResult> {
    if json["success"].as_bool() != Some(true) {
        return None;
    }
    let module = json["module"].as_array()?.first()?;

    let events = module["detailList"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| Event {
                    timestamp: format_time(&item["time"]),
                    status: text(&item["status"]),
                    location: text(&item["place"]),
                    description: text(&item["desc"]),
                })
                .collect()
        })
        .unwrap_or_default();

    let status = Some(text(&module["statusDesc"]))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    Some(TrackingResult {
        carrier: Some(Carrier::Cainiao.code().to_string()),
        provider: PROVIDER.to_string(),
        status,
        events,
    })
}

fn format_time(value: &Value) -> String {
    let Some(raw) = value.as_f64() else {
        return text(value);
    };
    // Zero means the carrier has no time for the event
    if raw == 0.0 {
        return String::new();
    }
    let secs = if raw > MILLIS_THRESHOLD { raw / 1000.0 } else { raw };
    DateTime::from_timestamp(secs as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| text(value))
}

pub struct CainiaoFactory;

impl TrackingProviderFactory for CainiaoFactory {
    fn create(&self, _config: &TrackerConfig) -> Result<Box<dyn TrackingProvider>> {
        Ok(Box::new(CainiaoProvider::new()?))
    }
}
