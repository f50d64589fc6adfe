//! La Poste / Colissimo unified tracking endpoint
//!
//! Public endpoint, no credential. The answer carries a `shipment` object
//! whose `event` array is already newest first.

use async_trait::async_trait;
use parcel_core::{
    Carrier, Error, Event, Result, TrackerConfig, TrackingNumber, TrackingProvider,
    TrackingProviderFactory, TrackingResult,
};
use parcel_core::normalize::text;
use reqwest::Client;
use serde_json::Value;

use crate::http;

const PROVIDER: &str = "colissimo";
const DEFAULT_BASE_URL: &str = "https://www.laposte.fr";

/// Colissimo tracking provider
pub struct ColissimoProvider {
    client: Client,
    base_url: String,
}

impl ColissimoProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the provider at another host (mirrors, tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http::build_client(PROVIDER, None)?,
            base_url: base_url.into(),
        })
    }

    fn url(&self, number: &TrackingNumber) -> String {
        format!(
            "{}/ssu/sun/suivi-unifie/{}?lang=fr_FR",
            self.base_url.trim_end_matches('/'),
            number
        )
    }
}

#[async_trait]
impl TrackingProvider for ColissimoProvider {
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
        Some(Carrier::Colissimo)
    }
}

/// Map a La Poste answer to a tracking result
pub fn parse_response(json: &Value) -> Result<Option<TrackingResult>> {
    let Some(shipment) = json.get("shipment") else {
        return Ok(None);
    };

    let events = match &shipment["event"] {
        Value::Array(items) => items.iter().map(parse_event).collect(),
        Value::Null => Vec::new(),
        other => {
            return Err(Error::parse(format!(
                "colissimo: expected an event array, got {}",
                other
            )));
        }
    };

    Ok(Some(TrackingResult {
        carrier: Some(Carrier::Colissimo.code().to_string()),
        provider: PROVIDER.to_string(),
        status: status_of(&events),
        events,
    }))
}

fn parse_event(item: &Value) -> Event {
    let label = text(&item["label"]);
    let location = format!("{}, {}", text(&item["siteName"]), text(&item["country"]));
    Event {
        timestamp: text(&item["date"]),
        status: label.clone(),
        location: location.trim_matches(|c| c == ',' || c == ' ').to_string(),
        description: label,
    }
}

fn status_of(events: &[Event]) -> String {
    events
        .first()
        .map(|e| e.status.clone())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Factory for the Colissimo provider
pub struct ColissimoFactory;

impl TrackingProviderFactory for ColissimoFactory {
    fn create(&self, _config: &TrackerConfig) -> Result<Box<dyn TrackingProvider>> {
        Ok(Box::new(ColissimoProvider::new()?))
    }
}
