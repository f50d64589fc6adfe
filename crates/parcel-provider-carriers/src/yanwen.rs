//! Yanwen tracking page
//!
//! Yanwen has no JSON endpoint. The English lookup page is fetched and only
//! checked for the section headings it prints when a parcel exists, so the
//! result is a single placeholder event pointing at the page.

use async_trait::async_trait;
use parcel_core::{
    Carrier, Error, Event, Result, TrackerConfig, TrackingNumber, TrackingProvider,
    TrackingProviderFactory, TrackingResult,
};
use reqwest::Client;

use crate::http;

const PROVIDER: &str = "yanwen";
const DEFAULT_BASE_URL: &str = "http://www.yw56.com.cn";
const USER_AGENT: &str = "Mozilla/5.0";

const FOUND_MARKERS: [&str; 2] = ["Destination Country", "Origin Country"];

/// Yanwen tracking provider
pub struct YanwenProvider {
    client: Client,
    base_url: String,
}

impl YanwenProvider {
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
            "{}/english/select-e.asp?wen={}",
            self.base_url.trim_end_matches('/'),
            number
        )
    }
}

#[async_trait]
impl TrackingProvider for YanwenProvider {
    async fn track(
        &self,
        number: &TrackingNumber,
        _hint: Option<Carrier>,
    ) -> Result<Option<TrackingResult>> {
        let url = self.url(number);
        let Some(response) = http::get(&self.client, PROVIDER, &url).await? else {
            return Ok(None);
        };
        let page = response
            .text()
            .await
            .map_err(|e| Error::http(format!("yanwen: failed to read page: {}", e)))?;
        Ok(parse_page(&page, &url))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn carrier(&self) -> Option<Carrier> {
        Some(Carrier::Yanwen)
    }
}

/// Inspect the lookup page; `url` is echoed in the placeholder event
pub fn parse_page(page: &str, url: &str) -> Option<TrackingResult> {
    if !FOUND_MARKERS.iter().any(|marker| page.contains(marker)) {
        return None;
    }
    Some(TrackingResult {
        carrier: Some(Carrier::Yanwen.code().to_string()),
        provider: PROVIDER.to_string(),
        status: "Tracked (see yanwen website for details)".to_string(),
        events: vec![Event::new(
            "",
            "Parcel found",
            "",
            format!("Check {} for full details", url),
        )],
    })
}

pub struct YanwenFactory;

impl TrackingProviderFactory for YanwenFactory {
    fn create(&self, _config: &TrackerConfig) -> Result<Box<dyn TrackingProvider>> {
        Ok(Box::new(YanwenProvider::new()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_core::testing;

    const URL: &str = "http://www.yw56.com.cn/english/select-e.asp?wen=UG123456789YP";

    #[test]
    fn page_with_country_headings_is_found() {
        let page = "<table><tr><td>Origin Country</td><td>China</td></tr></table>";
        let result = parse_page(page, URL).unwrap();
        assert_eq!(result.status, "Tracked (see yanwen website for details)");
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].status, "Parcel found");
        assert_eq!(result.events[0].description, format!("Check {} for full details", URL));
    }

    #[test]
    fn page_without_headings_is_no_result() {
        assert!(parse_page("<p>No record found</p>", URL).is_none());
    }

    #[tokio::test]
    async fn fetches_english_lookup_page() {
        let server =
            testing::serve("200 OK", "<td>Destination Country</td><td>France</td>").await;
        let provider = YanwenProvider::with_base_url(server.base_url()).unwrap();
        let number = TrackingNumber::parse("UG123456789YP").unwrap();

        let result = provider.fetch(&number, None).await.unwrap();
        assert!(result.events[0].description.contains("/english/select-e.asp?wen=UG123456789YP"));
        assert!(server.requests()[0].to_lowercase().contains("user-agent: mozilla/5.0"));
    }
}
