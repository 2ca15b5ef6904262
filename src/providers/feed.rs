// providers/feed.rs
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

use crate::address::FeedKey;
use crate::providers::{ComplaintFeedProvider, ComplaintRecord, ProviderError};

const FEED_URL: &str = "https://data.cityofnewyork.us/resource/erm2-nwe9.json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct FeedClient {
    client: Client,
    base_url: String,
}

impl FeedClient {
    pub fn new() -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: FEED_URL.to_string(),
        })
    }
}

impl ComplaintFeedProvider for FeedClient {
    fn fetch_recent(&self, key: &FeedKey, limit: u32) -> Result<Vec<ComplaintRecord>, ProviderError> {
        debug!(address = %key.address, borough = %key.borough, zip = %key.zip, "fetching 311 complaints");

        let where_clause = format!(
            "incident_address='{}' AND borough='{}' AND incident_zip='{}'",
            key.address, key.borough, key.zip
        );

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("$limit", limit.to_string().as_str()),
                ("$order", "created_date DESC"),
                ("$where", where_clause.as_str()),
            ])
            .send()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Http(status.as_u16()));
        }

        resp.json::<Vec<ComplaintRecord>>()
            .map_err(|e| ProviderError::Deserialize(e.to_string()))
    }
}
