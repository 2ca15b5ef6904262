mod bis;
mod error;
mod feed;
mod models;

pub use bis::BisClient;
pub use error::ProviderError;
pub use feed::FeedClient;
pub use models::{BisSummary, ComplaintRecord};

use crate::address::{BisKey, FeedKey};

/// Summary-count lookup against the BIS property page. Scrape-backed, so
/// callers must expect rate limits and malformed pages.
pub trait BuildingStatusProvider {
    fn fetch_summary(&self, key: &BisKey) -> Result<BisSummary, ProviderError>;

    /// Pull the BIN off the same property page. `Ok(None)` when the page
    /// loads but carries no BIN.
    fn fetch_bin(&self, key: &BisKey) -> Result<Option<String>, ProviderError>;
}

/// 311 service-request lookup, newest first.
pub trait ComplaintFeedProvider {
    fn fetch_recent(&self, key: &FeedKey, limit: u32) -> Result<Vec<ComplaintRecord>, ProviderError>;
}
