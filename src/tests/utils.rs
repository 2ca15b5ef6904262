use std::cell::{Cell, RefCell};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::address::{BisKey, FeedKey};
use crate::config::{MonitorConfig, MonitoredAddress};
use crate::db::connection::Database;
use crate::db::migrations::init_store;
use crate::errors::MonitorError;
use crate::monitor::RetryPolicy;
use crate::notify::{AlertSink, WebhookPayload};
use crate::providers::{
    BisSummary, BuildingStatusProvider, ComplaintFeedProvider, ComplaintRecord, ProviderError,
};

/// Fresh test database built from the production migrations.
pub fn make_db() -> Database {
    let path = std::env::temp_dir().join(format!(
        "building_monitor_test_{}.sqlite",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let db = Database::new(path.to_string_lossy().to_string());
    init_store(&db).expect("failed to initialize test store");
    db
}

pub fn test_config(addresses: Vec<MonitoredAddress>) -> MonitorConfig {
    MonitorConfig {
        db_path: String::new(),
        addresses,
        webhook_url: None,
        proxy: None,
        schedule: vec![8, 12, 20],
        feed_limit: 20,
    }
}

/// Production retry shape with the sleeps zeroed out.
pub fn instant_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        attempt_delay: Duration::ZERO,
        batch_cooldown: Duration::ZERO,
        jitter: Duration::ZERO,
    }
}

pub fn summary(complaints: i64, dob: i64, ecb: i64) -> BisSummary {
    BisSummary {
        complaints,
        violations_dob: dob,
        violations_ecb: ecb,
    }
}

pub fn complaint(id: &str) -> ComplaintRecord {
    ComplaintRecord {
        incident_id: id.to_string(),
        incident_address: Some("10 MAIN ST".to_string()),
        borough: Some("BROOKLYN".to_string()),
        incident_zip: Some("11201".to_string()),
        created_date: Some("2025-06-01T09:30:00.000".to_string()),
        complaint_type: Some("Noise - Residential".to_string()),
        descriptor: Some("Loud Music/Party".to_string()),
        agency: Some("NYPD".to_string()),
        status: Some("Open".to_string()),
        closed_date: None,
        resolution_description: None,
        location_type: Some("Residential Building/House".to_string()),
        latitude: None,
        longitude: None,
    }
}

/// BIS provider stub: one canned summary for every address, or a hard
/// failure. Counts fetch_summary calls so retry budgets can be asserted.
pub struct FakeBis {
    default: Option<BisSummary>,
    fail_all: bool,
    pub bin: Option<String>,
    pub summary_calls: Cell<u32>,
}

impl FakeBis {
    pub fn returning(summary: BisSummary) -> Self {
        Self {
            default: Some(summary),
            fail_all: false,
            bin: None,
            summary_calls: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            default: None,
            fail_all: true,
            bin: None,
            summary_calls: Cell::new(0),
        }
    }
}

impl BuildingStatusProvider for FakeBis {
    fn fetch_summary(&self, _key: &BisKey) -> Result<BisSummary, ProviderError> {
        self.summary_calls.set(self.summary_calls.get() + 1);
        if self.fail_all {
            return Err(ProviderError::Network("bis offline".into()));
        }
        self.default
            .clone()
            .ok_or_else(|| ProviderError::MalformedPage("no scripted summary".into()))
    }

    fn fetch_bin(&self, _key: &BisKey) -> Result<Option<String>, ProviderError> {
        Ok(self.bin.clone())
    }
}

pub struct FakeFeed {
    records: Vec<ComplaintRecord>,
    fail: bool,
}

impl FakeFeed {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            fail: false,
        }
    }

    pub fn returning(records: Vec<ComplaintRecord>) -> Self {
        Self {
            records,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            records: Vec::new(),
            fail: true,
        }
    }
}

impl ComplaintFeedProvider for FakeFeed {
    fn fetch_recent(
        &self,
        _key: &FeedKey,
        _limit: u32,
    ) -> Result<Vec<ComplaintRecord>, ProviderError> {
        if self.fail {
            Err(ProviderError::Http(500))
        } else {
            Ok(self.records.clone())
        }
    }
}

/// Captures delivered payloads as JSON for assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: RefCell<Vec<(String, serde_json::Value)>>,
}

impl AlertSink for RecordingSink {
    fn deliver(&self, webhook_url: &str, payload: &WebhookPayload) -> Result<(), MonitorError> {
        let value = serde_json::to_value(payload).expect("payload serializes");
        self.sent.borrow_mut().push((webhook_url.to_string(), value));
        Ok(())
    }
}

/// A sink whose delivery always fails, for isolation tests.
pub struct FailingSink;

impl AlertSink for FailingSink {
    fn deliver(&self, _webhook_url: &str, _payload: &WebhookPayload) -> Result<(), MonitorError> {
        Err(MonitorError::Delivery("sink down".into()))
    }
}

pub fn field_names(payload: &serde_json::Value) -> Vec<String> {
    payload["embeds"][0]["fields"]
        .as_array()
        .expect("embed has fields")
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect()
}

pub fn field_value(payload: &serde_json::Value, name: &str) -> String {
    payload["embeds"][0]["fields"]
        .as_array()
        .expect("embed has fields")
        .iter()
        .find(|f| f["name"] == name)
        .unwrap_or_else(|| panic!("no field named {name}"))["value"]
        .as_str()
        .unwrap()
        .to_string()
}
