// src/config.rs
//
// Read-only run configuration. The file is owned by the control panel; the
// monitor only ever loads it once at run start.

use serde::Deserialize;
use std::fs;

use crate::errors::MonitorError;

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Addresses to watch. Kept as structured records so a cached BIN rides
    /// along with its address instead of being glued on with a delimiter.
    #[serde(default)]
    pub addresses: Vec<MonitoredAddress>,

    /// Fallback webhook used when no owners are configured in the store.
    pub webhook_url: Option<String>,

    /// Optional outbound proxy for the BIS scrape client.
    pub proxy: Option<String>,

    /// Hours of day (local time) the daemon runs at.
    #[serde(default = "default_schedule")]
    pub schedule: Vec<u32>,

    #[serde(default = "default_feed_limit")]
    pub feed_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoredAddress {
    pub address: String,
    pub bin: Option<String>,
}

impl MonitoredAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            bin: None,
        }
    }
}

fn default_db_path() -> String {
    "data/building_monitor.db".to_string()
}

fn default_schedule() -> Vec<u32> {
    vec![8, 12, 20]
}

fn default_feed_limit() -> u32 {
    20
}

pub fn load_config(path: &str) -> Result<MonitorConfig, MonitorError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| MonitorError::Config(format!("failed to read {path}: {e}")))?;
    let config: MonitorConfig =
        toml::from_str(&raw).map_err(|e| MonitorError::Config(format!("failed to parse {path}: {e}")))?;

    if let Some(bad) = config.schedule.iter().find(|h| **h >= 24) {
        return Err(MonitorError::Config(format!(
            "schedule hour {bad} is out of range (0-23)"
        )));
    }
    if config.schedule.is_empty() {
        return Err(MonitorError::Config("schedule has no hours".to_string()));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn write_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "monitor_config_{}.toml",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_full_config() {
        let path = write_config(
            r#"
db_path = "data/test.db"
webhook_url = "https://discord.com/api/webhooks/1/abc"
schedule = [6, 18]
feed_limit = 10

[[addresses]]
address = "952A Greene Ave, Brooklyn, NY 11221"
bin = "3039456"

[[addresses]]
address = "10 Main St, Brooklyn, NY 11201"
"#,
        );

        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.db_path, "data/test.db");
        assert_eq!(config.schedule, vec![6, 18]);
        assert_eq!(config.feed_limit, 10);
        assert_eq!(config.addresses.len(), 2);
        assert_eq!(config.addresses[0].bin.as_deref(), Some("3039456"));
        assert_eq!(config.addresses[1].bin, None);
    }

    #[test]
    fn defaults_apply_when_omitted() {
        let path = write_config("[[addresses]]\naddress = \"10 Main St, Brooklyn, NY 11201\"\n");
        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.db_path, "data/building_monitor.db");
        assert_eq!(config.schedule, vec![8, 12, 20]);
        assert_eq!(config.feed_limit, 20);
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn rejects_out_of_range_schedule_hour() {
        let path = write_config("schedule = [8, 24]\n");
        let err = load_config(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load_config("/nonexistent/monitor.toml").unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }
}
