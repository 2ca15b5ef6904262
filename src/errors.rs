// errors.rs
use std::fmt;

use crate::address::ParseError;
use crate::providers::ProviderError;

/// Errors surfaced by a monitor run. `Config` and `Store` are fatal for the
/// whole run; `Parse` and `Provider` are caught at the per-address boundary
/// and become "failed address" entries; `Delivery` is logged per owner and
/// never escalated.
#[derive(Debug)]
pub enum MonitorError {
    Config(String),
    Parse(ParseError),
    Provider(ProviderError),
    Store(String),
    Delivery(String),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Config(msg) => write!(f, "Config error: {msg}"),
            MonitorError::Parse(err) => write!(f, "Address parse error: {err}"),
            MonitorError::Provider(err) => write!(f, "Provider error: {err}"),
            MonitorError::Store(msg) => write!(f, "Store error: {msg}"),
            MonitorError::Delivery(msg) => write!(f, "Delivery error: {msg}"),
        }
    }
}

impl std::error::Error for MonitorError {}

impl From<ParseError> for MonitorError {
    fn from(err: ParseError) -> Self {
        MonitorError::Parse(err)
    }
}

impl From<ProviderError> for MonitorError {
    fn from(err: ProviderError) -> Self {
        MonitorError::Provider(err)
    }
}
