use std::error::Error;
use std::fmt;

/// One failed provider attempt. Every variant counts against the retry
/// budget the same way; `RateLimited` exists so the logs can tell a 429
/// apart from an ordinary outage.
#[derive(Debug)]
pub enum ProviderError {
    Network(String),
    RateLimited(String),
    Http(u16),
    MalformedPage(String),
    Deserialize(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Network(msg) => write!(f, "Network error: {msg}"),
            ProviderError::RateLimited(msg) => write!(f, "Rate limited: {msg}"),
            ProviderError::Http(status) => write!(f, "HTTP error: status {status}"),
            ProviderError::MalformedPage(msg) => write!(f, "Malformed page: {msg}"),
            ProviderError::Deserialize(msg) => write!(f, "Deserialize error: {msg}"),
        }
    }
}

impl Error for ProviderError {}
