// src/address.rs
//
// Turns a free-text address like "952A Greene Ave, Brooklyn, NY 11221" into
// the two key forms the upstream sources want: the BIS servlet takes a house
// number, street and borough code; the 311 feed filters on the uppercased
// street line, borough name and ZIP.

use std::fmt;

/// Borough name to BIS borough code, as the servlet expects it.
pub const BORO_CODES: [(&str, &str); 5] = [
    ("MANHATTAN", "1"),
    ("BRONX", "2"),
    ("BROOKLYN", "3"),
    ("QUEENS", "4"),
    ("STATEN ISLAND", "5"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BisKey {
    pub house_no: String,
    pub street: String,
    pub boro_code: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedKey {
    pub address: String,
    pub borough: String,
    pub zip: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    TooFewSegments(String),
    MissingStreet(String),
    UnknownBorough(String),
    MissingZip(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::TooFewSegments(addr) => {
                write!(f, "not enough comma-separated segments in '{addr}'")
            }
            ParseError::MissingStreet(addr) => write!(f, "missing house/street in '{addr}'"),
            ParseError::UnknownBorough(boro) => write!(f, "unknown borough '{boro}'"),
            ParseError::MissingZip(addr) => write!(f, "missing ZIP code in '{addr}'"),
        }
    }
}

impl std::error::Error for ParseError {}

pub fn boro_code(borough: &str) -> Option<&'static str> {
    BORO_CODES
        .iter()
        .find(|(name, _)| *name == borough)
        .map(|(_, code)| *code)
}

/// Storage key for an address: trimmed, single-spaced, uppercased.
/// Every `bis_status` row, assignment and change entry is keyed by this form.
pub fn normalize_key(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

pub fn parse_for_bis(address: &str) -> Result<BisKey, ParseError> {
    let parts: Vec<&str> = address.split(',').collect();
    if parts.len() < 2 {
        return Err(ParseError::TooFewSegments(address.to_string()));
    }

    let mut tokens = parts[0].trim().split_whitespace();
    let house_no = tokens
        .next()
        .ok_or_else(|| ParseError::MissingStreet(address.to_string()))?
        .to_string();
    let street = tokens.collect::<Vec<_>>().join(" ");
    if street.is_empty() {
        return Err(ParseError::MissingStreet(address.to_string()));
    }

    let borough = parts[1].trim().to_uppercase();
    let boro_code = boro_code(&borough).ok_or(ParseError::UnknownBorough(borough))?;

    Ok(BisKey {
        house_no,
        street,
        boro_code,
    })
}

pub fn parse_for_feed(address: &str) -> Result<FeedKey, ParseError> {
    let parts: Vec<&str> = address.split(',').collect();
    if parts.len() < 3 {
        return Err(ParseError::TooFewSegments(address.to_string()));
    }

    let house_street = parts[0].trim().to_uppercase();
    if house_street.is_empty() {
        return Err(ParseError::MissingStreet(address.to_string()));
    }

    let borough = parts[1].trim().to_uppercase();
    if boro_code(&borough).is_none() {
        return Err(ParseError::UnknownBorough(borough));
    }

    // ZIP is the last whitespace-delimited token of the "NY 11221" segment.
    let zip = parts[2]
        .trim()
        .split_whitespace()
        .last()
        .ok_or_else(|| ParseError::MissingZip(address.to_string()))?
        .to_string();

    Ok(FeedKey {
        address: house_street,
        borough,
        zip,
    })
}
