use serde::{Deserialize, Serialize};

/// The three counts on the BIS property profile page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BisSummary {
    pub complaints: i64,
    pub violations_dob: i64,
    pub violations_ecb: i64,
}

// record
//  ├── incident_id       (the dedup key)
//  ├── incident_address / borough / incident_zip
//  ├── created_date / closed_date
//  ├── complaint_type / descriptor / agency / status
//  ├── resolution_description
//  └── location_type / latitude / longitude
//
// The feed sends numbers and timestamps as strings; they are stored as
// received. Only the incident id is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintRecord {
    pub incident_id: String,
    pub incident_address: Option<String>,
    pub borough: Option<String>,
    pub incident_zip: Option<String>,
    pub created_date: Option<String>,
    pub complaint_type: Option<String>,
    pub descriptor: Option<String>,
    pub agency: Option<String>,
    pub status: Option<String>,
    pub closed_date: Option<String>,
    pub resolution_description: Option<String>,
    pub location_type: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}
