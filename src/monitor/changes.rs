// monitor/changes.rs
//
// The transient change set built over one reconciliation run and discarded
// after dispatch. Each entry carries the owner ids assigned to its address
// at run time; an entry with no owners is computed but never dispatched.

use crate::db::status::AddressStatus;
use crate::providers::{BisSummary, ComplaintRecord};

#[derive(Debug, Clone)]
pub struct FieldDelta {
    pub field: &'static str,
    pub old: String,
    pub new: String,
}

/// One address whose tracked fields moved since the stored baseline.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub address: String,
    pub deltas: Vec<FieldDelta>,
    pub new_totals: BisSummary,
    pub owner_ids: Vec<i64>,
}

/// One address with complaints not yet in the dedup ledger.
#[derive(Debug, Clone)]
pub struct ComplaintAlert {
    pub address: String,
    /// Newest created_date among the batch, for the alert headline.
    pub last_date: Option<String>,
    pub records: Vec<ComplaintRecord>,
    pub owner_ids: Vec<i64>,
}

#[derive(Debug, Default)]
pub struct ChangeSet {
    pub status_changes: Vec<StatusChange>,
    pub complaint_alerts: Vec<ComplaintAlert>,
}

impl ChangeSet {
    pub fn status_for_owner(&self, owner_id: i64) -> Vec<&StatusChange> {
        self.status_changes
            .iter()
            .filter(|c| c.owner_ids.contains(&owner_id))
            .collect()
    }

    pub fn complaints_for_owner(&self, owner_id: i64) -> Vec<&ComplaintAlert> {
        self.complaint_alerts
            .iter()
            .filter(|c| c.owner_ids.contains(&owner_id))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.status_changes.is_empty() && self.complaint_alerts.is_empty()
    }
}

/// Field-level diff of a fresh fetch against the stored baseline. Only the
/// two violation categories are tracked; a field changes only when the
/// numbers differ.
pub fn diff_status(old: &AddressStatus, new: &BisSummary) -> Vec<FieldDelta> {
    let mut deltas = Vec::new();

    if old.dob_violations != new.violations_dob {
        deltas.push(FieldDelta {
            field: "Violations-DOB",
            old: old.dob_violations.to_string(),
            new: new.violations_dob.to_string(),
        });
    }
    if old.ecb_violations != new.violations_ecb {
        deltas.push(FieldDelta {
            field: "Violations-OATH/ECB",
            old: old.ecb_violations.to_string(),
            new: new.violations_ecb.to_string(),
        });
    }

    deltas
}
