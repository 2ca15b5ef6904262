// notify/payload.rs
//
// Webhook payload shapes and the per-run embed builder. One embed per
// recipient per run, never one per change.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::monitor::{ComplaintAlert, StatusChange};

pub const EMBED_COLOR: u32 = 0x3498db;

const ALL_CLEAR: &str =
    "All addresses checked. No new complaints or violations. All properties are in good standing.";

#[derive(Debug, Serialize)]
pub struct WebhookPayload {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub timestamp: String,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

fn field(name: impl Into<String>, value: impl Into<String>, inline: bool) -> EmbedField {
    EmbedField {
        name: name.into(),
        value: value.into(),
        inline,
    }
}

pub fn build_run_embed(
    owner_name: Option<&str>,
    checked_count: usize,
    status_changes: &[&StatusChange],
    complaint_alerts: &[&ComplaintAlert],
    failed: &[String],
    now: DateTime<Local>,
) -> Embed {
    let title = format!(
        "Building Monitor Stats - {} - {}",
        now.format("%-m/%-d"),
        now.format("%-I:%M %P")
    );

    let mut fields = Vec::new();
    if let Some(name) = owner_name {
        fields.push(field("Owner", name, false));
    }
    fields.push(field("Addresses Checked", checked_count.to_string(), true));
    fields.push(field("BIS Changes", status_changes.len().to_string(), true));
    fields.push(field(
        "New 311 Complaints",
        complaint_alerts.len().to_string(),
        true,
    ));
    fields.push(field("Failed Addresses", failed.len().to_string(), true));

    for change in status_changes {
        let mut value = String::new();
        for delta in &change.deltas {
            value.push_str(&format!("{}: {} → {}\n", delta.field, delta.old, delta.new));
        }
        value.push_str(&format!(
            "New Totals: Complaints={}, Violations-DOB={}, Violations-OATH/ECB={}",
            change.new_totals.complaints,
            change.new_totals.violations_dob,
            change.new_totals.violations_ecb
        ));
        fields.push(field(format!("BIS Change: {}", change.address), value, false));
    }

    for alert in complaint_alerts {
        let last_date = alert.last_date.as_deref().unwrap_or("N/A");
        for record in &alert.records {
            let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
            let value = format!(
                "Date: {}\nType: {}\nDescriptor: {}\nAgency: {}\nStatus: {}\nClosed Date: {}\nResolution: {}\nIncident ID: {}",
                or_na(&record.created_date),
                or_na(&record.complaint_type),
                or_na(&record.descriptor),
                or_na(&record.agency),
                or_na(&record.status),
                or_na(&record.closed_date),
                or_na(&record.resolution_description),
                record.incident_id
            );
            fields.push(field(
                format!("311 Complaint: {} (Last: {last_date})", alert.address),
                value,
                false,
            ));
        }
    }

    if !failed.is_empty() {
        fields.push(field("Failed Addresses", failed.join("\n"), false));
    }

    let all_clear = status_changes.is_empty() && complaint_alerts.is_empty() && failed.is_empty();

    Embed {
        title,
        color: EMBED_COLOR,
        timestamp: now.to_rfc3339(),
        fields,
        footer: Some(EmbedFooter {
            text: format!("Generated on {}", now.format("%m/%d/%Y - %I:%M %p")),
        }),
        description: all_clear.then(|| ALL_CLEAR.to_string()),
    }
}
