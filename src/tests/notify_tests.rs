// src/tests/notify_tests.rs

use chrono::{Local, TimeZone};
use std::collections::{HashMap, HashSet};

use crate::db::owners::Owner;
use crate::monitor::{ChangeSet, ComplaintAlert, FieldDelta, StatusChange};
use crate::notify::{build_run_embed, dispatch_alerts, DispatchContext, EMBED_COLOR};
use crate::tests::utils::*;

fn local_noon() -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2025, 6, 2, 12, 5, 0).unwrap()
}

fn owner(id: i64, name: &str, webhook: Option<&str>) -> Owner {
    Owner {
        id,
        name: name.to_string(),
        webhook_url: webhook.map(String::from),
        email: None,
        phone: None,
        schedule: None,
    }
}

fn one_change() -> StatusChange {
    StatusChange {
        address: "10 MAIN ST, BROOKLYN, NY 11201".to_string(),
        deltas: vec![FieldDelta {
            field: "Violations-DOB",
            old: "2".to_string(),
            new: "3".to_string(),
        }],
        new_totals: summary(4, 3, 1),
        owner_ids: vec![1],
    }
}

#[test]
fn all_clear_embed_carries_reassuring_description() {
    let embed = build_run_embed(Some("Owner"), 3, &[], &[], &[], local_noon());

    assert!(embed.description.is_some());
    assert_eq!(embed.color, EMBED_COLOR);
    assert_eq!(embed.title, "Building Monitor Stats - 6/2 - 12:05 pm");

    let payload = serde_json::to_value(crate::notify::WebhookPayload {
        embeds: vec![embed],
    })
    .unwrap();
    assert_eq!(field_value(&payload, "Addresses Checked"), "3");
    assert_eq!(field_value(&payload, "BIS Changes"), "0");
    assert_eq!(field_value(&payload, "New 311 Complaints"), "0");
    assert_eq!(field_value(&payload, "Failed Addresses"), "0");
}

#[test]
fn change_details_render_old_new_and_totals() {
    let change = one_change();
    let embed = build_run_embed(Some("Owner"), 1, &[&change], &[], &[], local_noon());
    assert!(embed.description.is_none());

    let payload = serde_json::to_value(crate::notify::WebhookPayload {
        embeds: vec![embed],
    })
    .unwrap();
    let value = field_value(&payload, "BIS Change: 10 MAIN ST, BROOKLYN, NY 11201");
    assert!(value.contains("Violations-DOB: 2 → 3"));
    assert!(value.contains(
        "New Totals: Complaints=4, Violations-DOB=3, Violations-OATH/ECB=1"
    ));
}

#[test]
fn complaint_details_render_one_field_per_record() {
    let alert = ComplaintAlert {
        address: "10 MAIN ST, BROOKLYN, NY 11201".to_string(),
        last_date: Some("2025-06-01T09:30:00.000".to_string()),
        records: vec![complaint("ABC123"), complaint("DEF456")],
        owner_ids: vec![1],
    };
    let embed = build_run_embed(None, 1, &[], &[&alert], &[], local_noon());

    let payload = serde_json::to_value(crate::notify::WebhookPayload {
        embeds: vec![embed],
    })
    .unwrap();
    let names = field_names(&payload);
    assert_eq!(
        names
            .iter()
            .filter(|n| n.starts_with("311 Complaint: 10 MAIN ST"))
            .count(),
        2
    );
    // Global payloads carry no Owner field.
    assert!(!names.iter().any(|n| n == "Owner"));
}

#[test]
fn failed_addresses_are_listed() {
    let failed = vec!["30 BROAD ST, QUEENSBORO, NY 11375".to_string()];
    let embed = build_run_embed(Some("Owner"), 5, &[], &[], &failed, local_noon());
    assert!(embed.description.is_none());

    let payload = serde_json::to_value(crate::notify::WebhookPayload {
        embeds: vec![embed],
    })
    .unwrap();
    let listed = payload["embeds"][0]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|f| f["name"] == "Failed Addresses")
        .any(|f| f["value"] == "30 BROAD ST, QUEENSBORO, NY 11375");
    assert!(listed);
}

#[test]
fn dispatch_skips_owners_without_webhooks() {
    let owners = vec![
        owner(1, "Hooked", Some("https://hooks.example/1")),
        owner(2, "No Hook", None),
    ];
    let mut addresses_by_owner: HashMap<i64, HashSet<String>> = HashMap::new();
    addresses_by_owner.insert(1, HashSet::from(["A".to_string()]));
    addresses_by_owner.insert(2, HashSet::from(["A".to_string()]));

    let changes = ChangeSet::default();
    let checked = vec!["A".to_string()];
    let sink = RecordingSink::default();

    dispatch_alerts(
        &sink,
        &DispatchContext {
            owners: &owners,
            addresses_by_owner: &addresses_by_owner,
            checked: &checked,
            changes: &changes,
            failed: &[],
            only_owner: None,
            global_webhook: None,
        },
    );

    let sent = sink.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "https://hooks.example/1");
}

#[test]
fn single_owner_dispatch_filters_other_owners() {
    let owners = vec![
        owner(1, "Target", Some("https://hooks.example/1")),
        owner(2, "Other", Some("https://hooks.example/2")),
    ];
    let addresses_by_owner = HashMap::new();
    let changes = ChangeSet::default();
    let sink = RecordingSink::default();

    dispatch_alerts(
        &sink,
        &DispatchContext {
            owners: &owners,
            addresses_by_owner: &addresses_by_owner,
            checked: &[],
            changes: &changes,
            failed: &[],
            only_owner: Some(1),
            global_webhook: None,
        },
    );

    let sent = sink.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "https://hooks.example/1");
}

#[test]
fn empty_directory_falls_back_to_global_webhook() {
    let changes = ChangeSet {
        status_changes: vec![one_change()],
        complaint_alerts: vec![],
    };
    let checked = vec!["10 MAIN ST, BROOKLYN, NY 11201".to_string()];
    let sink = RecordingSink::default();

    dispatch_alerts(
        &sink,
        &DispatchContext {
            owners: &[],
            addresses_by_owner: &HashMap::new(),
            checked: &checked,
            changes: &changes,
            failed: &[],
            only_owner: None,
            global_webhook: Some("https://hooks.example/global"),
        },
    );

    let sent = sink.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "https://hooks.example/global");
    assert_eq!(field_value(&sent[0].1, "BIS Changes"), "1");
    let names = field_names(&sent[0].1);
    assert!(!names.iter().any(|n| n == "Owner"));
}

#[test]
fn owner_counts_are_scoped_to_assigned_addresses() {
    let owners = vec![owner(1, "Scoped", Some("https://hooks.example/1"))];
    let mut addresses_by_owner: HashMap<i64, HashSet<String>> = HashMap::new();
    addresses_by_owner.insert(1, HashSet::from(["A".to_string()]));

    let changes = ChangeSet::default();
    let checked = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    let sink = RecordingSink::default();

    dispatch_alerts(
        &sink,
        &DispatchContext {
            owners: &owners,
            addresses_by_owner: &addresses_by_owner,
            checked: &checked,
            changes: &changes,
            failed: &[],
            only_owner: None,
            global_webhook: None,
        },
    );

    let sent = sink.sent.borrow();
    assert_eq!(field_value(&sent[0].1, "Addresses Checked"), "1");
    assert_eq!(field_value(&sent[0].1, "Owner"), "Scoped");
}
