// notify/dispatch.rs
use chrono::Local;
use std::collections::{HashMap, HashSet};
use tracing::{error, info, warn};

use crate::db::owners::Owner;
use crate::monitor::ChangeSet;
use crate::notify::payload::{build_run_embed, Embed, WebhookPayload};
use crate::notify::webhook::AlertSink;

pub struct DispatchContext<'a> {
    pub owners: &'a [Owner],
    pub addresses_by_owner: &'a HashMap<i64, HashSet<String>>,
    /// Normalized keys of every address attempted this run.
    pub checked: &'a [String],
    pub changes: &'a ChangeSet,
    pub failed: &'a [String],
    /// Manual single-owner runs notify only that owner.
    pub only_owner: Option<i64>,
    pub global_webhook: Option<&'a str>,
}

/// Group the run's changes by owner and send one payload per recipient.
/// Delivery is best-effort: one owner's failure never blocks another's
/// payload and never rolls back committed state.
pub fn dispatch_alerts(sink: &dyn AlertSink, ctx: &DispatchContext<'_>) {
    let now = Local::now();

    if ctx.owners.is_empty() {
        // Non-owner-partitioned mode: one payload covering the whole run.
        match ctx.global_webhook {
            Some(url) => {
                let status: Vec<_> = ctx.changes.status_changes.iter().collect();
                let complaints: Vec<_> = ctx.changes.complaint_alerts.iter().collect();
                let embed =
                    build_run_embed(None, ctx.checked.len(), &status, &complaints, ctx.failed, now);
                deliver(sink, url, "global", embed);
            }
            None => info!("no owners and no global webhook configured, skipping notifications"),
        }
        return;
    }

    for owner in ctx.owners {
        if let Some(only) = ctx.only_owner {
            if owner.id != only {
                continue;
            }
        }

        let Some(url) = owner.webhook_url.as_deref() else {
            warn!(owner = %owner.name, "no webhook configured for owner");
            continue;
        };

        let assigned = ctx.addresses_by_owner.get(&owner.id);
        let checked_count = ctx
            .checked
            .iter()
            .filter(|a| assigned.is_some_and(|set| set.contains(*a)))
            .count();
        let status = ctx.changes.status_for_owner(owner.id);
        let complaints = ctx.changes.complaints_for_owner(owner.id);

        let embed = build_run_embed(
            Some(&owner.name),
            checked_count,
            &status,
            &complaints,
            ctx.failed,
            now,
        );
        deliver(sink, url, &owner.name, embed);
    }
}

fn deliver(sink: &dyn AlertSink, url: &str, recipient: &str, embed: Embed) {
    let payload = WebhookPayload {
        embeds: vec![embed],
    };
    match sink.deliver(url, &payload) {
        Ok(()) => info!(recipient, "alert delivered"),
        Err(e) => error!(recipient, error = %e, "alert delivery failed"),
    }
}
